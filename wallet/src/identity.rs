//! A named identity's pair of key-pairs.
//!
//! Grounded in the original `WalletGroup{Main, View, Certificate}` shape
//! (`original_source/wallet/wallet.go`): every identity carries a *signing*
//! key-pair (its role in an administrative multisig or a ballot's anonymity
//! ring) and a *viewing* key-pair (used only to open ECIES envelopes
//! addressed to it — see [`crate::envelope`]). The original's `Certificate`
//! field, an X.509 wrapper over the signing key that nothing in the source
//! ever reads back, is dropped; see DESIGN.md.

use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::{CryptoRng, OsRng, RngCore};
use serde::{Deserialize, Serialize};

/// A signing key-pair plus a viewing key-pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub signing_key: SigningKey,
    pub viewing_key: SigningKey,
}

impl Identity {
    /// Generates a fresh identity using `rng`. Tests inject a seeded
    /// `rand_chacha::ChaCha8Rng` for reproducibility; production code uses
    /// [`Identity::generate_os`].
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::random(rng),
            viewing_key: SigningKey::random(rng),
        }
    }

    /// Generates a fresh identity from the system RNG.
    pub fn generate_os() -> Self {
        Self::generate(&mut OsRng)
    }

    /// Sec1-compressed signing public key: this identity's role in a
    /// multisig consensus group or a ballot's anonymity ring.
    pub fn signing_pubkey(&self) -> Vec<u8> {
        encode(&VerifyingKey::from(&self.signing_key))
    }

    /// Sec1-compressed viewing public key: administrators encrypt a
    /// ballot's secret message under this so only the holder of
    /// `viewing_key` recognises it later.
    pub fn viewing_pubkey(&self) -> Vec<u8> {
        encode(&VerifyingKey::from(&self.viewing_key))
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "signing={} viewing={}",
            hex::encode(self.signing_pubkey()),
            hex::encode(self.viewing_pubkey())
        )
    }
}

fn encode(key: &VerifyingKey) -> Vec<u8> {
    key.to_encoded_point(true).as_bytes().to_vec()
}
