//! M-of-N ECDSA multisignature over P-256.
//!
//! A [`MultiSig`] is a parallel pair of public keys and signatures: pubkey
//! `i` authorises signature `i`. Order of insertion must be preserved by
//! callers since verification zips the two sequences positionally.
//!
//! The original source's verifier returned after checking only the first
//! pair — a bug, not an intended single-sig quorum (spec §9). This
//! implementation requires **every** pair to verify.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

/// A collection of (pubkey, signature) pairs over the same message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultiSig {
    pub pub_keys: Vec<Vec<u8>>,
    pub sigs: Vec<Vec<u8>>,
}

impl MultiSig {
    /// Creates an empty multisig container with room for `capacity` pairs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pub_keys: Vec::with_capacity(capacity),
            sigs: Vec::with_capacity(capacity),
        }
    }

    /// Builds a [`MultiSig`] from parallel signer/witness sequences already
    /// carried by a transaction (the common case: verification time, where
    /// signatures were produced elsewhere).
    pub fn from_parts(pub_keys: Vec<Vec<u8>>, sigs: Vec<Vec<u8>>) -> Self {
        Self { pub_keys, sigs }
    }

    /// Signs `data` with `signing_key` and appends `(pub_key, signature)`.
    pub fn add_signature(&mut self, data: &[u8], pub_key: &[u8], signing_key: &SigningKey) {
        let signature: Signature = signing_key.sign(data);
        self.sigs.push(signature.to_bytes().to_vec());
        self.pub_keys.push(pub_key.to_vec());
    }

    /// Verifies every `(pub_key, sig)` pair over `data`. Returns `true` only
    /// if the sequences are non-empty, equal in length, and every pair
    /// verifies — a malformed key or signature counts as a failed pair
    /// rather than a panic.
    pub fn verify(&self, data: &[u8]) -> bool {
        if self.pub_keys.is_empty() || self.pub_keys.len() != self.sigs.len() {
            return false;
        }
        for (pk_bytes, sig_bytes) in self.pub_keys.iter().zip(self.sigs.iter()) {
            let verified = VerifyingKey::from_sec1_bytes(pk_bytes)
                .ok()
                .zip(Signature::from_slice(sig_bytes).ok())
                .map(|(vk, sig)| vk.verify(data, &sig).is_ok())
                .unwrap_or(false);
            if !verified {
                tracing::debug!("multisig pair failed verification");
                return false;
            }
        }
        true
    }
}
