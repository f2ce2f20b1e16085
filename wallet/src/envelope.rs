//! ECIES wrapping of a ballot's secret nonce under a voter's viewing public
//! key (spec.md §4.1 notes, §4.6 step 1/3).
//!
//! An ephemeral P-256 key is Diffie-Hellman'd against the recipient's
//! viewing key; the shared secret is stretched through HKDF-SHA256 into an
//! AES-256-GCM key. Layout: `ephemeral_pubkey(33, sec1 compressed) ||
//! nonce(12) || ciphertext`. A voter scanning for their ticket calls
//! [`open`] against every unclaimed ballot output's `secret_message` with
//! their own viewing key; only the one addressed to them succeeds.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use p256::ecdh::{diffie_hellman, SharedSecret};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::{CryptoRng, OsRng, RngCore};
use sha2::Sha256;

use crate::error::{Error, Result};

const EPHEMERAL_KEY_LEN: usize = 33;
const NONCE_LEN: usize = 12;
const HKDF_INFO: &[u8] = b"evote-ballot-envelope";

/// Encrypts `plaintext` under `recipient_viewing_pubkey` (sec1-encoded)
/// using the system RNG.
pub fn seal(recipient_viewing_pubkey: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    seal_with_rng(recipient_viewing_pubkey, plaintext, &mut OsRng)
}

/// As [`seal`], with an injectable RNG for deterministic tests.
pub fn seal_with_rng<R: RngCore + CryptoRng>(
    recipient_viewing_pubkey: &[u8],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    let recipient = VerifyingKey::from_sec1_bytes(recipient_viewing_pubkey).map_err(|_| Error::InvalidKey)?;
    let ephemeral = SigningKey::random(rng);
    let ephemeral_pub = VerifyingKey::from(&ephemeral);

    let shared = diffie_hellman(ephemeral.as_nonzero_scalar(), recipient.as_affine());
    let key = derive_key(&shared)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| Error::Kdf)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| Error::Encryption)?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(ephemeral_pub.to_encoded_point(true).as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Attempts to decrypt `envelope` with `viewing_key`. Returns
/// [`Error::Decryption`] when `envelope` was not addressed to this key —
/// the expected outcome for every ticket that isn't the caller's own.
pub fn open(viewing_key: &SigningKey, envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < EPHEMERAL_KEY_LEN + NONCE_LEN {
        return Err(Error::Malformed);
    }
    let (ephemeral_pub_bytes, rest) = envelope.split_at(EPHEMERAL_KEY_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let ephemeral_pub = VerifyingKey::from_sec1_bytes(ephemeral_pub_bytes).map_err(|_| Error::InvalidKey)?;
    let shared = diffie_hellman(viewing_key.as_nonzero_scalar(), ephemeral_pub.as_affine());
    let key = derive_key(&shared)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| Error::Kdf)?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| Error::Decryption)
}

fn derive_key(shared: &SharedSecret) -> Result<[u8; 32]> {
    let hkdf: Hkdf<Sha256> = shared.extract(None);
    let mut key = [0u8; 32];
    hkdf.expand(HKDF_INFO, &mut key).map_err(|_| Error::Kdf)?;
    Ok(key)
}
