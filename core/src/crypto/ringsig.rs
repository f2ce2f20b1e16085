//! 1-out-of-N ring signature over P-256.
//!
//! An Abe–Ohkubo–Suzuki-style construction: the signer proves knowledge of
//! the private key behind *one* member of a public key ring without
//! revealing which member, by closing a cycle of Fiat-Shamir challenges
//! around the ring. No existing crate implements this scheme over P-256, so
//! it is built directly on `p256`'s scalar/point arithmetic (the same
//! technique the botho-project-botho `crypto/ring-signature` crate uses for
//! its curve25519/CLSAG ring signature, adapted here to AOS/P-256 since the
//! chain's multisig already commits to that curve).
//!
//! Canonical encoding is `seed(32) || response_0(32) || ... ||
//! response_{n-1}(32)`, so `from_bytes(to_bytes(s)) == s` and the signature
//! round-trips through storage and the wire untouched.

use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::elliptic_curve::Field;
use p256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised while signing or decoding a ring signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingSigError {
    /// The ring has no members.
    #[error("ring is empty")]
    EmptyRing,

    /// The signing key's public key is not a member of the ring.
    #[error("signer is not a member of the ring")]
    SignerNotInRing,

    /// A ring member's public key bytes do not decode to a valid P-256
    /// point.
    #[error("invalid point encoding")]
    InvalidEncoding,
}

/// The public-key decoy set a ballot's ring signature is verified against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyRing {
    pub keys: Vec<Vec<u8>>,
}

impl PublicKeyRing {
    /// Creates an empty ring with room for `capacity` members.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Builds a ring directly from a sequence of sec1-encoded public keys
    /// (the shape ballot outputs carry on-chain).
    pub fn from_keys(keys: Vec<Vec<u8>>) -> Self {
        Self { keys }
    }

    /// Appends a member's public key to the ring.
    pub fn add(&mut self, pub_key: Vec<u8>) {
        self.keys.push(pub_key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn points(&self) -> Option<Vec<ProjectivePoint>> {
        self.keys.iter().map(|k| point_from_bytes(k)).collect()
    }
}

/// A ring signature: a closed cycle of Fiat-Shamir challenges proving that
/// *some* ring member authorised `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RingSignature {
    seed: [u8; 32],
    responses: Vec<[u8; 32]>,
}

impl RingSignature {
    /// Signs `message` under `ring` using `signing_key`, whose public key
    /// must be one of the ring's members. Fails with
    /// [`RingSigError::SignerNotInRing`] otherwise.
    pub fn sign(
        signing_key: &SigningKey,
        ring: &PublicKeyRing,
        message: &[u8],
    ) -> Result<Self, RingSigError> {
        let n = ring.len();
        if n == 0 {
            return Err(RingSigError::EmptyRing);
        }

        let signer_pub = VerifyingKey::from(signing_key)
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        let signer_index = ring
            .keys
            .iter()
            .position(|k| k == &signer_pub)
            .ok_or(RingSigError::SignerNotInRing)?;

        let points = ring.points().ok_or(RingSigError::InvalidEncoding)?;
        let x_s: Scalar = (*signing_key.as_nonzero_scalar()).into();

        let mut rng = OsRng;
        let mut e = vec![Scalar::ZERO; n];
        let mut s_vals = vec![Scalar::ZERO; n];

        let k = Scalar::random(&mut rng);
        let mut idx = (signer_index + 1) % n;
        e[idx] = hash_to_scalar(message, &point_bytes(&(ProjectivePoint::GENERATOR * k)));

        for _ in 0..(n - 1) {
            let s_i = Scalar::random(&mut rng);
            s_vals[idx] = s_i;
            let commit = ProjectivePoint::GENERATOR * s_i + points[idx] * e[idx];
            let next_idx = (idx + 1) % n;
            e[next_idx] = hash_to_scalar(message, &point_bytes(&commit));
            idx = next_idx;
        }

        // The walk above visits every index exactly once starting at
        // signer_index + 1 and ending back at signer_index, closing the
        // cycle; solve the signer's own response against the challenge
        // that closes onto it.
        s_vals[signer_index] = k - e[signer_index] * x_s;

        Ok(RingSignature {
            seed: scalar_to_bytes(&e[0]),
            responses: s_vals.iter().map(scalar_to_bytes).collect(),
        })
    }

    /// Verifies `signature` over `message` under `ring`. The check reveals
    /// only that *some* member's private key produced the signature, never
    /// which one.
    pub fn verify(ring: &PublicKeyRing, message: &[u8], signature: &RingSignature) -> bool {
        let n = ring.len();
        if n == 0 || signature.responses.len() != n {
            return false;
        }
        let points = match ring.points() {
            Some(p) => p,
            None => return false,
        };

        let e0 = bytes_to_scalar(&signature.seed);
        let mut e_cur = e0;
        for i in 0..n {
            let s_i = bytes_to_scalar(&signature.responses[i]);
            let commit = ProjectivePoint::GENERATOR * s_i + points[i] * e_cur;
            e_cur = hash_to_scalar(message, &point_bytes(&commit));
        }
        e_cur == e0
    }

    /// Canonical fixed-width byte encoding: `seed || response_0 || ...`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 * (1 + self.responses.len()));
        out.extend_from_slice(&self.seed);
        for r in &self.responses {
            out.extend_from_slice(r);
        }
        out
    }

    /// Decodes the byte form produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RingSigError> {
        if bytes.len() < 32 || (bytes.len() - 32) % 32 != 0 {
            return Err(RingSigError::InvalidEncoding);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[0..32]);
        let responses = bytes[32..]
            .chunks(32)
            .map(|c| {
                let mut r = [0u8; 32];
                r.copy_from_slice(c);
                r
            })
            .collect();
        Ok(RingSignature { seed, responses })
    }
}

fn point_from_bytes(bytes: &[u8]) -> Option<ProjectivePoint> {
    let encoded = EncodedPoint::from_bytes(bytes).ok()?;
    let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
    affine.map(ProjectivePoint::from)
}

fn point_bytes(p: &ProjectivePoint) -> Vec<u8> {
    p.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

fn hash_to_scalar(message: &[u8], point: &[u8]) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(message);
    hasher.update(point);
    let digest = hasher.finalize();
    let bytes: [u8; 32] = digest.into();
    Scalar::reduce_bytes(FieldBytes::from_slice(&bytes))
}

fn scalar_to_bytes(s: &Scalar) -> [u8; 32] {
    let fb = s.to_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&fb);
    out
}

fn bytes_to_scalar(b: &[u8; 32]) -> Scalar {
    Scalar::reduce_bytes(FieldBytes::from_slice(b))
}
