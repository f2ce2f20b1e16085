//! SHA-256 content hashing.

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest, used for transaction ids, block hashes and
/// Merkle nodes alike.
pub type Hash = [u8; 32];

/// Hashes arbitrary bytes with SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Hashes the concatenation of two digests, as used by internal Merkle
/// nodes and the block hash (`SHA256(merkle_root || prev_hash)`).
pub fn sha256_concat(a: &[u8], b: &[u8]) -> Hash {
    let mut buf = Vec::with_capacity(a.len() + b.len());
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    sha256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"hello"), sha256(b"hello"));
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn concat_differs_from_plain_concat_order() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        assert_ne!(sha256_concat(&a, &b), sha256_concat(&b, &a));
    }
}
