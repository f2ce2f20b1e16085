//! Cryptographic primitives backing the voting chain.
//!
//! * [`hash`] – SHA-256 content hashing, shared by transaction ids, block
//!   hashes and the Merkle tree.
//! * [`merkle`] – the block Merkle tree.
//! * [`multisig`] – M-of-N ECDSA multisignature for administrative actions.
//! * [`ringsig`] – the 1-of-N ring signature used to anonymise ballot casts.

pub mod hash;
pub mod merkle;
pub mod multisig;
pub mod ringsig;

pub use hash::Hash;
pub use multisig::MultiSig;
pub use ringsig::{PublicKeyRing, RingSignature};
