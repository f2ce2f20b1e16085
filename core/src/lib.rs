//! Core transaction protocol and ledger engine for an electronic-voting
//! blockchain: a typed transaction model, a verifier binding each
//! transaction to its predecessor and signers, an append-only
//! Merkle-hashed ledger with a derived UTXO index, and a tally query
//! engine. The CLI, RPC transport, KV persistence backend and wallet file
//! encoding are external collaborators built on top of this crate.

pub mod block;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod query;
pub mod tx;
pub mod utxo;
pub mod verify;

pub use block::Block;
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use tx::{Transaction, TxId, TxKind};
