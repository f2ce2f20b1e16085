//! Wallet / identity half of the voting chain's external collaborators
//! (spec.md §2, §6.4): key-pair generation, ECIES envelope wrapping for
//! ballot secret messages, and a named-identity file store. Accessed only
//! from the CLI and test fixtures — the core ledger never touches wallet
//! storage (spec.md §5).

pub mod envelope;
pub mod error;
pub mod identity;
pub mod store;

pub use error::{Error, Result};
pub use identity::Identity;
pub use store::WalletStore;
