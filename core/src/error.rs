//! Error types for the **evote** core crate.
//!
//! All high-level operations return [`crate::Result`], a convenient alias
//! for `core::result::Result<T, Error>`. The enum enumerates the taxonomy
//! the ledger, verifier and query engine can surface; lower-level failures
//! (signature library errors, serialization errors) are mapped into one of
//! these variants before bubbling up to callers.

use thiserror::Error;

/// Core crate error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or write required a genesis block that does not exist yet.
    #[error("chain is not initialized")]
    NotInitialized,

    /// `init()` called on a chain that already has a genesis block.
    #[error("chain already initialized")]
    AlreadyInitialized,

    /// Backend lookup miss. Recoverable by callers (e.g. "no such block").
    #[error("key not found")]
    KeyNotFound,

    /// The verifier rejected a transaction: bad multisig, bad ring
    /// signature, missing predecessor, duplicate election pubkey, or a
    /// double-consumed output.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// No transaction matches the requested id or election pubkey.
    #[error("transaction not found")]
    TransactionNotFound,

    /// Stored bytes could not be decoded into the expected type.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// ECDSA or ring-signature primitive failed below the verifier.
    #[error("crypto error: {0}")]
    CryptoError(String),

    /// KV backend I/O failure.
    #[error("storage error: {0}")]
    StorageError(String),
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<evote_store::Error> for Error {
    fn from(e: evote_store::Error) -> Self {
        match e {
            evote_store::Error::KeyNotFound => Error::KeyNotFound,
            evote_store::Error::Backend(msg) => Error::StorageError(msg),
        }
    }
}
