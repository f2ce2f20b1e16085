//! Error type for **evote-wallet**.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No identity is stored under the requested name.
    #[error("no wallet identity named {0:?}")]
    UnknownIdentity(String),

    /// A public key did not decode to a valid P-256 point.
    #[error("invalid public key encoding")]
    InvalidKey,

    /// An envelope was shorter than the fixed ephemeral-key + nonce header.
    #[error("malformed envelope")]
    Malformed,

    /// HKDF expand failed (wrong output length only — practically unreachable).
    #[error("key derivation failed")]
    Kdf,

    /// AES-GCM seal failed.
    #[error("envelope encryption failed")]
    Encryption,

    /// AES-GCM open failed: the envelope was not addressed to this viewing
    /// key, or it was tampered with. This is the expected outcome for every
    /// ticket on chain that isn't "yours" (§4.6's trial-decryption scan).
    #[error("envelope does not open under this viewing key")]
    Decryption,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
