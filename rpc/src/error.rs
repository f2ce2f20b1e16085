//! Maps `evote_core::Error` onto the JSON-RPC error codes spec.md §6.2
//! names: `InvalidRequest` for caller mistakes the core already typed
//! (bad ids, rejected transactions, missing records), `InternalError` for
//! everything the caller could not have prevented (storage, serialization,
//! crypto-library failures below the verifier).

use evote_core::Error as CoreError;
use jsonrpsee::types::ErrorObjectOwned;

pub fn to_rpc_error(err: CoreError) -> ErrorObjectOwned {
    match err {
        CoreError::NotInitialized
        | CoreError::AlreadyInitialized
        | CoreError::KeyNotFound
        | CoreError::InvalidTransaction(_)
        | CoreError::TransactionNotFound => invalid_request(&err),
        CoreError::SerializationError(_) | CoreError::CryptoError(_) | CoreError::StorageError(_) => {
            internal_error(&err)
        }
    }
}

fn invalid_request(err: &CoreError) -> ErrorObjectOwned {
    tracing::debug!(error = %err, "rejecting rpc call as invalid request");
    ErrorObjectOwned::owned(jsonrpsee::types::ErrorCode::InvalidRequest.code(), err.to_string(), None::<()>)
}

fn internal_error(err: &CoreError) -> ErrorObjectOwned {
    tracing::error!(error = %err, "rpc call failed internally");
    ErrorObjectOwned::owned(jsonrpsee::types::ErrorCode::InternalError.code(), err.to_string(), None::<()>)
}

/// Parses a hex-encoded 32-byte transaction id, surfaced as an
/// `InvalidRequest` on malformed input rather than a panic.
pub fn parse_tx_id(hex_str: &str) -> Result<evote_core::TxId, ErrorObjectOwned> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| invalid_request(&CoreError::InvalidTransaction(format!("bad tx id hex: {e}"))))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| invalid_request(&CoreError::InvalidTransaction("tx id must be 32 bytes".into())))?;
    Ok(evote_core::TxId(arr))
}

/// Parses a hex-encoded election pubkey.
pub fn parse_pubkey(hex_str: &str) -> Result<Vec<u8>, ErrorObjectOwned> {
    hex::decode(hex_str)
        .map_err(|e| invalid_request(&CoreError::InvalidTransaction(format!("bad pubkey hex: {e}"))))
}
