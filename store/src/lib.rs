//! Key-value persistence contract for the voting chain.
//!
//! [`Store`] is deliberately narrow: get/put/delete a byte key, an ordered
//! prefix scan, and close. The ledger and UTXO index are the only callers
//! that need anything beyond `get`/`put`; everything else (block layout,
//! UTXO key prefixing) lives in `evote-core`, which only ever sees this
//! trait object.

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

/// Store-level error type. Distinct from `evote_core::Error` so a backend
/// can be swapped without the core crate depending on it; callers map this
/// into `evote_core::Error::StorageError`/`KeyNotFound`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("key not found")]
    KeyNotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can persist and retrieve the chain's key-value state.
///
/// `seek` guarantees the `(key, value)` pair passed to `f` is valid only
/// until the next invocation of `f` — implementations may reuse buffers
/// across callbacks.
pub trait Store: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
    fn delete(&self, key: &[u8]) -> Result<()>;
    fn seek(&self, prefix: &[u8], f: &mut dyn FnMut(&[u8], &[u8]));
    fn close(&self) -> Result<()>;
}

/// Production backend: an on-disk `sled` LSM tree.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = sled::open(path).map_err(|e| Error::Backend(e.to_string()))?;
        Ok(Self { db })
    }
}

impl Store for SledStore {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.db
            .get(key)
            .map_err(|e| Error::Backend(e.to_string()))?
            .map(|v| v.to_vec())
            .ok_or(Error::KeyNotFound)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .insert(key, value)
            .map_err(|e| Error::Backend(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.db
            .remove(key)
            .map_err(|e| Error::Backend(e.to_string()))?;
        Ok(())
    }

    fn seek(&self, prefix: &[u8], f: &mut dyn FnMut(&[u8], &[u8])) {
        for item in self.db.scan_prefix(prefix) {
            match item {
                Ok((k, v)) => f(&k, &v),
                Err(e) => {
                    tracing::error!("sled scan_prefix error: {e}");
                    break;
                }
            }
        }
    }

    fn close(&self) -> Result<()> {
        self.db.flush().map_err(|e| Error::Backend(e.to_string()))?;
        Ok(())
    }
}

/// In-memory backend for tests: an ordered `BTreeMap` gives the same
/// lexicographic prefix-scan ordering `seek` requires without touching
/// disk.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.data
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
            .ok_or(Error::KeyNotFound)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.data.lock().expect("store mutex poisoned").remove(key);
        Ok(())
    }

    fn seek(&self, prefix: &[u8], f: &mut dyn FnMut(&[u8], &[u8])) {
        let data = self.data.lock().expect("store mutex poisoned");
        for (k, v) in data.range(prefix.to_vec()..) {
            if !k.starts_with(prefix) {
                break;
            }
            f(k, v);
        }
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = InMemoryStore::new();
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), b"v");
    }

    #[test]
    fn missing_key_is_key_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(store.get(b"missing"), Err(Error::KeyNotFound)));
    }

    #[test]
    fn seek_visits_only_matching_prefix_in_order() {
        let store = InMemoryStore::new();
        store.put(b"utxo-b", b"2").unwrap();
        store.put(b"utxo-a", b"1").unwrap();
        store.put(b"lh", b"tip").unwrap();

        let mut seen = Vec::new();
        store.seek(b"utxo-", &mut |k, v| {
            seen.push((k.to_vec(), v.to_vec()));
        });
        assert_eq!(
            seen,
            vec![
                (b"utxo-a".to_vec(), b"1".to_vec()),
                (b"utxo-b".to_vec(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn delete_removes_key() {
        let store = InMemoryStore::new();
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();
        assert!(matches!(store.get(b"k"), Err(Error::KeyNotFound)));
    }
}
