//! Named-identity table persisted to a single file.
//!
//! Mirrors the original's `gob`-encoded `storage/wallets/wallets.data`
//! (`original_source/wallet/wallets.go`): one file, one `HashMap<String,
//! Identity>`, loaded wholesale and rewritten wholesale on every save.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::Identity;

/// The on-disk named-identity table.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WalletStore {
    identities: HashMap<String, Identity>,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` if it exists; a missing file is an empty store, matching
    /// the original's `InitializeWallets` (absence is not an error, it is
    /// "nobody has created a wallet yet").
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Rewrites `path` with the current table, creating parent directories
    /// as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    /// Generates a fresh identity and stores it under `user_id`, replacing
    /// any existing identity with that name.
    pub fn add(&mut self, user_id: impl Into<String>) -> &Identity {
        let user_id = user_id.into();
        self.identities.insert(user_id.clone(), Identity::generate_os());
        tracing::info!(user_id = %user_id, "wallet identity created");
        self.identities.get(&user_id).expect("just inserted")
    }

    pub fn get(&self, user_id: &str) -> Result<&Identity> {
        self.identities
            .get(user_id)
            .ok_or_else(|| Error::UnknownIdentity(user_id.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.identities.keys().map(String::as_str)
    }
}
