//! On-disk layout (spec.md §6.4): a `storage/blocks_<network>/` directory
//! owned by the sled backend, and a single `storage/wallets/wallets.data`
//! file shared across every network.

use std::path::PathBuf;

pub fn storage_root() -> PathBuf {
    PathBuf::from("storage")
}

pub fn blocks_dir(network: &str) -> PathBuf {
    storage_root().join(format!("blocks_{network}"))
}

pub fn wallets_file() -> PathBuf {
    storage_root().join("wallets").join("wallets.data")
}
