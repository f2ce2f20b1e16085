//! The append-only unit of the chain: an ordered set of transactions plus
//! the header linking it to its predecessor.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::{sha256, sha256_concat, Hash};
use crate::crypto::merkle::merkle_root;
use crate::tx::Transaction;

pub const VERSION: i64 = 1;

/// A block. `hash` and `merkle_root` are computed at construction time and
/// never recomputed afterwards — a block is immutable once built.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub timestamp: i64,
    pub version: i64,
    pub height: u64,
    pub prev_hash: Vec<u8>,
    pub hash: Hash,
    pub merkle_root: Hash,
    pub tx_count: usize,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Builds the genesis block: height 1, empty `prev_hash`, a single
    /// [`Transaction::Genesis`].
    pub fn genesis(now: i64) -> Self {
        Self::new(now, vec![], 1, vec![Transaction::Genesis])
    }

    /// Builds the next block after `prev_hash` at `height`, hashing
    /// `transactions` into a Merkle root and computing the block hash.
    pub fn new(timestamp: i64, prev_hash: Vec<u8>, height: u64, transactions: Vec<Transaction>) -> Self {
        let leaves: Vec<Hash> = transactions
            .iter()
            .map(|tx| sha256(&bincode::serialize(tx).expect("transaction is always serializable")))
            .collect();
        let merkle_root = merkle_root(&leaves);
        let hash = sha256_concat(&merkle_root, &prev_hash);
        Self {
            timestamp,
            version: VERSION,
            height,
            prev_hash,
            hash,
            merkle_root,
            tx_count: transactions.len(),
            transactions,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }

    /// Recomputes hash and merkle root from `transactions`/`prev_hash` and
    /// compares against the stored values (I5).
    pub fn hash_is_valid(&self) -> bool {
        let leaves: Vec<Hash> = self
            .transactions
            .iter()
            .map(|tx| sha256(&bincode::serialize(tx).expect("transaction is always serializable")))
            .collect();
        let merkle_root = merkle_root(&leaves);
        let hash = sha256_concat(&merkle_root, &self.prev_hash);
        merkle_root == self.merkle_root && hash == self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_no_prev_hash_and_height_one() {
        let block = Block::genesis(0);
        assert!(block.is_genesis());
        assert_eq!(block.height, 1);
        assert_eq!(block.tx_count, 1);
        assert!(block.hash_is_valid());
    }

    #[test]
    fn hash_changes_when_prev_hash_changes() {
        let a = Block::new(0, vec![1, 2, 3], 2, vec![Transaction::Genesis]);
        let b = Block::new(0, vec![4, 5, 6], 2, vec![Transaction::Genesis]);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn serialize_round_trip_is_identity() {
        let block = Block::genesis(123);
        let encoded = bincode::serialize(&block).unwrap();
        let decoded: Block = bincode::deserialize(&encoded).unwrap();
        assert_eq!(block, decoded);
    }
}
