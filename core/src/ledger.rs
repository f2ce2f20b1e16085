//! The append-only ledger: genesis, block assembly, chain linkage, replay.
//!
//! A [`Ledger`] owns no in-memory chain state beyond the tip pointer — every
//! read walks the KV store. Writes are serialized through an internal
//! mutex around the tip pointer, matching the single-writer model in the
//! spec's concurrency section.

use std::sync::{Arc, Mutex};

use evote_store::Store;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::tx::{Transaction, TxId, TxKind};
use crate::utxo;
use crate::verify;

const LAST_HASH_KEY: &[u8] = b"lh";

/// The append-only ledger.
pub struct Ledger {
    store: Arc<dyn Store>,
    last_hash: Mutex<Vec<u8>>,
    /// Serializes `add_block` callers (spec's single-writer model). Held
    /// across verification and commit, but never across the chain-scan
    /// reads in `verify_batch` — those only ever touch `last_hash` briefly,
    /// so a writer never re-enters its own lock.
    write_lock: Mutex<()>,
}

impl Ledger {
    /// Creates a genesis block and persists it. Fails with
    /// [`Error::AlreadyInitialized`] if the store already has a last-hash
    /// pointer.
    pub fn init(store: Arc<dyn Store>, now: i64) -> Result<Self> {
        if store.get(LAST_HASH_KEY).is_ok() {
            return Err(Error::AlreadyInitialized);
        }
        let genesis = Block::genesis(now);
        store.put(&genesis.hash, &bincode::serialize(&genesis)?)?;
        store.put(LAST_HASH_KEY, &genesis.hash)?;
        tracing::info!(height = genesis.height, "genesis block created");
        Ok(Self {
            store,
            last_hash: Mutex::new(genesis.hash.to_vec()),
            write_lock: Mutex::new(()),
        })
    }

    /// Reopens a ledger that was previously [`Ledger::init`]ed. Fails with
    /// [`Error::NotInitialized`] if no last-hash pointer exists.
    pub fn re_init(store: Arc<dyn Store>) -> Result<Self> {
        let last_hash = store.get(LAST_HASH_KEY).map_err(|_| Error::NotInitialized)?;
        Ok(Self {
            store,
            last_hash: Mutex::new(last_hash),
            write_lock: Mutex::new(()),
        })
    }

    /// Verifies, appends and persists `transactions` as a new block, then
    /// triggers a UTXO index recompute. The whole batch is rejected if any
    /// transaction fails verification.
    pub fn add_block(&self, transactions: Vec<Transaction>, now: i64) -> Result<Block> {
        let _write_guard = self.write_lock.lock().expect("ledger write lock poisoned");

        self.verify_batch(&transactions)?;

        let last_hash = self.last_hash.lock().expect("ledger mutex poisoned").clone();
        let prev_block = self.get_block(&last_hash)?;
        let block = Block::new(now, last_hash, prev_block.height + 1, transactions);

        self.store.put(&block.hash, &bincode::serialize(&block)?)?;
        self.store.put(LAST_HASH_KEY, &block.hash)?;
        *self.last_hash.lock().expect("ledger mutex poisoned") = block.hash.to_vec();

        utxo::compute(self.store.as_ref(), self)?;
        tracing::info!(height = block.height, tx_count = block.tx_count, "block appended");
        Ok(block)
    }

    /// Checks every transaction in `transactions` against the verifier and
    /// the ledger-level uniqueness rules (I4: one ELECTION output per
    /// `election_pubkey`; an INPUT may not consume an already-consumed
    /// OUTPUT). Never holds `last_hash`'s lock while scanning the chain —
    /// `find_transaction`/`election_output_exists`/`output_already_consumed`
    /// all go through `iterator()`, which locks `last_hash` itself.
    fn verify_batch(&self, transactions: &[Transaction]) -> Result<()> {
        for tx in transactions {
            let predecessor = match tx.tx_out() {
                Some(tx_out) => Some(self.find_transaction(tx_out).map_err(|_| {
                    Error::InvalidTransaction(format!("missing predecessor transaction {tx_out}"))
                })?),
                None => None,
            };
            verify::verify_transaction(tx, predecessor.as_ref())?;

            if tx.is_output() && tx.kind() == Some(TxKind::Election) {
                if let Some(pubkey) = tx.election_pubkey() {
                    if self.election_output_exists(pubkey, transactions)? {
                        return Err(Error::InvalidTransaction(format!(
                            "election_pubkey {} already has an election output",
                            hex::encode(pubkey)
                        )));
                    }
                }
            }

            if tx.is_input() {
                if let Some(tx_out) = tx.tx_out() {
                    if self.output_already_consumed(tx_out, transactions)? {
                        return Err(Error::InvalidTransaction(format!(
                            "output {tx_out} is already consumed"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn election_output_exists(&self, pubkey: &[u8], batch: &[Transaction]) -> Result<bool> {
        let duplicate_in_batch = batch.iter().any(|tx| {
            tx.is_output() && tx.kind() == Some(TxKind::Election) && tx.election_pubkey() == Some(pubkey)
        });
        if duplicate_in_batch {
            return Ok(true);
        }
        for tx in self.get_transactions()? {
            if tx.is_output() && tx.kind() == Some(TxKind::Election) && tx.election_pubkey() == Some(pubkey) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn output_already_consumed(&self, output_id: TxId, batch: &[Transaction]) -> Result<bool> {
        let duplicate_in_batch = batch.iter().any(|tx| tx.is_input() && tx.tx_out() == Some(output_id));
        if duplicate_in_batch {
            return Ok(true);
        }
        for tx in self.get_transactions()? {
            if tx.is_input() && tx.tx_out() == Some(output_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn get_block(&self, hash: &[u8]) -> Result<Block> {
        let bytes = self.store.get(hash)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Walks backwards from the tip to find the block at `height`.
    pub fn get_block_by_height(&self, height: u64) -> Result<Block> {
        for block in self.iterator() {
            let block = block?;
            if block.height == height {
                return Ok(block);
            }
        }
        Err(Error::TransactionNotFound)
    }

    /// Collects block hashes from genesis up to and including `up_to_height`.
    pub fn get_block_hashes(&self, up_to_height: u64) -> Result<Vec<Hash32>> {
        let mut hashes = Vec::new();
        for block in self.iterator() {
            let block = block?;
            if block.height > up_to_height {
                continue;
            }
            hashes.push(block.hash);
            if block.height == 1 {
                break;
            }
        }
        hashes.reverse();
        Ok(hashes)
    }

    pub fn best_height(&self) -> Result<u64> {
        let last_hash = self.last_hash.lock().expect("ledger mutex poisoned");
        Ok(self.get_block(&last_hash)?.height)
    }

    /// Iterates blocks from the tip backwards to genesis.
    pub fn iterator(&self) -> LedgerIterator<'_> {
        let last_hash = self.last_hash.lock().expect("ledger mutex poisoned").clone();
        LedgerIterator {
            ledger: self,
            current_hash: Some(last_hash),
        }
    }

    /// Full chain scan for the transaction with the given id.
    pub fn find_transaction(&self, id: TxId) -> Result<Transaction> {
        for block in self.iterator() {
            let block = block?;
            for tx in &block.transactions {
                if tx.id() == id {
                    return Ok(tx.clone());
                }
            }
        }
        Err(Error::TransactionNotFound)
    }

    /// Collects every transaction in the chain, tip to genesis.
    pub fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let mut txs = Vec::new();
        for block in self.iterator() {
            txs.extend(block?.transactions);
        }
        Ok(txs)
    }

    /// Like [`Self::iterator`], but validates each block's hash/Merkle
    /// linkage (I5) as it walks, surfacing the first broken link as an
    /// error instead of silently yielding a corrupt block. Feeds the CLI's
    /// `print` command, mirroring the original source's inline
    /// `IsBlockValid` check during printing.
    pub fn iter_display(&self) -> impl Iterator<Item = Result<Block>> + '_ {
        self.iterator().map(|block| {
            let block = block?;
            if !block.hash_is_valid() {
                return Err(Error::SerializationError(format!(
                    "block at height {} fails hash/merkle linkage",
                    block.height
                )));
            }
            Ok(block)
        })
    }
}

type Hash32 = [u8; 32];

/// Iterates [`Block`]s from the chain tip back to genesis.
pub struct LedgerIterator<'a> {
    ledger: &'a Ledger,
    current_hash: Option<Vec<u8>>,
}

impl<'a> Iterator for LedgerIterator<'a> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current_hash.take()?;
        match self.ledger.get_block(&hash) {
            Ok(block) => {
                if !block.is_genesis() {
                    self.current_hash = Some(block.prev_hash.clone());
                }
                Some(Ok(block))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::ElectionOutput;
    use evote_store::InMemoryStore;
    use p256::ecdsa::{SigningKey, VerifyingKey};
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn keypair(seed: u64) -> (SigningKey, Vec<u8>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sk = SigningKey::random(&mut rng);
        let pk = VerifyingKey::from(&sk)
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        (sk, pk)
    }

    fn election_tx(pubkey: &[u8], seed: u64) -> Transaction {
        let (sk, pk) = keypair(seed);
        let mut out = ElectionOutput {
            election_pubkey: pubkey.to_vec(),
            title: "Pres".into(),
            description: "President".into(),
            total_people: 10,
            candidates: vec![vec![1], vec![2]],
            signers: vec![],
            sig_witnesses: vec![],
        };
        let mut ms = crate::crypto::MultiSig::default();
        ms.add_signature(&out.canonical_bytes(), &pk, &sk);
        out.signers = ms.pub_keys;
        out.sig_witnesses = ms.sigs;
        Transaction::new_election_output(out)
    }

    #[test]
    fn init_creates_genesis_at_height_one() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let ledger = Ledger::init(store, 0).unwrap();
        assert_eq!(ledger.best_height().unwrap(), 1);
    }

    #[test]
    fn init_twice_fails_already_initialized() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        Ledger::init(store.clone(), 0).unwrap();
        let err = Ledger::init(store, 0).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized));
    }

    #[test]
    fn add_block_appends_and_advances_height() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let ledger = Ledger::init(store, 0).unwrap();
        let tx = election_tx(b"e1", 1);
        let block = ledger.add_block(vec![tx], 1).unwrap();
        assert_eq!(block.height, 2);
        assert_eq!(ledger.best_height().unwrap(), 2);
    }

    #[test]
    fn duplicate_election_pubkey_is_rejected() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let ledger = Ledger::init(store, 0).unwrap();
        ledger.add_block(vec![election_tx(b"e1", 1)], 1).unwrap();
        let err = ledger.add_block(vec![election_tx(b"e1", 2)], 2).unwrap_err();
        assert!(matches!(err, Error::InvalidTransaction(_)));
        assert_eq!(ledger.best_height().unwrap(), 2);
    }
}
