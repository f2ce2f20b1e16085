//! Derived index of outputs not yet consumed by a matching input.
//!
//! Rebuilt wholesale on every block append (§9: acceptable at the scale
//! this spec targets — a single election's worth of ballots). Entries are
//! grouped per `tx_id` the way the original source grouped them, even
//! though in this model each transaction carries at most one output.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use evote_store::Store;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::tx::{Transaction, TxId, TxKind};

const UTXO_PREFIX: &[u8] = b"utxo-";
const DELETE_BATCH_SIZE: usize = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UtxoEntry {
    outputs: Vec<Transaction>,
}

fn utxo_key(id: TxId) -> Vec<u8> {
    let mut key = UTXO_PREFIX.to_vec();
    key.extend_from_slice(&id.0);
    key
}

/// Rebuilds the `"utxo-"` index: deletes every existing entry, walks the
/// chain tip-to-genesis accumulating unconsumed outputs, then persists the
/// survivors.
pub fn compute(store: &dyn Store, ledger: &Ledger) -> Result<()> {
    delete_by_prefix(store, UTXO_PREFIX);

    let mut unconsumed: HashMap<TxId, Transaction> = HashMap::new();
    let mut consumed: HashSet<TxId> = HashSet::new();

    for block in ledger.iterator() {
        let block = block?;
        for tx in &block.transactions {
            if tx.is_output() {
                if !consumed.contains(&tx.id()) {
                    unconsumed.insert(tx.id(), tx.clone());
                }
            } else if tx.is_input() {
                if let Some(tx_out) = tx.tx_out() {
                    consumed.insert(tx_out);
                    unconsumed.remove(&tx_out);
                }
            }
        }
    }

    for (id, tx) in unconsumed {
        let entry = UtxoEntry { outputs: vec![tx] };
        store.put(&utxo_key(id), &bincode::serialize(&entry)?)?;
    }
    tracing::debug!("utxo index recomputed");
    Ok(())
}

fn delete_by_prefix(store: &dyn Store, prefix: &[u8]) {
    let mut keys = Vec::new();
    store.seek(prefix, &mut |k, _v| keys.push(k.to_vec()));
    for chunk in keys.chunks(DELETE_BATCH_SIZE) {
        for key in chunk {
            let _ = store.delete(key);
        }
    }
}

/// Scans the UTXO index for unconsumed outputs of kind `kind` scoped to
/// `election_pubkey`.
pub fn find_unused_outputs(store: &dyn Store, kind: TxKind, election_pubkey: &[u8]) -> Vec<Transaction> {
    let mut found = Vec::new();
    store.seek(UTXO_PREFIX, &mut |_k, v| {
        let Ok(entry) = bincode::deserialize::<UtxoEntry>(v) else {
            return;
        };
        for tx in entry.outputs {
            if tx.kind() == Some(kind) && tx.election_pubkey() == Some(election_pubkey) {
                found.push(tx);
            }
        }
    });
    found
}
