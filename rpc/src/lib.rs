//! JSON-RPC marshalling shim over `evote_core` (spec.md §6.2). Every method
//! deserializes its hex/JSON params, calls the matching core operation, and
//! either returns its typed result or maps a core [`evote_core::Error`]
//! into a JSON-RPC error object. No method carries business logic of its
//! own beyond that translation — transactions arrive already built and
//! signed by a caller holding the relevant wallet identities.

mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use evote_core::tx::{Transaction, TxKind};
use evote_core::{Block, Ledger};
use evote_store::Store;
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use serde::{Deserialize, Serialize};

use crate::error::{parse_pubkey, parse_tx_id, to_rpc_error};

/// A `(candidate_pubkey_hex, count)` tally row, the RPC-friendly shape of
/// `query_results`'s map (JSON object keys must be strings; this is
/// equivalent and easier for non-Rust clients to consume as a list).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TallyRow {
    pub candidate: String,
    pub count: u64,
}

#[rpc(server)]
pub trait EvoteApi {
    #[method(name = "QueryBlockchain")]
    fn query_blockchain(&self) -> RpcResult<Vec<Block>>;

    #[method(name = "QueryTransactions")]
    fn query_transactions(&self) -> RpcResult<Vec<Transaction>>;

    #[method(name = "QueryTransactionsByPubkey")]
    fn query_transactions_by_pubkey(&self, election_pubkey_hex: String) -> RpcResult<Vec<Transaction>>;

    #[method(name = "GetTransaction")]
    fn get_transaction(&self, tx_id_hex: String) -> RpcResult<Transaction>;

    #[method(name = "FindTxWithTxOutput")]
    fn find_tx_with_tx_output(&self, kind: TxKind, election_pubkey_hex: String) -> RpcResult<Option<Transaction>>;

    #[method(name = "QueryUnUsedBallotTxs")]
    fn query_unused_ballot_txs(&self, election_pubkey_hex: String) -> RpcResult<Vec<Transaction>>;

    #[method(name = "QueryResults")]
    fn query_results(&self, election_pubkey_hex: String) -> RpcResult<Vec<TallyRow>>;

    #[method(name = "StartElection")]
    fn start_election(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "StopElection")]
    fn stop_election(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "StartAccreditation")]
    fn start_accreditation(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "StopAccreditation")]
    fn stop_accreditation(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "StartVoting")]
    fn start_voting(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "StopVoting")]
    fn stop_voting(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "CreateBallot")]
    fn create_ballot(&self, tx: Transaction) -> RpcResult<Block>;

    #[method(name = "CastBallot")]
    fn cast_ballot(&self, tx: Transaction) -> RpcResult<Block>;
}

/// Shared state behind every RPC handler: the ledger (for chain reads and
/// `add_block`) and the raw store (for UTXO-index scans that query engine
/// functions take a `&dyn Store` for).
pub struct EvoteRpcServer {
    ledger: Arc<Ledger>,
    store: Arc<dyn Store>,
}

impl EvoteRpcServer {
    pub fn new(ledger: Arc<Ledger>, store: Arc<dyn Store>) -> Self {
        Self { ledger, store }
    }

    fn append(&self, tx: Transaction) -> RpcResult<Block> {
        let now = now_unix();
        self.ledger.add_block(vec![tx], now).map_err(to_rpc_error)
    }
}

impl EvoteApiServer for EvoteRpcServer {
    fn query_blockchain(&self) -> RpcResult<Vec<Block>> {
        self.ledger.iterator().collect::<Result<Vec<_>, _>>().map_err(to_rpc_error)
    }

    fn query_transactions(&self) -> RpcResult<Vec<Transaction>> {
        self.ledger.get_transactions().map_err(to_rpc_error)
    }

    fn query_transactions_by_pubkey(&self, election_pubkey_hex: String) -> RpcResult<Vec<Transaction>> {
        let pubkey = parse_pubkey(&election_pubkey_hex)?;
        let txs = self
            .ledger
            .get_transactions()
            .map_err(to_rpc_error)?
            .into_iter()
            .filter(|tx| tx.election_pubkey() == Some(pubkey.as_slice()))
            .collect();
        Ok(txs)
    }

    fn get_transaction(&self, tx_id_hex: String) -> RpcResult<Transaction> {
        let id = parse_tx_id(&tx_id_hex)?;
        self.ledger.find_transaction(id).map_err(to_rpc_error)
    }

    fn find_tx_with_tx_output(&self, kind: TxKind, election_pubkey_hex: String) -> RpcResult<Option<Transaction>> {
        let pubkey = parse_pubkey(&election_pubkey_hex)?;
        evote_core::query::find_tx_with_output(&self.ledger, kind, &pubkey).map_err(to_rpc_error)
    }

    fn query_unused_ballot_txs(&self, election_pubkey_hex: String) -> RpcResult<Vec<Transaction>> {
        let pubkey = parse_pubkey(&election_pubkey_hex)?;
        Ok(evote_core::query::find_unused_ballot_outputs(self.store.as_ref(), &pubkey))
    }

    fn query_results(&self, election_pubkey_hex: String) -> RpcResult<Vec<TallyRow>> {
        let pubkey = parse_pubkey(&election_pubkey_hex)?;
        let tally = evote_core::query::query_results(&self.ledger, &pubkey).map_err(to_rpc_error)?;
        Ok(tally
            .into_iter()
            .map(|(candidate, count)| TallyRow { candidate, count })
            .collect())
    }

    fn start_election(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn stop_election(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn start_accreditation(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn stop_accreditation(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn start_voting(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn stop_voting(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn create_ballot(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }

    fn cast_ballot(&self, tx: Transaction) -> RpcResult<Block> {
        self.append(tx)
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Binds and runs the JSON-RPC HTTP server on `addr`, serving `rpc` until
/// the returned handle is stopped or dropped.
pub async fn serve(addr: SocketAddr, rpc: EvoteRpcServer) -> anyhow::Result<ServerHandle> {
    let server = Server::builder().build(addr).await?;
    let handle = server.start(rpc.into_rpc());
    tracing::info!(%addr, "rpc server listening");
    Ok(handle)
}
