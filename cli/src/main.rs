//! Command-line surface over `evote-core` (spec.md §6.3). Each subcommand
//! opens the network's store, builds a [`Ledger`], does one thing, and
//! exits — there is no long-running state beyond the `rpc` subcommand's
//! server loop.

mod ops;
mod paths;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use evote_core::{query, Ledger};
use evote_store::{SledStore, Store};
use evote_wallet::WalletStore;

#[derive(Parser)]
#[command(name = "evote", about = "Electronic-voting ledger CLI", version)]
struct Cli {
    /// Network name; selects `storage/blocks_<network>/`.
    #[arg(long, global = true, default_value = "main")]
    network: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the genesis block for this network.
    Init,
    /// Print every block from the tip back to genesis.
    Print,
    /// Wipe this network's storage and start a fresh chain.
    Reset,
    /// Recompute the UTXO index from the chain.
    Utxo,
    /// Print the candidate tally for an election.
    Result(ResultArgs),
    /// Open or close an election.
    Election(PhaseArgs),
    /// Open or close the accreditation phase.
    Ac(PhaseArgs),
    /// Open or close the voting phase.
    Voting(PhaseArgs),
    /// Mint a ballot ticket or cast a vote through one.
    Ballot(BallotArgs),
    /// Wallet identity management.
    Wallet(WalletArgs),
    /// Run the JSON-RPC server.
    Rpc(RpcArgs),
}

#[derive(Args)]
struct ResultArgs {
    /// Wallet identity naming the election.
    #[arg(long)]
    election: String,
}

#[derive(Subcommand)]
enum PhaseCommand {
    Start(StartArgs),
    Stop(StopArgs),
}

#[derive(Args)]
struct PhaseArgs {
    #[command(subcommand)]
    phase: PhaseCommand,
}

#[derive(Args)]
struct StartArgs {
    /// Wallet identity naming the election.
    #[arg(long)]
    election: String,
    /// Comma-separated wallet identities authorising this phase.
    #[arg(long, value_delimiter = ',')]
    signers: Vec<String>,
    /// Election title (ELECTION phase only).
    #[arg(long, default_value = "")]
    title: String,
    /// Election description (ELECTION phase only).
    #[arg(long, default_value = "")]
    description: String,
    /// Eligible voter count (ELECTION phase only).
    #[arg(long, default_value_t = 0)]
    total_people: i64,
    /// Comma-separated wallet identities naming the candidates (ELECTION
    /// phase only); each candidate's signing pubkey is what ballots record.
    #[arg(long, value_delimiter = ',')]
    candidates: Vec<String>,
}

#[derive(Args)]
struct StopArgs {
    /// Wallet identity naming the election.
    #[arg(long)]
    election: String,
    /// Comma-separated wallet identities authorising this close.
    #[arg(long, value_delimiter = ',')]
    signers: Vec<String>,
    /// Accredited voter count (ACCREDITATION close only).
    #[arg(long, default_value_t = 0)]
    accredited_count: i64,
}

#[derive(Args)]
struct BallotArgs {
    #[command(subcommand)]
    action: BallotCommand,
}

#[derive(Subcommand)]
enum BallotCommand {
    /// Mint a ballot ticket: enrol a voter plus decoys into an anonymity ring.
    Get {
        #[arg(long)]
        election: String,
        /// Comma-separated wallet identities administering the election.
        #[arg(long, value_delimiter = ',')]
        signers: Vec<String>,
        /// Wallet identity of the voter this ticket is addressed to.
        #[arg(long)]
        voter: String,
        /// Comma-separated wallet identities serving as decoys in the ring.
        #[arg(long, value_delimiter = ',')]
        decoys: Vec<String>,
    },
    /// Cast a vote: scan for the caller's own ticket and ring-sign it.
    Cast {
        #[arg(long)]
        election: String,
        /// Wallet identity of the voter casting the ballot.
        #[arg(long)]
        voter: String,
        /// Wallet identity naming the chosen candidate.
        #[arg(long)]
        candidate: String,
    },
}

#[derive(Args)]
struct WalletArgs {
    #[command(subcommand)]
    action: WalletCommand,
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Generate a fresh signing + viewing identity under `--user`.
    Create {
        #[arg(long)]
        user: String,
    },
}

#[derive(Args)]
struct RpcArgs {
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init => cmd_init(&cli.network),
        Command::Print => cmd_print(&cli.network),
        Command::Reset => cmd_reset(&cli.network),
        Command::Utxo => cmd_utxo(&cli.network),
        Command::Result(args) => cmd_result(&cli.network, &args),
        Command::Election(args) => cmd_election(&cli.network, args),
        Command::Ac(args) => cmd_accreditation(&cli.network, args),
        Command::Voting(args) => cmd_voting(&cli.network, args),
        Command::Ballot(args) => cmd_ballot(&cli.network, args),
        Command::Wallet(args) => cmd_wallet(args),
        Command::Rpc(args) => cmd_rpc(&cli.network, args),
    }
}

fn open_store(network: &str) -> anyhow::Result<Arc<dyn Store>> {
    let store = SledStore::open(paths::blocks_dir(network))?;
    Ok(Arc::new(store))
}

fn open_ledger(network: &str) -> anyhow::Result<(Arc<dyn Store>, Ledger)> {
    let store = open_store(network)?;
    let ledger = Ledger::re_init(store.clone())?;
    Ok((store, ledger))
}

fn open_wallets() -> anyhow::Result<WalletStore> {
    Ok(WalletStore::load(paths::wallets_file())?)
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn cmd_init(network: &str) -> anyhow::Result<()> {
    let store = open_store(network)?;
    Ledger::init(store, now_unix())?;
    println!("chain {network:?} initialized");
    Ok(())
}

fn cmd_print(network: &str) -> anyhow::Result<()> {
    let (_, ledger) = open_ledger(network)?;
    for block in ledger.iter_display() {
        let block = block?;
        println!(
            "--- height {} (hash {}) ---",
            block.height,
            hex::encode(&block.hash)
        );
        for tx in &block.transactions {
            println!("  {tx}");
        }
    }
    Ok(())
}

fn cmd_reset(network: &str) -> anyhow::Result<()> {
    let dir = paths::blocks_dir(network);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    let store = open_store(network)?;
    Ledger::init(store, now_unix())?;
    println!("chain {network:?} reset");
    Ok(())
}

fn cmd_utxo(network: &str) -> anyhow::Result<()> {
    let (store, ledger) = open_ledger(network)?;
    evote_core::utxo::compute(store.as_ref(), &ledger)?;
    println!("utxo index recomputed");
    Ok(())
}

fn cmd_result(network: &str, args: &ResultArgs) -> anyhow::Result<()> {
    let (_, ledger) = open_ledger(network)?;
    let wallets = open_wallets()?;
    let pubkey = wallets.get(&args.election)?.signing_pubkey();
    let tally = query::query_results(&ledger, &pubkey)?;
    for (candidate, count) in tally {
        println!("{candidate}: {count}");
    }
    Ok(())
}

fn cmd_election(network: &str, args: PhaseArgs) -> anyhow::Result<()> {
    let wallets = open_wallets()?;
    let (_, ledger) = open_ledger(network)?;
    let tx = match args.phase {
        PhaseCommand::Start(a) => {
            let candidates = a
                .candidates
                .iter()
                .map(|name| wallets.get(name).map(|id| id.signing_pubkey()))
                .collect::<Result<Vec<_>, _>>()?;
            ops::start_election(
                &wallets,
                &a.election,
                &a.signers,
                &a.title,
                &a.description,
                a.total_people,
                &candidates,
            )?
        }
        PhaseCommand::Stop(a) => ops::stop_election(&ledger, &wallets, &a.election, &a.signers)?,
    };
    submit(&ledger, tx)
}

fn cmd_accreditation(network: &str, args: PhaseArgs) -> anyhow::Result<()> {
    let wallets = open_wallets()?;
    let (_, ledger) = open_ledger(network)?;
    let tx = match args.phase {
        PhaseCommand::Start(a) => ops::start_accreditation(&ledger, &wallets, &a.election, &a.signers)?,
        PhaseCommand::Stop(a) => ops::stop_accreditation(
            &ledger,
            &wallets,
            &a.election,
            &a.signers,
            a.accredited_count,
        )?,
    };
    submit(&ledger, tx)
}

fn cmd_voting(network: &str, args: PhaseArgs) -> anyhow::Result<()> {
    let wallets = open_wallets()?;
    let (_, ledger) = open_ledger(network)?;
    let tx = match args.phase {
        PhaseCommand::Start(a) => ops::start_voting(&ledger, &wallets, &a.election, &a.signers)?,
        PhaseCommand::Stop(a) => ops::stop_voting(&ledger, &wallets, &a.election, &a.signers)?,
    };
    submit(&ledger, tx)
}

fn cmd_ballot(network: &str, args: BallotArgs) -> anyhow::Result<()> {
    let wallets = open_wallets()?;
    let (store, ledger) = open_ledger(network)?;
    let tx = match args.action {
        BallotCommand::Get {
            election,
            signers,
            voter,
            decoys,
        } => ops::create_ballot(&ledger, &wallets, &election, &signers, &voter, &decoys)?,
        BallotCommand::Cast {
            election,
            voter,
            candidate,
        } => ops::cast_ballot(store.as_ref(), &wallets, &election, &voter, &candidate)?,
    };
    submit(&ledger, tx)
}

fn cmd_wallet(args: WalletArgs) -> anyhow::Result<()> {
    match args.action {
        WalletCommand::Create { user } => {
            let mut wallets = open_wallets()?;
            let identity = wallets.add(&user);
            println!("{user}: {identity}");
            wallets.save(paths::wallets_file())?;
            Ok(())
        }
    }
}

fn cmd_rpc(network: &str, args: RpcArgs) -> anyhow::Result<()> {
    let (store, ledger) = open_ledger(network)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let addr: std::net::SocketAddr = ([127, 0, 0, 1], args.port).into();
        let server = evote_rpc::EvoteRpcServer::new(Arc::new(ledger), store);
        let handle = evote_rpc::serve(addr, server).await?;
        println!("rpc listening on {addr}");
        handle.stopped().await;
        Ok::<_, anyhow::Error>(())
    })
}

/// Appends a freshly built transaction as its own block and reports the
/// resulting height.
fn submit(ledger: &Ledger, tx: evote_core::Transaction) -> anyhow::Result<()> {
    let block = ledger.add_block(vec![tx], now_unix())?;
    println!("appended at height {}", block.height);
    Ok(())
}
