//! Builds and signs each of the eight OUTPUT/INPUT transaction shapes from
//! named wallet identities, mirroring the constructor-function style of
//! `original_source/core/electiontx.go` (`NewElectionTxOutput`,
//! `NewElectionTxInput`, ...). This is CLI-level business logic, not core's
//! — the core crate only ever sees an already-built, already-signed
//! [`Transaction`] (spec.md §5: wallet storage and signing happen outside
//! the core).

use anyhow::{anyhow, Context, Result};
use rand::RngCore;

use evote_core::crypto::MultiSig;
use evote_core::tx::{
    AccreditationInput, AccreditationOutput, BallotInput, BallotOutput, ElectionInput, ElectionOutput, TxKind,
    VotingInput, VotingOutput,
};
use evote_core::{query, Ledger, Transaction, TxId};
use evote_wallet::{envelope, Identity, WalletStore};

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn resolve<'a>(wallets: &'a WalletStore, name: &str) -> Result<&'a Identity> {
    wallets
        .get(name)
        .map_err(|e| anyhow!(e.to_string()))
        .with_context(|| format!("unknown wallet identity {name:?}"))
}

fn resolve_all<'a>(wallets: &'a WalletStore, names: &[String]) -> Result<Vec<&'a Identity>> {
    names.iter().map(|n| resolve(wallets, n)).collect()
}

fn multisign(data: &[u8], signers: &[&Identity]) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
    let mut ms = MultiSig::with_capacity(signers.len());
    for id in signers {
        ms.add_signature(data, &id.signing_pubkey(), &id.signing_key);
    }
    (ms.pub_keys, ms.sigs)
}

/// The most recently opened phase's OUTPUT id for `election_pubkey`: voting
/// if it exists, else accreditation, else the election itself. This is the
/// lineage `tx_id` each later phase's OUTPUT/INPUT carries; spec.md leaves
/// its exact parentage for voting/ballot phases unspecified beyond
/// accreditation's explicit "parent election-output id" (§3), resolved here
/// as "the output of whichever phase most recently opened" (see DESIGN.md).
fn lineage_anchor(ledger: &Ledger, election_pubkey: &[u8]) -> Result<TxId> {
    for kind in [TxKind::Voting, TxKind::Accreditation, TxKind::Election] {
        if let Some(tx) = query::find_tx_with_output(ledger, kind, election_pubkey)? {
            return Ok(tx.id());
        }
    }
    Err(anyhow!("no election found for this election_pubkey"))
}

// ---------------------------------------------------------------- election

pub fn start_election(
    wallets: &WalletStore,
    election_identity: &str,
    signer_names: &[String],
    title: &str,
    description: &str,
    total_people: i64,
    candidates: &[Vec<u8>],
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let signers = resolve_all(wallets, signer_names)?;

    let mut out = ElectionOutput {
        election_pubkey: election.signing_pubkey(),
        title: title.to_string(),
        description: description.to_string(),
        total_people,
        candidates: candidates.to_vec(),
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &signers);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    Ok(Transaction::new_election_output(out))
}

pub fn stop_election(
    ledger: &Ledger,
    wallets: &WalletStore,
    election_identity: &str,
    signer_names: &[String],
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let predecessor = query::find_tx_with_output(ledger, TxKind::Election, &pubkey)?
        .ok_or_else(|| anyhow!("no open election output for this identity"))?;
    let signers = resolve_all(wallets, signer_names)?;

    let mut input = ElectionInput {
        tx_out: predecessor.id(),
        election_pubkey: pubkey,
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&input.canonical_bytes(), &signers);
    input.signers = pub_keys;
    input.sig_witnesses = sigs;
    Ok(Transaction::new_election_input(input))
}

// ----------------------------------------------------------- accreditation

pub fn start_accreditation(
    ledger: &Ledger,
    wallets: &WalletStore,
    election_identity: &str,
    signer_names: &[String],
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let tx_id = lineage_anchor(ledger, &pubkey)?;
    let signers = resolve_all(wallets, signer_names)?;

    let mut out = AccreditationOutput {
        tx_id,
        election_pubkey: pubkey,
        timestamp: now_unix(),
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &signers);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    Ok(Transaction::new_accreditation_output(out))
}

pub fn stop_accreditation(
    ledger: &Ledger,
    wallets: &WalletStore,
    election_identity: &str,
    signer_names: &[String],
    accredited_count: i64,
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let predecessor = query::find_tx_with_output(ledger, TxKind::Accreditation, &pubkey)?
        .ok_or_else(|| anyhow!("no open accreditation output for this identity"))?;
    let signers = resolve_all(wallets, signer_names)?;

    let mut input = AccreditationInput {
        tx_id: predecessor.id(),
        tx_out: predecessor.id(),
        election_pubkey: pubkey,
        accredited_count,
        timestamp: now_unix(),
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&input.canonical_bytes(), &signers);
    input.signers = pub_keys;
    input.sig_witnesses = sigs;
    Ok(Transaction::new_accreditation_input(input))
}

// ----------------------------------------------------------------- voting

pub fn start_voting(
    ledger: &Ledger,
    wallets: &WalletStore,
    election_identity: &str,
    signer_names: &[String],
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let tx_id = lineage_anchor(ledger, &pubkey)?;
    let signers = resolve_all(wallets, signer_names)?;

    let mut out = VotingOutput {
        tx_id,
        election_pubkey: pubkey,
        timestamp: now_unix(),
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &signers);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    Ok(Transaction::new_voting_output(out))
}

pub fn stop_voting(
    ledger: &Ledger,
    wallets: &WalletStore,
    election_identity: &str,
    signer_names: &[String],
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let predecessor = query::find_tx_with_output(ledger, TxKind::Voting, &pubkey)?
        .ok_or_else(|| anyhow!("no open voting output for this identity"))?;
    let signers = resolve_all(wallets, signer_names)?;

    let mut input = VotingInput {
        tx_id: predecessor.id(),
        tx_out: predecessor.id(),
        election_pubkey: pubkey,
        timestamp: now_unix(),
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&input.canonical_bytes(), &signers);
    input.signers = pub_keys;
    input.sig_witnesses = sigs;
    Ok(Transaction::new_voting_input(input))
}

// ----------------------------------------------------------------- ballot

/// Mints a ballot ticket: enrols `voter_name` plus `decoy_names` into a
/// fresh anonymity ring, wraps a random nonce under the voter's viewing key
/// (§4.6 step 1), and multisigns with `admin_signer_names`.
pub fn create_ballot(
    ledger: &Ledger,
    wallets: &WalletStore,
    election_identity: &str,
    admin_signer_names: &[String],
    voter_name: &str,
    decoy_names: &[String],
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let tx_id = lineage_anchor(ledger, &pubkey)?;
    let voter = resolve(wallets, voter_name)?;
    let decoys = resolve_all(wallets, decoy_names)?;
    let admins = resolve_all(wallets, admin_signer_names)?;

    let mut ring = vec![voter.signing_pubkey()];
    ring.extend(decoys.iter().map(|d| d.signing_pubkey()));

    let mut nonce = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut nonce);
    let secret_message =
        envelope::seal(&voter.viewing_pubkey(), &nonce).map_err(|e| anyhow!(e.to_string()))?;

    let mut out = BallotOutput {
        tx_id,
        election_pubkey: pubkey,
        secret_message,
        pub_keys: ring,
        timestamp: now_unix(),
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &admins);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    Ok(Transaction::new_ballot_output(out))
}

/// Scans `election_pubkey`'s unclaimed ballot tickets and trial-decrypts
/// each `secret_message` with `voter_name`'s viewing key to find "their"
/// ticket (§4.6 step 3), then ring-signs a vote for `candidate_name` over
/// that ticket's ring.
pub fn cast_ballot(
    store: &dyn evote_store::Store,
    wallets: &WalletStore,
    election_identity: &str,
    voter_name: &str,
    candidate_name: &str,
) -> Result<Transaction> {
    let election = resolve(wallets, election_identity)?;
    let pubkey = election.signing_pubkey();
    let voter = resolve(wallets, voter_name)?;
    let candidate = resolve(wallets, candidate_name)?;

    let tickets = query::find_unused_ballot_outputs(store, &pubkey);
    let (ticket_tx, output) = tickets
        .iter()
        .find_map(|tx| match tx {
            Transaction::Ballot(env) => match &env.phase {
                evote_core::tx::Phase::Open(out) if envelope::open(&voter.viewing_key, &out.secret_message).is_ok() => {
                    Some((tx, out.clone()))
                }
                _ => None,
            },
            _ => None,
        })
        .ok_or_else(|| anyhow!("no claimable ballot ticket decrypts under this voter's viewing key"))?;

    let mut input = BallotInput {
        tx_id: output.tx_id,
        tx_out: ticket_tx.id(),
        election_pubkey: pubkey,
        candidate: candidate.signing_pubkey(),
        pub_keys: output.pub_keys.clone(),
        signature: vec![],
    };
    let ring = evote_core::crypto::PublicKeyRing::from_keys(output.pub_keys.clone());
    let message = input.canonical_bytes();
    let signature = evote_core::crypto::RingSignature::sign(&voter.signing_key, &ring, &message)
        .map_err(|e| anyhow!(e.to_string()))?;
    input.signature = signature.to_bytes();

    Ok(Transaction::new_ballot_input(input))
}
