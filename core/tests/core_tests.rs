//! Integration tests for the six literal scenarios of spec.md §8, run
//! against [`InMemoryStore`] with a deterministic `ChaCha8Rng` seed so keys
//! and ids are reproducible across runs.

use std::sync::Arc;

use evote_core::crypto::{MultiSig, PublicKeyRing, RingSignature};
use evote_core::tx::{
    AccreditationInput, AccreditationOutput, BallotInput, BallotOutput, ElectionInput, ElectionOutput, TxKind,
};
use evote_core::{query, Error, Ledger, Transaction, TxId};
use evote_store::{InMemoryStore, Store};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn keypair(seed: u64) -> (SigningKey, Vec<u8>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sk = SigningKey::random(&mut rng);
    let pk = VerifyingKey::from(&sk).to_encoded_point(true).as_bytes().to_vec();
    (sk, pk)
}

fn multisign(data: &[u8], signers: &[(SigningKey, Vec<u8>)]) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
    let mut ms = MultiSig::with_capacity(signers.len());
    for (sk, pk) in signers {
        ms.add_signature(data, pk, sk);
    }
    (ms.pub_keys, ms.sigs)
}

fn fresh_ledger() -> (Arc<dyn Store>, Ledger) {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let ledger = Ledger::init(store.clone(), 0).unwrap();
    (store, ledger)
}

/// Scenario 1: a fresh store's genesis block sits at height 1 with an empty
/// `prev_hash`.
#[test]
fn scenario_genesis() {
    let (_, ledger) = fresh_ledger();
    assert_eq!(ledger.best_height().unwrap(), 1);
    let genesis = ledger.get_block_by_height(1).unwrap();
    assert!(genesis.prev_hash.is_empty());
    assert!(matches!(genesis.transactions.as_slice(), [Transaction::Genesis]));
}

/// Scenario 2: four signers multisign an ELECTION OUTPUT; `add_block`
/// succeeds and `find_tx_with_output` resolves it by election pubkey.
#[test]
fn scenario_election_create() {
    let (_, ledger) = fresh_ledger();
    let signers: Vec<_> = (0..4).map(keypair).collect();
    let c0 = vec![100u8];
    let c1 = vec![101u8];
    let c2 = vec![102u8];
    let c3 = vec![103u8];

    let mut out = ElectionOutput {
        election_pubkey: b"e1".to_vec(),
        title: "Pres".into(),
        description: "President".into(),
        total_people: 100,
        candidates: vec![c0, c1, c2, c3],
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &signers);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    let tx = Transaction::new_election_output(out);
    let tx_id = tx.id();

    ledger.add_block(vec![tx], 1).unwrap();

    let found = query::find_tx_with_output(&ledger, TxKind::Election, b"e1").unwrap();
    assert_eq!(found.unwrap().id(), tx_id);
}

fn signed_election_output(election_pubkey: &[u8], signers: &[(SigningKey, Vec<u8>)]) -> Transaction {
    let mut out = ElectionOutput {
        election_pubkey: election_pubkey.to_vec(),
        title: "Pres".into(),
        description: "President".into(),
        total_people: 100,
        candidates: vec![vec![1], vec![2], vec![3], vec![4]],
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), signers);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    Transaction::new_election_output(out)
}

/// Scenario 3: repeating election creation with the same `election_pubkey`
/// fails at the ledger's uniqueness check (I4); chain height is unchanged.
#[test]
fn scenario_duplicate_election_rejected() {
    let (_, ledger) = fresh_ledger();
    let signers: Vec<_> = (0..4).map(keypair).collect();

    ledger
        .add_block(vec![signed_election_output(b"e1", &signers)], 1)
        .unwrap();
    let height_after_first = ledger.best_height().unwrap();

    let err = ledger
        .add_block(vec![signed_election_output(b"e1", &signers)], 2)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransaction(_)));
    assert_eq!(ledger.best_height().unwrap(), height_after_first);
}

/// Scenario 4: an ACCREDITATION OUTPUT referencing the election, then an
/// ACCREDITATION INPUT closing it — the verifier rebinds `election_pubkey`
/// to the predecessor's before checking the multisig.
#[test]
fn scenario_accreditation_close_binds_to_election() {
    let (_, ledger) = fresh_ledger();
    let signers: Vec<_> = (0..4).map(keypair).collect();

    let election_tx = signed_election_output(b"e1", &signers);
    let election_id = election_tx.id();
    ledger.add_block(vec![election_tx], 1).unwrap();

    let mut ac_out = AccreditationOutput {
        tx_id: election_id,
        election_pubkey: b"e1".to_vec(),
        timestamp: 10,
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&ac_out.canonical_bytes(), &signers);
    ac_out.signers = pub_keys;
    ac_out.sig_witnesses = sigs;
    let ac_out_tx = Transaction::new_accreditation_output(ac_out);
    let ac_out_id = ac_out_tx.id();
    ledger.add_block(vec![ac_out_tx], 11).unwrap();

    let mut ac_in = AccreditationInput {
        tx_id: election_id,
        tx_out: ac_out_id,
        election_pubkey: b"e1".to_vec(),
        accredited_count: 100,
        timestamp: 20,
        signers: vec![],
        sig_witnesses: vec![],
    };
    let bytes = ac_in.canonical_bytes_for(b"e1");
    let (pub_keys, sigs) = multisign(&bytes, &signers);
    ac_in.signers = pub_keys;
    ac_in.sig_witnesses = sigs;

    let block = ledger
        .add_block(vec![Transaction::new_accreditation_input(ac_in)], 21)
        .unwrap();
    assert_eq!(block.height, 4);
}

/// Scenario 5: a ballot cast through a 3-member ring (voter + two decoys)
/// verifies regardless of which ring member actually signed — verification
/// cannot distinguish signers.
#[test]
fn scenario_ballot_cast_anonymity() {
    let (store, ledger) = fresh_ledger();
    let admins: Vec<_> = (0..2).map(|s| keypair(100 + s)).collect();

    ledger
        .add_block(vec![signed_election_output(b"e1", &admins)], 1)
        .unwrap();

    let (voter_sk, voter_pk) = keypair(1);
    let (decoy1_sk, decoy1_pk) = keypair(2);
    let (decoy2_sk, decoy2_pk) = keypair(3);
    let ring_keys = vec![voter_pk, decoy1_pk, decoy2_pk];

    let mut ballot_out = BallotOutput {
        tx_id: TxId::ZERO,
        election_pubkey: b"e1".to_vec(),
        secret_message: vec![],
        pub_keys: ring_keys.clone(),
        timestamp: 2,
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&ballot_out.canonical_bytes(), &admins);
    ballot_out.signers = pub_keys;
    ballot_out.sig_witnesses = sigs;
    let ballot_out_tx = Transaction::new_ballot_output(ballot_out);
    let ballot_out_id = ballot_out_tx.id();
    ledger.add_block(vec![ballot_out_tx], 3).unwrap();

    let ring = PublicKeyRing::from_keys(ring_keys.clone());

    let cast_with = |signer: &SigningKey, out_id: TxId, candidate: &[u8]| -> Transaction {
        let mut input = BallotInput {
            tx_id: TxId::ZERO,
            tx_out: out_id,
            election_pubkey: b"e1".to_vec(),
            candidate: candidate.to_vec(),
            pub_keys: ring_keys.clone(),
            signature: vec![],
        };
        let message = input.canonical_bytes_for(b"e1", &ring_keys);
        let sig = RingSignature::sign(signer, &ring, &message).unwrap();
        input.signature = sig.to_bytes();
        Transaction::new_ballot_input(input)
    };

    let voter_tx = cast_with(&voter_sk, ballot_out_id, b"c0");
    ledger.add_block(vec![voter_tx], 4).unwrap();

    // A second, independent ballot ticket cast by a different ring member
    // also produces a signature that verifies — anonymity holds.
    let mut second_out = BallotOutput {
        tx_id: TxId::ZERO,
        election_pubkey: b"e1".to_vec(),
        secret_message: vec![],
        pub_keys: ring_keys.clone(),
        timestamp: 5,
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&second_out.canonical_bytes(), &admins);
    second_out.signers = pub_keys;
    second_out.sig_witnesses = sigs;
    let second_out_tx = Transaction::new_ballot_output(second_out);
    let second_out_id = second_out_tx.id();
    ledger.add_block(vec![second_out_tx], 6).unwrap();

    let decoy_tx = cast_with(&decoy1_sk, second_out_id, b"c1");
    ledger.add_block(vec![decoy_tx], 7).unwrap();

    let tally = query::query_results(&ledger, b"e1").unwrap();
    assert_eq!(tally.get(&hex::encode(b"c0")).copied(), Some(1));
    assert_eq!(tally.get(&hex::encode(b"c1")).copied(), Some(1));
    let _ = (decoy2_sk, store);
}

/// Scenario 6: after an election with candidates C0..C3, two ballots land
/// on C0 and one on C1 — the tally reports `{C0: 2, C1: 1, C2: 0, C3: 0}`.
#[test]
fn scenario_tally() {
    let (_, ledger) = fresh_ledger();
    let admins: Vec<_> = (0..2).map(|s| keypair(200 + s)).collect();

    let c0 = vec![10u8];
    let c1 = vec![11u8];
    let c2 = vec![12u8];
    let c3 = vec![13u8];
    let mut election = ElectionOutput {
        election_pubkey: b"e1".to_vec(),
        title: "Pres".into(),
        description: "President".into(),
        total_people: 100,
        candidates: vec![c0.clone(), c1.clone(), c2.clone(), c3.clone()],
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&election.canonical_bytes(), &admins);
    election.signers = pub_keys;
    election.sig_witnesses = sigs;
    ledger
        .add_block(vec![Transaction::new_election_output(election)], 1)
        .unwrap();

    let mut cast = |seed: u64, candidate: Vec<u8>, height_seed: i64| {
        let (voter_sk, voter_pk) = keypair(seed);
        let (_, decoy_pk) = keypair(seed + 1000);
        let ring_keys = vec![voter_pk, decoy_pk];

        let mut out = BallotOutput {
            tx_id: TxId::ZERO,
            election_pubkey: b"e1".to_vec(),
            secret_message: vec![],
            pub_keys: ring_keys.clone(),
            timestamp: height_seed,
            signers: vec![],
            sig_witnesses: vec![],
        };
        let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &admins);
        out.signers = pub_keys;
        out.sig_witnesses = sigs;
        let out_tx = Transaction::new_ballot_output(out);
        let out_id = out_tx.id();
        ledger.add_block(vec![out_tx], height_seed).unwrap();

        let ring = PublicKeyRing::from_keys(ring_keys.clone());
        let mut input = BallotInput {
            tx_id: TxId::ZERO,
            tx_out: out_id,
            election_pubkey: b"e1".to_vec(),
            candidate,
            pub_keys: ring_keys.clone(),
            signature: vec![],
        };
        let message = input.canonical_bytes_for(b"e1", &ring_keys);
        let sig = RingSignature::sign(&voter_sk, &ring, &message).unwrap();
        input.signature = sig.to_bytes();
        ledger
            .add_block(vec![Transaction::new_ballot_input(input)], height_seed + 1)
            .unwrap();
    };

    cast(1, c0.clone(), 2);
    cast(2, c0.clone(), 4);
    cast(3, c1.clone(), 6);

    let tally = query::query_results(&ledger, b"e1").unwrap();
    assert_eq!(tally.get(&hex::encode(&c0)).copied(), Some(2));
    assert_eq!(tally.get(&hex::encode(&c1)).copied(), Some(1));
    assert_eq!(tally.get(&hex::encode(&c2)).copied(), Some(0));
    assert_eq!(tally.get(&hex::encode(&c3)).copied(), Some(0));
}

/// Testable property 5 (§8): after `utxo::compute`, an output consumed by a
/// ballot input no longer appears among unused ballot outputs.
#[test]
fn consumed_ballot_output_is_absent_from_unused_tickets() {
    let (store, ledger) = fresh_ledger();
    let admins: Vec<_> = (0..2).map(|s| keypair(300 + s)).collect();
    ledger
        .add_block(vec![signed_election_output(b"e1", &admins)], 1)
        .unwrap();

    let (voter_sk, voter_pk) = keypair(1);
    let (_, decoy_pk) = keypair(2);
    let ring_keys = vec![voter_pk, decoy_pk];

    let mut out = BallotOutput {
        tx_id: TxId::ZERO,
        election_pubkey: b"e1".to_vec(),
        secret_message: vec![],
        pub_keys: ring_keys.clone(),
        timestamp: 2,
        signers: vec![],
        sig_witnesses: vec![],
    };
    let (pub_keys, sigs) = multisign(&out.canonical_bytes(), &admins);
    out.signers = pub_keys;
    out.sig_witnesses = sigs;
    let out_tx = Transaction::new_ballot_output(out);
    let out_id = out_tx.id();
    ledger.add_block(vec![out_tx], 3).unwrap();

    assert_eq!(query::find_unused_ballot_outputs(store.as_ref(), b"e1").len(), 1);

    let ring = PublicKeyRing::from_keys(ring_keys.clone());
    let mut input = BallotInput {
        tx_id: TxId::ZERO,
        tx_out: out_id,
        election_pubkey: b"e1".to_vec(),
        candidate: vec![1],
        pub_keys: ring_keys.clone(),
        signature: vec![],
    };
    let message = input.canonical_bytes_for(b"e1", &ring_keys);
    let sig = RingSignature::sign(&voter_sk, &ring, &message).unwrap();
    input.signature = sig.to_bytes();
    ledger.add_block(vec![Transaction::new_ballot_input(input)], 4).unwrap();

    assert!(query::find_unused_ballot_outputs(store.as_ref(), b"e1").is_empty());
}

/// §9 open question, resolved: an INPUT consuming an already-consumed
/// OUTPUT is rejected as `InvalidTransaction` rather than silently
/// double-counted.
#[test]
fn double_consuming_an_output_is_rejected() {
    let (_, ledger) = fresh_ledger();
    let admins: Vec<_> = (0..2).map(|s| keypair(400 + s)).collect();
    let election_tx = signed_election_output(b"e1", &admins);
    let election_id = election_tx.id();
    ledger.add_block(vec![election_tx], 1).unwrap();

    let close = |signers: &[(SigningKey, Vec<u8>)]| {
        let mut input = ElectionInput {
            tx_out: election_id,
            election_pubkey: b"e1".to_vec(),
            signers: vec![],
            sig_witnesses: vec![],
        };
        let (pub_keys, sigs) = multisign(&input.canonical_bytes(), signers);
        input.signers = pub_keys;
        input.sig_witnesses = sigs;
        Transaction::new_election_input(input)
    };

    ledger.add_block(vec![close(&admins)], 2).unwrap();
    let err = ledger.add_block(vec![close(&admins)], 3).unwrap_err();
    assert!(matches!(err, Error::InvalidTransaction(_)));
}
