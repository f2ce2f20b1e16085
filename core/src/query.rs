//! Read-only lookups over the ledger and UTXO index: predecessor lookup by
//! election scope, claimable ballot tickets, and the candidate tally.

use std::collections::BTreeMap;

use evote_store::Store;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::tx::{Transaction, TxKind};
use crate::utxo;

/// The first transaction whose OUTPUT side of kind `kind` carries
/// `election_pubkey`. Used to resolve a predecessor by election scope
/// rather than by id (e.g. "the election output for e1").
pub fn find_tx_with_output(ledger: &Ledger, kind: TxKind, election_pubkey: &[u8]) -> Result<Option<Transaction>> {
    for tx in ledger.get_transactions()?.into_iter().rev() {
        if tx.is_output() && tx.kind() == Some(kind) && tx.election_pubkey() == Some(election_pubkey) {
            return Ok(Some(tx));
        }
    }
    Ok(None)
}

/// Ballot output tickets not yet claimed by a matching ballot input, for a
/// given election. A voter trial-decrypts each `secret_message` to find
/// their own ticket (§4.6); this function does not attempt decryption.
pub fn find_unused_ballot_outputs(store: &dyn Store, election_pubkey: &[u8]) -> Vec<Transaction> {
    utxo::find_unused_outputs(store, TxKind::Ballot, election_pubkey)
}

/// Tallies BALLOT INPUT transactions scoped to `election_pubkey` by
/// candidate, seeded with a zero count for every candidate named in the
/// election's OUTPUT. Votes for a candidate outside that list are ignored.
pub fn query_results(ledger: &Ledger, election_pubkey: &[u8]) -> Result<BTreeMap<String, u64>> {
    let mut tally = BTreeMap::new();

    if let Some(election) = find_tx_with_output(ledger, TxKind::Election, election_pubkey)? {
        if let Transaction::Election(env) = &election {
            if let crate::tx::Phase::Open(out) = &env.phase {
                for candidate in &out.candidates {
                    tally.insert(hex::encode(candidate), 0u64);
                }
            }
        }
    }

    for tx in ledger.get_transactions()? {
        if let Transaction::Ballot(env) = &tx {
            if let crate::tx::Phase::Close(input) = &env.phase {
                if input.election_pubkey == election_pubkey {
                    let key = hex::encode(&input.candidate);
                    if let Some(count) = tally.get_mut(&key) {
                        *count += 1;
                    }
                }
            }
        }
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{
        BallotInput, BallotOutput, ElectionOutput, TxId,
    };
    use crate::crypto::{MultiSig, PublicKeyRing, RingSignature};
    use evote_store::InMemoryStore;
    use p256::ecdsa::{SigningKey, VerifyingKey};
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn keypair(seed: u64) -> (SigningKey, Vec<u8>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sk = SigningKey::random(&mut rng);
        let pk = VerifyingKey::from(&sk)
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        (sk, pk)
    }

    #[test]
    fn tally_counts_ballots_per_candidate_and_zeroes_the_rest() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let ledger = Ledger::init(store.clone(), 0).unwrap();

        let (admin_sk, admin_pk) = keypair(1);
        let c0 = vec![10u8];
        let c1 = vec![11u8];
        let mut election = ElectionOutput {
            election_pubkey: admin_pk.clone(),
            title: "Pres".into(),
            description: "President".into(),
            total_people: 10,
            candidates: vec![c0.clone(), c1.clone()],
            signers: vec![],
            sig_witnesses: vec![],
        };
        let mut ms = MultiSig::default();
        ms.add_signature(&election.canonical_bytes(), &admin_pk, &admin_sk);
        election.signers = ms.pub_keys;
        election.sig_witnesses = ms.sigs;
        ledger
            .add_block(vec![Transaction::new_election_output(election)], 1)
            .unwrap();

        let (voter_sk, voter_pk) = keypair(2);
        let (_, decoy_pk) = keypair(3);
        let mut ballot_out = BallotOutput {
            tx_id: TxId::ZERO,
            election_pubkey: admin_pk.clone(),
            secret_message: vec![],
            pub_keys: vec![voter_pk.clone(), decoy_pk],
            timestamp: 0,
            signers: vec![],
            sig_witnesses: vec![],
        };
        let mut ms = MultiSig::default();
        ms.add_signature(&ballot_out.canonical_bytes(), &admin_pk, &admin_sk);
        ballot_out.signers = ms.pub_keys;
        ballot_out.sig_witnesses = ms.sigs;
        let ballot_output_tx = Transaction::new_ballot_output(ballot_out.clone());
        ledger.add_block(vec![ballot_output_tx.clone()], 2).unwrap();

        let mut ballot_in = BallotInput {
            tx_id: TxId::ZERO,
            tx_out: ballot_output_tx.id(),
            election_pubkey: admin_pk.clone(),
            candidate: c0.clone(),
            pub_keys: ballot_out.pub_keys.clone(),
            signature: vec![],
        };
        let ring = PublicKeyRing::from_keys(ballot_out.pub_keys.clone());
        let message = ballot_in.canonical_bytes_for(&admin_pk, &ballot_out.pub_keys);
        let sig = RingSignature::sign(&voter_sk, &ring, &message).unwrap();
        ballot_in.signature = sig.to_bytes();
        ledger
            .add_block(vec![Transaction::new_ballot_input(ballot_in)], 3)
            .unwrap();

        let tally = query_results(&ledger, &admin_pk).unwrap();
        assert_eq!(tally.get(&hex::encode(&c0)).copied(), Some(1));
        assert_eq!(tally.get(&hex::encode(&c1)).copied(), Some(0));
    }
}
