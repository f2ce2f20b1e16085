//! Binds each transaction to its predecessor and its signers.
//!
//! Every non-genesis transaction is checked against the single predecessor
//! transaction it claims (`tx_out`, absent on OUTPUT transactions which
//! have no predecessor) before the ledger will append it. This module
//! holds no storage access of its own: callers resolve the predecessor
//! (typically via [`crate::ledger::Ledger`]) and pass it in, which keeps
//! the verifier a pure function and easy to exercise in isolation.

use crate::crypto::{MultiSig, PublicKeyRing, RingSignature};
use crate::error::{Error, Result};
use crate::tx::{Phase, Transaction};

/// Verifies `tx` in isolation: multisig/ring-signature checks and, for
/// INPUT transactions, that the signers and election scope are correctly
/// bound to `predecessor`. Ledger-wide checks (duplicate election pubkeys,
/// double-consumed outputs) are the caller's responsibility — see
/// `crate::ledger`.
pub fn verify_transaction(tx: &Transaction, predecessor: Option<&Transaction>) -> Result<()> {
    match tx {
        Transaction::Genesis => Ok(()),
        Transaction::Election(env) => match &env.phase {
            Phase::Open(out) => {
                let ms = MultiSig::from_parts(out.signers.clone(), out.sig_witnesses.clone());
                require(ms.verify(&out.canonical_bytes()), "election output multisig")
            }
            Phase::Close(input) => {
                let pred_out = election_output(predecessor)?;
                require(
                    input.election_pubkey == pred_out.election_pubkey,
                    "election input election_pubkey does not match its predecessor",
                )?;
                require(
                    same_members(&input.signers, &pred_out.signers),
                    "election input signers do not match the election's consensus group",
                )?;
                let ms = MultiSig::from_parts(input.signers.clone(), input.sig_witnesses.clone());
                require(ms.verify(&input.canonical_bytes()), "election input multisig")
            }
        },
        Transaction::Accreditation(env) => match &env.phase {
            Phase::Open(out) => {
                let ms = MultiSig::from_parts(out.signers.clone(), out.sig_witnesses.clone());
                require(ms.verify(&out.canonical_bytes()), "accreditation output multisig")
            }
            Phase::Close(input) => {
                let pred_out = accreditation_output(predecessor)?;
                require(
                    input.election_pubkey == pred_out.election_pubkey,
                    "accreditation input election_pubkey does not match its predecessor",
                )?;
                require(
                    same_members(&input.signers, &pred_out.signers),
                    "accreditation input signers do not match the opening consensus group",
                )?;
                let bytes = input.canonical_bytes_for(&pred_out.election_pubkey);
                let ms = MultiSig::from_parts(input.signers.clone(), input.sig_witnesses.clone());
                require(ms.verify(&bytes), "accreditation input multisig")
            }
        },
        Transaction::Voting(env) => match &env.phase {
            Phase::Open(out) => {
                let ms = MultiSig::from_parts(out.signers.clone(), out.sig_witnesses.clone());
                require(ms.verify(&out.canonical_bytes()), "voting output multisig")
            }
            Phase::Close(input) => {
                let pred_out = voting_output(predecessor)?;
                require(
                    input.election_pubkey == pred_out.election_pubkey,
                    "voting input election_pubkey does not match its predecessor",
                )?;
                require(
                    same_members(&input.signers, &pred_out.signers),
                    "voting input signers do not match the opening consensus group",
                )?;
                let bytes = input.canonical_bytes_for(&pred_out.election_pubkey);
                let ms = MultiSig::from_parts(input.signers.clone(), input.sig_witnesses.clone());
                require(ms.verify(&bytes), "voting input multisig")
            }
        },
        Transaction::Ballot(env) => match &env.phase {
            Phase::Open(out) => {
                let ms = MultiSig::from_parts(out.signers.clone(), out.sig_witnesses.clone());
                require(ms.verify(&out.canonical_bytes()), "ballot output multisig")
            }
            Phase::Close(input) => {
                let pred_out = ballot_output(predecessor)?;
                require(
                    input.election_pubkey == pred_out.election_pubkey,
                    "ballot input election_pubkey does not match its predecessor",
                )?;
                let ring = PublicKeyRing::from_keys(pred_out.pub_keys.clone());
                let bytes = input.canonical_bytes_for(&pred_out.election_pubkey, &pred_out.pub_keys);
                let sig = RingSignature::from_bytes(&input.signature)
                    .map_err(|e| Error::CryptoError(e.to_string()))?;
                require(
                    RingSignature::verify(&ring, &bytes, &sig),
                    "ballot input ring signature",
                )
            }
        },
    }
}

fn require(condition: bool, what: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidTransaction(what.to_string()))
    }
}

/// Two signer lists bind the same consensus group regardless of order.
fn same_members(a: &[Vec<u8>], b: &[Vec<u8>]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

fn election_output(predecessor: Option<&Transaction>) -> Result<crate::tx::ElectionOutput> {
    match predecessor {
        Some(Transaction::Election(env)) => match &env.phase {
            Phase::Open(out) => Ok(out.clone()),
            Phase::Close(_) => Err(Error::InvalidTransaction(
                "election input's predecessor is not an election output".into(),
            )),
        },
        _ => Err(Error::InvalidTransaction("missing election output predecessor".into())),
    }
}

fn accreditation_output(predecessor: Option<&Transaction>) -> Result<crate::tx::AccreditationOutput> {
    match predecessor {
        Some(Transaction::Accreditation(env)) => match &env.phase {
            Phase::Open(out) => Ok(out.clone()),
            Phase::Close(_) => Err(Error::InvalidTransaction(
                "accreditation input's predecessor is not an accreditation output".into(),
            )),
        },
        _ => Err(Error::InvalidTransaction(
            "missing accreditation output predecessor".into(),
        )),
    }
}

fn voting_output(predecessor: Option<&Transaction>) -> Result<crate::tx::VotingOutput> {
    match predecessor {
        Some(Transaction::Voting(env)) => match &env.phase {
            Phase::Open(out) => Ok(out.clone()),
            Phase::Close(_) => Err(Error::InvalidTransaction(
                "voting input's predecessor is not a voting output".into(),
            )),
        },
        _ => Err(Error::InvalidTransaction("missing voting output predecessor".into())),
    }
}

fn ballot_output(predecessor: Option<&Transaction>) -> Result<crate::tx::BallotOutput> {
    match predecessor {
        Some(Transaction::Ballot(env)) => match &env.phase {
            Phase::Open(out) => Ok(out.clone()),
            Phase::Close(_) => Err(Error::InvalidTransaction(
                "ballot input's predecessor is not a ballot output".into(),
            )),
        },
        _ => Err(Error::InvalidTransaction("missing ballot output predecessor".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{BallotInput, BallotOutput, ElectionInput, ElectionOutput};
    use p256::ecdsa::{SigningKey, VerifyingKey};
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn keypair(seed: u64) -> (SigningKey, Vec<u8>) {
        use p256::elliptic_curve::sec1::ToEncodedPoint;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sk = SigningKey::random(&mut rng);
        let pk = VerifyingKey::from(&sk)
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        (sk, pk)
    }

    #[test]
    fn election_output_verifies_against_its_own_multisig() {
        let (sk, pk) = keypair(1);
        let mut out = ElectionOutput {
            election_pubkey: pk.clone(),
            title: "Pres".into(),
            description: "President".into(),
            total_people: 10,
            candidates: vec![vec![1], vec![2]],
            signers: vec![],
            sig_witnesses: vec![],
        };
        let mut ms = MultiSig::default();
        ms.add_signature(&out.canonical_bytes(), &pk, &sk);
        out.signers = ms.pub_keys;
        out.sig_witnesses = ms.sigs;

        let tx = Transaction::new_election_output(out);
        assert!(verify_transaction(&tx, None).is_ok());
    }

    #[test]
    fn election_input_rejects_a_different_consensus_group() {
        let (sk1, pk1) = keypair(2);
        let (sk2, pk2) = keypair(3);

        let mut out = ElectionOutput {
            election_pubkey: pk1.clone(),
            title: "Pres".into(),
            description: "President".into(),
            total_people: 10,
            candidates: vec![vec![1]],
            signers: vec![pk1.clone()],
            sig_witnesses: vec![],
        };
        let mut ms = MultiSig::default();
        ms.add_signature(&out.canonical_bytes(), &pk1, &sk1);
        out.sig_witnesses = ms.sigs;
        let predecessor = Transaction::new_election_output(out);

        let input = ElectionInput {
            tx_out: predecessor.id(),
            election_pubkey: pk1,
            signers: vec![pk2],
            sig_witnesses: vec![],
        };
        let tx = Transaction::new_election_input(input);
        let err = verify_transaction(&tx, Some(&predecessor)).unwrap_err();
        assert!(matches!(err, Error::InvalidTransaction(_)));
        let _ = sk2;
    }

    #[test]
    fn ballot_input_verifies_against_the_rings_predecessor_output() {
        let (voter_sk, voter_pk) = keypair(10);
        let (_, decoy_pk) = keypair(11);
        let (admin_sk, admin_pk) = keypair(12);

        let mut out = BallotOutput {
            tx_id: crate::tx::TxId::ZERO,
            election_pubkey: admin_pk.clone(),
            secret_message: vec![],
            pub_keys: vec![voter_pk.clone(), decoy_pk],
            timestamp: 0,
            signers: vec![],
            sig_witnesses: vec![],
        };
        let mut ms = MultiSig::default();
        ms.add_signature(&out.canonical_bytes(), &admin_pk, &admin_sk);
        out.signers = ms.pub_keys;
        out.sig_witnesses = ms.sigs;
        let predecessor = Transaction::new_ballot_output(out.clone());

        let mut input = BallotInput {
            tx_id: crate::tx::TxId::ZERO,
            tx_out: predecessor.id(),
            election_pubkey: admin_pk.clone(),
            candidate: b"c0".to_vec(),
            pub_keys: out.pub_keys.clone(),
            signature: vec![],
        };
        let ring = PublicKeyRing::from_keys(out.pub_keys.clone());
        let message = input.canonical_bytes_for(&admin_pk, &out.pub_keys);
        let sig = RingSignature::sign(&voter_sk, &ring, &message).unwrap();
        input.signature = sig.to_bytes();

        let tx = Transaction::new_ballot_input(input);
        assert!(verify_transaction(&tx, Some(&predecessor)).is_ok());
    }
}
