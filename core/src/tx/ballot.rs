//! BALLOT transaction: opens with a voter's enrolment into an anonymity
//! ring, closes with an anonymous vote cast through that ring.

use serde::{Deserialize, Serialize};

use super::TxId;

/// Enrols a voter's public key into the ring a later BALLOT INPUT will vote
/// through. `secret_message` carries the ECIES-enveloped ballot payload
/// (see `evote_wallet::envelope`); it is opaque to the chain itself.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BallotOutput {
    pub tx_id: TxId,
    pub election_pubkey: Vec<u8>,
    pub secret_message: Vec<u8>,
    pub pub_keys: Vec<Vec<u8>>,
    pub timestamp: i64,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl BallotOutput {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = BallotOutput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("ballot output is always serializable")
    }
}

/// Casts an anonymous vote: `signature` is a ring signature over this
/// input's trimmed bytes, verified against the ring of `pub_keys` carried
/// by the OUTPUT it consumes — never against a single signer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BallotInput {
    pub tx_id: TxId,
    pub tx_out: TxId,
    pub election_pubkey: Vec<u8>,
    pub candidate: Vec<u8>,
    pub pub_keys: Vec<Vec<u8>>,
    pub signature: Vec<u8>,
}

impl BallotInput {
    /// Trimmed bytes with `signature` cleared, the message the ring
    /// signature is computed and verified over.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = BallotInput {
            signature: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("ballot input is always serializable")
    }

    /// Canonical bytes with `election_pubkey` and `pub_keys` overridden to
    /// the predecessor's values before hashing, per the verifier's binding
    /// rule: a ballot's ring and election scope are fixed by the output it
    /// consumes, not by whatever the input claims.
    pub fn canonical_bytes_for(&self, election_pubkey: &[u8], pub_keys: &[Vec<u8>]) -> Vec<u8> {
        let overridden = BallotInput {
            election_pubkey: election_pubkey.to_vec(),
            pub_keys: pub_keys.to_vec(),
            ..self.clone()
        };
        overridden.canonical_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_excludes_signature() {
        let mut input = BallotInput {
            tx_id: TxId::ZERO,
            tx_out: TxId::ZERO,
            election_pubkey: b"e1".to_vec(),
            candidate: b"c0".to_vec(),
            pub_keys: vec![vec![1], vec![2]],
            signature: vec![9, 9, 9],
        };
        let before = input.canonical_bytes();
        input.signature = vec![1];
        assert_eq!(before, input.canonical_bytes());
    }

    #[test]
    fn override_rebinds_election_pubkey_and_ring() {
        let input = BallotInput {
            tx_id: TxId::ZERO,
            tx_out: TxId::ZERO,
            election_pubkey: b"stale".to_vec(),
            candidate: b"c0".to_vec(),
            pub_keys: vec![vec![9]],
            signature: vec![],
        };
        let authoritative_ring = vec![vec![1], vec![2], vec![3]];
        let overridden = input.canonical_bytes_for(b"fresh", &authoritative_ring);
        assert_ne!(overridden, input.canonical_bytes());
    }
}
