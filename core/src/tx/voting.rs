//! VOTING transaction: opens and closes the window during which ballots
//! may be cast for a given election.

use serde::{Deserialize, Serialize};

use super::TxId;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotingOutput {
    pub tx_id: TxId,
    pub election_pubkey: Vec<u8>,
    pub timestamp: i64,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl VotingOutput {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = VotingOutput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("voting output is always serializable")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotingInput {
    pub tx_id: TxId,
    pub tx_out: TxId,
    pub election_pubkey: Vec<u8>,
    pub timestamp: i64,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl VotingInput {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = VotingInput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("voting input is always serializable")
    }

    /// Canonical bytes with `election_pubkey` overridden to the
    /// predecessor's value before hashing, per the verifier's binding rule.
    pub fn canonical_bytes_for(&self, election_pubkey: &[u8]) -> Vec<u8> {
        let overridden = VotingInput {
            election_pubkey: election_pubkey.to_vec(),
            ..self.clone()
        };
        overridden.canonical_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_excludes_signatures() {
        let mut out = VotingOutput {
            tx_id: TxId::ZERO,
            election_pubkey: b"e1".to_vec(),
            timestamp: 1,
            signers: vec![vec![1]],
            sig_witnesses: vec![vec![2]],
        };
        let before = out.canonical_bytes();
        out.sig_witnesses.push(vec![9]);
        assert_eq!(before, out.canonical_bytes());
    }

    #[test]
    fn override_rebinds_election_pubkey() {
        let input = VotingInput {
            tx_id: TxId::ZERO,
            tx_out: TxId::ZERO,
            election_pubkey: b"stale".to_vec(),
            timestamp: 2,
            signers: vec![],
            sig_witnesses: vec![],
        };
        assert_ne!(
            input.canonical_bytes(),
            input.canonical_bytes_for(b"fresh")
        );
    }
}
