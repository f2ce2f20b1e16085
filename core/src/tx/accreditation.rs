//! ACCREDITATION transaction: opens and closes the voter-accreditation
//! phase of a given election.

use serde::{Deserialize, Serialize};

use super::TxId;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccreditationOutput {
    pub tx_id: TxId,
    pub election_pubkey: Vec<u8>,
    pub timestamp: i64,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl AccreditationOutput {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = AccreditationOutput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("accreditation output is always serializable")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccreditationInput {
    pub tx_id: TxId,
    pub tx_out: TxId,
    pub election_pubkey: Vec<u8>,
    pub accredited_count: i64,
    pub timestamp: i64,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl AccreditationInput {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = AccreditationInput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("accreditation input is always serializable")
    }

    /// Canonical bytes with `election_pubkey` overridden to the
    /// predecessor's value before hashing, per the verifier's binding rule.
    pub fn canonical_bytes_for(&self, election_pubkey: &[u8]) -> Vec<u8> {
        let overridden = AccreditationInput {
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
    fn override_changes_only_the_election_pubkey_field() {
        let input = AccreditationInput {
            tx_id: TxId::ZERO,
            tx_out: TxId::ZERO,
            election_pubkey: b"stale".to_vec(),
            accredited_count: 3,
            timestamp: 42,
            signers: vec![vec![1]],
            sig_witnesses: vec![vec![2]],
        };
        let overridden = input.canonical_bytes_for(b"authoritative");
        let mut expected = input.clone();
        expected.election_pubkey = b"authoritative".to_vec();
        assert_eq!(overridden, expected.canonical_bytes());
        assert_ne!(overridden, input.canonical_bytes());
    }
}
