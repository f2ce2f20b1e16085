//! ELECTION transaction: opens with the consensus group's description of
//! the election, closes when the same consensus group signs it shut.

use serde::{Deserialize, Serialize};

use super::TxId;

/// Opens an election: names it, lists its candidates, and is multisigned
/// by the administrative consensus group that will be authorised to close
/// every later phase of this election. `election_pubkey` is the group's
/// public identity and the value every later transaction in this election
/// is scoped to.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElectionOutput {
    pub election_pubkey: Vec<u8>,
    pub title: String,
    pub description: String,
    pub total_people: i64,
    pub candidates: Vec<Vec<u8>>,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl ElectionOutput {
    /// The trimmed copy used as the multisig's signing/verification
    /// message: signers and witnesses cleared.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = ElectionOutput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("election output is always serializable")
    }
}

/// Closes an election, consuming its OUTPUT. Must be multisigned by the
/// same consensus group that opened it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElectionInput {
    pub tx_out: TxId,
    pub election_pubkey: Vec<u8>,
    pub signers: Vec<Vec<u8>>,
    pub sig_witnesses: Vec<Vec<u8>>,
}

impl ElectionInput {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let trimmed = ElectionInput {
            signers: Vec::new(),
            sig_witnesses: Vec::new(),
            ..self.clone()
        };
        bincode::serialize(&trimmed).expect("election input is always serializable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_excludes_signatures() {
        let mut out = ElectionOutput {
            election_pubkey: b"e1".to_vec(),
            title: "Pres".into(),
            description: "President".into(),
            total_people: 100,
            candidates: vec![vec![1]],
            signers: vec![vec![9]],
            sig_witnesses: vec![vec![8]],
        };
        let with_sigs = out.canonical_bytes();
        out.signers.push(vec![7]);
        let with_more_sigs = out.canonical_bytes();
        assert_eq!(with_sigs, with_more_sigs);
    }
}
