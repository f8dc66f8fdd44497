use serde::{Deserialize, Serialize};

use crate::model::{
    db::Ballot,
    mongodb::{serde_id_hex, Id},
};

/// A vote, as submitted by a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    /// The candidate being voted for.
    #[serde(with = "serde_id_hex")]
    pub candidate_id: Id,
    /// Anti-replay token from the external ledger.
    pub transaction_hash: String,
}

impl VoteRequest {
    pub fn into_ballot(self, election_id: Id, voter_id: Id) -> Ballot {
        Ballot {
            election_id,
            voter_id,
            candidate_id: self.candidate_id,
            transaction_hash: self.transaction_hash,
        }
    }
}
