use serde::{Deserialize, Serialize};

use crate::model::mongodb::{serde_id_hex, Id};

/// The new value of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateValue {
    pub value: bool,
}

/// Set one gate on several elections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchGateRequest {
    #[serde(with = "serde_id_hex::vec")]
    pub election_ids: Vec<Id>,
    pub value: bool,
}

/// Act on several elections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(with = "serde_id_hex::vec")]
    pub election_ids: Vec<Id>,
}

/// How many elections a batch operation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub affected: u64,
}
