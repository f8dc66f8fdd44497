use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    db::AdminAction,
    mongodb::{serde_id_hex, Id},
};

/// An audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminActionDescription {
    #[serde(with = "serde_id_hex")]
    pub id: Id,
    #[serde(with = "serde_id_hex")]
    pub actor_id: Id,
    pub action: String,
    #[serde(with = "serde_id_hex::option")]
    pub election_id: Option<Id>,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl From<AdminAction> for AdminActionDescription {
    fn from(action: AdminAction) -> Self {
        Self {
            id: action.id,
            actor_id: action.action.actor_id,
            action: action.action.action,
            election_id: action.action.election_id,
            details: action.action.details,
            timestamp: action.action.timestamp,
        }
    }
}
