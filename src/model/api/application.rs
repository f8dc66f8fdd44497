use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::application::{ApplicationStatus, Decision},
    db::Application,
    mongodb::{serde_id_hex, Id},
};

/// A candidate's application to stand in an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub statement: String,
}

/// An admin's decision on an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub decision: Decision,
    #[serde(default)]
    pub notes: String,
}

/// An API-friendly candidacy application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDescription {
    #[serde(with = "serde_id_hex")]
    pub id: Id,
    #[serde(with = "serde_id_hex")]
    pub candidate_id: Id,
    #[serde(with = "serde_id_hex")]
    pub election_id: Id,
    pub statement: String,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    #[serde(with = "serde_id_hex::option")]
    pub reviewed_by: Option<Id>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<Application> for ApplicationDescription {
    fn from(application: Application) -> Self {
        let core = application.application;
        let (reviewed_by, reviewed_at, notes) = match core.review {
            Some(review) => (
                Some(review.reviewed_by),
                Some(review.reviewed_at),
                Some(review.notes),
            ),
            None => (None, None, None),
        };
        Self {
            id: application.id,
            candidate_id: core.candidate_id,
            election_id: core.election_id,
            statement: core.statement,
            applied_at: core.applied_at,
            status: core.status,
            reviewed_by,
            reviewed_at,
            notes,
        }
    }
}
