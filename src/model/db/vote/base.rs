use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core vote data, as stored in the database. Votes are never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    pub election_id: Id,
    /// The candidate who cast this vote.
    pub voter_id: Id,
    /// The candidate this vote is for.
    pub candidate_id: Id,
    /// Externally supplied, unique across all votes.
    pub transaction_hash: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub voted_at: DateTime<Utc>,
}

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

/// A request to cast a vote, before any of its preconditions are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub election_id: Id,
    pub voter_id: Id,
    pub candidate_id: Id,
    pub transaction_hash: String,
}
