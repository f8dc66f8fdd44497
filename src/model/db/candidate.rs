use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::candidate::CandidateRegistration,
        mongodb::{index, is_duplicate_key_on, now, Coll, Id},
    },
};

/// Core candidate data, as stored in the database.
///
/// Every registered user has a candidate profile; it is both the identity
/// that votes and, once approved, an option that can be voted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub full_name: String,
    pub age: u32,
    /// Unique across all candidates.
    pub email: String,
    pub phone: String,
    pub address: String,
    pub manifesto: String,
    /// Unique across all candidates that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Set when an admin approves one of this candidate's applications.
    pub is_approved: bool,
    /// Set when this candidate submits any application.
    pub applied_for_candidacy: bool,
    /// Number of committed votes naming this candidate as recipient.
    pub vote_count: u64,
    /// Set when this candidate casts a vote in any election.
    pub has_voted: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CandidateCore {
    /// Approved and actually applied, i.e. appears on ballots.
    pub fn is_standing(&self) -> bool {
        self.is_approved && self.applied_for_candidacy
    }
}

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

impl Candidate {
    /// Register a new candidate profile.
    pub async fn register(
        candidates: &Coll<Candidate>,
        registration: CandidateRegistration,
    ) -> Result<Candidate> {
        registration.validate()?;
        let candidate = Candidate {
            id: Id::new(),
            candidate: registration.into_candidate(now()),
        };

        candidates
            .insert_one(&candidate, None)
            .await
            .map_err(|err| {
                if is_duplicate_key_on(&err, index::CANDIDATE_EMAIL) {
                    Error::DuplicateCandidate(format!("email {}", candidate.email))
                } else if is_duplicate_key_on(&err, index::CANDIDATE_WALLET) {
                    Error::DuplicateCandidate(format!(
                        "wallet address {}",
                        candidate.wallet_address.as_deref().unwrap_or_default()
                    ))
                } else {
                    Error::Db(err)
                }
            })?;

        info!("Registered candidate {} ({})", candidate.id, candidate.full_name);
        Ok(candidate)
    }

    /// Look up a candidate by ID.
    pub async fn get(candidates: &Coll<Candidate>, id: Id) -> Result<Candidate> {
        candidates
            .find_one(id.as_doc(), None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {id}")))
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateCore {
        pub fn example(name: &str) -> Self {
            Self {
                full_name: name.to_string(),
                age: 30,
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                phone: "07700900000".to_string(),
                address: "1 High Street".to_string(),
                manifesto: format!("Vote {name}"),
                wallet_address: None,
                is_approved: false,
                applied_for_candidacy: false,
                vote_count: 0,
                has_voted: false,
                created_at: now(),
            }
        }
    }

    impl Candidate {
        pub fn example(name: &str) -> Self {
            Self {
                id: Id::new(),
                candidate: CandidateCore::example(name),
            }
        }

        pub fn approved_example(name: &str) -> Self {
            let mut candidate = Self::example(name);
            candidate.applied_for_candidacy = true;
            candidate.is_approved = true;
            candidate
        }
    }
}
