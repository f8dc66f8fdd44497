use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        db::{Candidate, CandidateCore},
        mongodb::{serde_id_hex, Id},
    },
};

/// Wallet addresses are 0x-prefixed 20-byte hex strings at most.
pub const MAX_ADDRESS_LEN: usize = 42;

/// Minimum age to register.
pub const MIN_AGE: u32 = 18;

/// A new candidate profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRegistration {
    pub full_name: String,
    pub age: u32,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub manifesto: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

impl CandidateRegistration {
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(Error::BadRequest("Name must not be empty".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(Error::BadRequest("Email must not be empty".to_string()));
        }
        if self.age < MIN_AGE {
            return Err(Error::BadRequest(format!(
                "Candidates must be at least {MIN_AGE} years old"
            )));
        }
        if let Some(wallet) = &self.wallet_address {
            if wallet.len() > MAX_ADDRESS_LEN {
                return Err(Error::BadRequest(format!(
                    "Wallet address must be at most {MAX_ADDRESS_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// A fresh profile with every flag cleared.
    pub fn into_candidate(self, created_at: DateTime<Utc>) -> CandidateCore {
        CandidateCore {
            full_name: self.full_name.trim().to_string(),
            age: self.age,
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            address: self.address,
            manifesto: self.manifesto,
            wallet_address: self.wallet_address.filter(|wallet| !wallet.is_empty()),
            is_approved: false,
            applied_for_candidacy: false,
            vote_count: 0,
            has_voted: false,
            created_at,
        }
    }
}

/// A candidate's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    #[serde(with = "serde_id_hex")]
    pub id: Id,
    pub full_name: String,
    pub age: u32,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub manifesto: String,
    pub wallet_address: Option<String>,
    pub is_approved: bool,
    pub applied_for_candidacy: bool,
    pub vote_count: u64,
    pub has_voted: bool,
    /// Approved and applied, i.e. on the ballot.
    pub standing: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        let standing = candidate.is_standing();
        let core = candidate.candidate;
        Self {
            id: candidate.id,
            full_name: core.full_name,
            age: core.age,
            email: core.email,
            phone: core.phone,
            address: core.address,
            manifesto: core.manifesto,
            wallet_address: core.wallet_address,
            is_approved: core.is_approved,
            applied_for_candidacy: core.applied_for_candidacy,
            vote_count: core.vote_count,
            has_voted: core.has_voted,
            standing,
            created_at: core.created_at,
        }
    }
}
