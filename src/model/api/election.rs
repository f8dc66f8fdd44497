use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::candidate::MAX_ADDRESS_LEN,
        common::application::ApplicationStatus,
        db::{Election, ElectionCore, Participation},
        mongodb::{serde_id_hex, Id},
    },
};

fn default_voting_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time")
}

fn default_voting_end_time() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).expect("17:00 is a valid time")
}

/// An election specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// First day of voting.
    pub start_date: NaiveDate,
    /// Last day of voting.
    pub end_date: NaiveDate,
    /// Daily opening time, 09:00 unless given.
    #[serde(default = "default_voting_start_time")]
    pub voting_start_time: NaiveTime,
    /// Daily closing time, 17:00 unless given.
    #[serde(default = "default_voting_end_time")]
    pub voting_end_time: NaiveTime,
    #[serde(default)]
    pub contract_address: Option<String>,
}

impl ElectionSpec {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::BadRequest("Title must not be empty".to_string()));
        }
        if self.start_date > self.end_date {
            return Err(Error::BadRequest(
                "Start date must not be after end date".to_string(),
            ));
        }
        if self.voting_start_time > self.voting_end_time {
            return Err(Error::BadRequest(
                "Voting start time must not be after voting end time".to_string(),
            ));
        }
        if let Some(address) = &self.contract_address {
            if address.len() > MAX_ADDRESS_LEN {
                return Err(Error::BadRequest(format!(
                    "Contract address must be at most {MAX_ADDRESS_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// Convert this spec into an election with every gate open.
    pub fn into_election(self, created_at: DateTime<Utc>) -> ElectionCore {
        ElectionCore {
            title: self.title.trim().to_string(),
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            voting_start_time: self.voting_start_time,
            voting_end_time: self.voting_end_time,
            is_active: true,
            candidacy_registration_open: true,
            voting_open: true,
            contract_address: self.contract_address.filter(|address| !address.is_empty()),
            created_at,
        }
    }
}

/// An API-friendly election description, including whether votes are
/// currently accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    #[serde(with = "serde_id_hex")]
    pub id: Id,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub voting_start_time: NaiveTime,
    pub voting_end_time: NaiveTime,
    pub is_active: bool,
    pub candidacy_registration_open: bool,
    pub voting_open: bool,
    pub contract_address: Option<String>,
    /// Whether a vote cast now would pass the window and gate checks.
    pub open_for_voting: bool,
    /// Number of committed votes.
    pub total_votes: u64,
    pub created_at: DateTime<Utc>,
}

impl ElectionDescription {
    /// Describe an election as seen at the given wall-clock instant.
    pub fn new(election: Election, now: NaiveDateTime, total_votes: u64) -> Self {
        let open_for_voting = election.is_open_for_voting(now);
        let core = election.election;
        Self {
            id: election.id,
            title: core.title,
            description: core.description,
            start_date: core.start_date,
            end_date: core.end_date,
            voting_start_time: core.voting_start_time,
            voting_end_time: core.voting_end_time,
            is_active: core.is_active,
            candidacy_registration_open: core.candidacy_registration_open,
            voting_open: core.voting_open,
            contract_address: core.contract_address,
            open_for_voting,
            total_votes,
            created_at: core.created_at,
        }
    }
}

/// What the caller has done in an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationDescription {
    /// Whether the caller has cast a vote in this election.
    pub has_voted: bool,
    #[serde(with = "serde_id_hex::option")]
    pub application_id: Option<Id>,
    pub application_status: Option<ApplicationStatus>,
}

impl From<Participation> for ParticipationDescription {
    fn from(participation: Participation) -> Self {
        Self {
            has_voted: participation.has_voted,
            application_id: participation.application.as_ref().map(|a| a.id),
            application_status: participation.application.map(|a| a.status),
        }
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;
    use crate::model::db::at;

    #[test]
    fn times_default_to_office_hours() {
        let spec: ElectionSpec = serde_json::from_value(serde_json::json!({
            "title": "Board",
            "start_date": "2026-03-10",
            "end_date": "2026-03-12",
        }))
        .unwrap();
        assert_eq!(spec.voting_start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(spec.voting_end_time, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(spec.description, "");
        spec.validate().unwrap();
    }

    #[test]
    fn windows_must_not_be_inverted() {
        let mut dates = ElectionSpec::example();
        dates.start_date = dates.end_date.succ_opt().unwrap();
        assert!(matches!(dates.validate(), Err(Error::BadRequest(_))));

        let mut times = ElectionSpec::example();
        std::mem::swap(&mut times.voting_start_time, &mut times.voting_end_time);
        assert!(matches!(times.validate(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn other_invalid_specs() {
        let mut untitled = ElectionSpec::example();
        untitled.title = " ".to_string();
        assert!(matches!(untitled.validate(), Err(Error::BadRequest(_))));

        let mut long_address = ElectionSpec::example();
        long_address.contract_address = Some("0".repeat(MAX_ADDRESS_LEN + 1));
        assert!(matches!(long_address.validate(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn new_elections_are_fully_open() {
        let election = ElectionSpec::example().into_election(Utc::now());
        assert!(election.is_active);
        assert!(election.candidacy_registration_open);
        assert!(election.voting_open);
    }

    #[test]
    fn description_reports_open_for_voting() {
        let election = Election::example();
        let open = ElectionDescription::new(election.clone(), at(12, 0, 0), 3);
        assert!(open.open_for_voting);
        assert_eq!(open.total_votes, 3);
        assert_eq!(open.id, election.id);

        let closed = ElectionDescription::new(election, at(18, 0, 0), 3);
        assert!(!closed.open_for_voting);
    }
}
