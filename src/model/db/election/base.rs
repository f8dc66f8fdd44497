use std::ops::{Deref, DerefMut};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    pub title: String,
    pub description: String,
    /// First day on which votes may be cast.
    pub start_date: NaiveDate,
    /// Last day on which votes may be cast.
    pub end_date: NaiveDate,
    /// Daily opening time for voting.
    pub voting_start_time: NaiveTime,
    /// Daily closing time for voting.
    pub voting_end_time: NaiveTime,
    pub is_active: bool,
    pub candidacy_registration_open: bool,
    pub voting_open: bool,
    /// Opaque address of an external ballot contract, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ElectionCore {
    /// Is `now` inside both the date window and the daily time window?
    /// Both bounds of both windows are inclusive.
    pub fn is_voting_time(&self, now: NaiveDateTime) -> bool {
        let today = now.date();
        let time = now.time();
        (self.start_date..=self.end_date).contains(&today)
            && (self.voting_start_time..=self.voting_end_time).contains(&time)
    }

    /// Votes are accepted only inside the natural window, and only while the
    /// voting gate is open. The gate can close voting early but cannot open
    /// it outside the window.
    pub fn is_open_for_voting(&self, now: NaiveDateTime) -> bool {
        self.voting_open && self.is_voting_time(now)
    }
}

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use crate::model::{common::gate::Gate, mongodb::now};

    impl ElectionCore {
        /// Current value of the given gate.
        pub fn gate(&self, gate: Gate) -> bool {
            match gate {
                Gate::IsActive => self.is_active,
                Gate::CandidacyRegistrationOpen => self.candidacy_registration_open,
                Gate::VotingOpen => self.voting_open,
            }
        }

        /// Open 09:00 to 17:00 every day of the given range, all gates open.
        pub fn example(start_date: NaiveDate, end_date: NaiveDate) -> Self {
            Self {
                title: "Student Council 2026".to_string(),
                description: "Annual student council election".to_string(),
                start_date,
                end_date,
                voting_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                voting_end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                is_active: true,
                candidacy_registration_open: true,
                voting_open: true,
                contract_address: None,
                created_at: now(),
            }
        }
    }

    impl Election {
        /// A single-day election on 2026-03-10.
        pub fn example() -> Self {
            let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
            Self {
                id: Id::new(),
                election: ElectionCore::example(day, day),
            }
        }

        /// An election whose windows cover the whole of today and tomorrow,
        /// for tests that go through the real clock.
        pub fn current_example() -> Self {
            let today = Utc::now().date_naive();
            let mut election = ElectionCore::example(
                today.pred_opt().unwrap(),
                today.succ_opt().unwrap(),
            );
            election.voting_start_time = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
            election.voting_end_time =
                NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap();
            Self {
                id: Id::new(),
                election,
            }
        }
    }

    /// The example election's day at the given time.
    pub fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(hour, min, sec)
            .unwrap()
    }
}

#[cfg(test)]
pub use examples::at;
