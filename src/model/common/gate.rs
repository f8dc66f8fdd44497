use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An independently-controllable boolean phase flag on an election.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Whether the election is running at all.
    IsActive,
    /// Whether candidates may apply to stand.
    CandidacyRegistrationOpen,
    /// Whether votes are accepted, within the election's natural window.
    VotingOpen,
}

impl Gate {
    pub const ALL: [Gate; 3] = [
        Gate::IsActive,
        Gate::CandidacyRegistrationOpen,
        Gate::VotingOpen,
    ];

    /// The name of the election field this gate controls.
    pub fn field(&self) -> &'static str {
        match self {
            Gate::IsActive => "is_active",
            Gate::CandidacyRegistrationOpen => "candidacy_registration_open",
            Gate::VotingOpen => "voting_open",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for Gate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gate::ALL
            .into_iter()
            .find(|gate| gate.field() == s)
            .ok_or_else(|| Error::InvalidGateName(s.to_string()))
    }
}
