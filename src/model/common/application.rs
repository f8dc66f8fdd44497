use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// Where a candidacy application is in its review.
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<ApplicationStatus> for Bson {
    fn from(status: ApplicationStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// An admin's verdict on a pending application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The status an application ends up in after this decision.
    pub fn outcome(&self) -> ApplicationStatus {
        match self {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }

    /// The audit log label for this decision.
    pub fn action_label(&self) -> &'static str {
        match self {
            Decision::Approve => "Approve candidacy",
            Decision::Reject => "Reject candidacy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_stored_lowercase() {
        assert_eq!(Bson::from(ApplicationStatus::Pending), Bson::String("pending".into()));
        assert_eq!(Bson::from(ApplicationStatus::Approved), Bson::String("approved".into()));
        assert_eq!(Bson::from(ApplicationStatus::Rejected), Bson::String("rejected".into()));
    }

    #[test]
    fn decisions_never_leave_an_application_pending() {
        assert_eq!(Decision::Approve.outcome(), ApplicationStatus::Approved);
        assert_eq!(Decision::Reject.outcome(), ApplicationStatus::Rejected);
    }
}
