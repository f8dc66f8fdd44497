use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in a core operation.
///
/// Each failed precondition has its own variant so that callers can explain
/// exactly what happened; only storage failures are opaque.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Voter has already voted in this election")]
    AlreadyVoted,
    #[error("Transaction hash has already been used by another vote")]
    DuplicateTransactionHash,
    #[error("Voting is not open for this election at this time")]
    VotingClosed,
    #[error("Candidate is not approved to receive votes")]
    UnapprovedRecipient,
    #[error("Candidate has already applied for this election")]
    DuplicateApplication,
    #[error("Candidacy registration is closed for this election")]
    RegistrationClosed,
    #[error("Application has already been reviewed")]
    AlreadyReviewed,
    #[error("Unknown election gate: {0}")]
    InvalidGateName(String),
    #[error("Candidate already registered: {0}")]
    DuplicateCandidate(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// A stable, machine-readable name for this kind of error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyVoted => "already_voted",
            Self::DuplicateTransactionHash => "duplicate_transaction_hash",
            Self::VotingClosed => "voting_closed",
            Self::UnapprovedRecipient => "unapproved_recipient",
            Self::DuplicateApplication => "duplicate_application",
            Self::RegistrationClosed => "registration_closed",
            Self::AlreadyReviewed => "already_reviewed",
            Self::InvalidGateName(_) => "invalid_gate_name",
            Self::DuplicateCandidate(_) => "duplicate_candidate",
            Self::BadRequest(_) => "bad_request",
            Self::Db(_) => "storage_error",
        }
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::AlreadyVoted
            | Self::DuplicateTransactionHash
            | Self::DuplicateApplication
            | Self::AlreadyReviewed
            | Self::DuplicateCandidate(_) => Status::Conflict,
            Self::VotingClosed | Self::RegistrationClosed => Status::Forbidden,
            Self::UnapprovedRecipient | Self::InvalidGateName(_) => Status::UnprocessableEntity,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Db(_) => Status::InternalServerError,
        }
    }
}

/// The JSON body sent alongside an error status.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let message = match self {
            Self::Db(ref err) => {
                error!("Storage failure: {err}");
                "Internal storage error".to_string()
            }
            ref other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_precondition_has_its_own_kind() {
        let errors = [
            Error::not_found("Election"),
            Error::AlreadyVoted,
            Error::DuplicateTransactionHash,
            Error::VotingClosed,
            Error::UnapprovedRecipient,
            Error::DuplicateApplication,
            Error::RegistrationClosed,
            Error::AlreadyReviewed,
            Error::InvalidGateName("foo".to_string()),
            Error::DuplicateCandidate("email".to_string()),
            Error::BadRequest("bar".to_string()),
        ];
        let mut kinds = errors.iter().map(Error::kind).collect::<Vec<_>>();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn statuses() {
        assert_eq!(Error::not_found("x").status(), Status::NotFound);
        assert_eq!(Error::AlreadyVoted.status(), Status::Conflict);
        assert_eq!(Error::DuplicateTransactionHash.status(), Status::Conflict);
        assert_eq!(Error::AlreadyReviewed.status(), Status::Conflict);
        assert_eq!(Error::VotingClosed.status(), Status::Forbidden);
        assert_eq!(Error::RegistrationClosed.status(), Status::Forbidden);
        assert_eq!(
            Error::InvalidGateName("x".to_string()).status(),
            Status::UnprocessableEntity
        );
        assert_eq!(Error::UnapprovedRecipient.status(), Status::UnprocessableEntity);
    }

    #[test]
    fn domain_errors_are_not_retried() {
        assert!(!Error::AlreadyVoted.is_transient());
        assert!(!Error::DuplicateTransactionHash.is_transient());
        assert!(!Error::AlreadyReviewed.is_transient());
    }
}
