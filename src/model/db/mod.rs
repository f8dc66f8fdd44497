//! DB-compatible (e.g. de/serialisable) types, and the operations that act on them.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

mod admin_action;
pub use admin_action::{AdminAction, AdminActionCore};

mod application;
pub use application::{Application, ApplicationCore, Review};

mod candidate;
pub use candidate::{Candidate, CandidateCore};

mod election;
#[cfg(test)]
pub use election::at;
pub use election::{Election, ElectionCore, Participation};

mod vote;
pub use vote::{Ballot, TallyMismatch, Vote, VoteCore};
