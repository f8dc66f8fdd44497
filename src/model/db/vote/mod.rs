mod base;
mod cast;
mod tally;

pub use base::{Ballot, Vote, VoteCore};
pub use tally::TallyMismatch;
