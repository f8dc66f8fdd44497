//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;

/// The server's message for a duplicate key error, if that is what this is.
///
/// Outside a transaction these arrive as write errors; inside one the server
/// may report them as a plain command error instead.
fn duplicate_key_message(err: &DbError) -> Option<&str> {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY => {
            Some(&e.message)
        }
        ErrorKind::Command(ref e) if e.code == DUPLICATE_KEY => Some(&e.message),
        _ => None,
    }
}

/// Return true if the given error is a duplicate key error on the named index.
pub fn is_duplicate_key_on(err: &DbError, index_name: &str) -> bool {
    duplicate_key_message(err)
        .map(|message| mentions_index(message, index_name))
        .unwrap_or(false)
}

/// Server messages look like
/// `E11000 duplicate key error collection: db.votes index: vote_transaction_hash dup key: {...}`.
fn mentions_index(message: &str, index_name: &str) -> bool {
    message
        .split_whitespace()
        .skip_while(|word| *word != "index:")
        .nth(1)
        .map(|name| name == index_name)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_name_is_matched_exactly() {
        let message = "E11000 duplicate key error collection: test.votes index: \
vote_election_voter dup key: { election_id: ObjectId('64b7f0c2a1b2c3d4e5f60718') }";
        assert!(mentions_index(message, "vote_election_voter"));
        assert!(!mentions_index(message, "vote_election"));
        assert!(!mentions_index(message, "vote_transaction_hash"));
        assert!(!mentions_index("something else entirely", "vote_election_voter"));
    }
}
