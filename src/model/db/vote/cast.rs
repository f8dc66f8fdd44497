use chrono::{DateTime, NaiveDateTime, Utc};
use mongodb::{bson::doc, Client, ClientSession, Database};

use crate::{
    error::{Error, Result},
    model::{
        db::{Candidate, Election},
        mongodb::{index, is_duplicate_key_on, now, transact, Coll, Id, Transaction},
    },
};

use super::{Ballot, Vote, VoteCore};

/// Longest accepted transaction hash: `0x` and 64 hex digits.
pub const MAX_TRANSACTION_HASH_LEN: usize = 66;

impl Vote {
    /// Cast a vote, if every precondition holds at the instant `at`.
    ///
    /// Preconditions are checked in order and the first failure is returned:
    /// the election, voter and recipient exist; the recipient is approved;
    /// the election is open for voting at `at`; the voter has not yet voted in
    /// this election; the transaction hash is unused.
    ///
    /// The vote, the recipient's tally and the voter's flag are written in a
    /// single transaction. The unique indexes on votes guarantee that two
    /// concurrent casts cannot both get past the last two checks.
    pub async fn cast(
        db_client: &Client,
        db: &Database,
        ballot: &Ballot,
        at: NaiveDateTime,
    ) -> Result<()> {
        if ballot.transaction_hash.trim().is_empty() {
            return Err(Error::BadRequest(
                "Transaction hash must not be empty".to_string(),
            ));
        }
        if ballot.transaction_hash.chars().count() > MAX_TRANSACTION_HASH_LEN {
            return Err(Error::BadRequest(format!(
                "Transaction hash must be at most {MAX_TRANSACTION_HASH_LEN} characters"
            )));
        }

        let body = CastVote {
            db,
            ballot,
            at,
            voted_at: now(),
        };
        match transact(db_client, &body).await {
            Ok(()) => {
                info!(
                    "Vote cast in election {} by {}",
                    ballot.election_id, ballot.voter_id
                );
                Ok(())
            }
            Err(err @ Error::Db(_)) => {
                error!(
                    "Vote in election {} by {} failed: {err}",
                    ballot.election_id, ballot.voter_id
                );
                Err(err)
            }
            Err(err) => {
                warn!(
                    "Vote in election {} by {} rejected: {err}",
                    ballot.election_id, ballot.voter_id
                );
                Err(err)
            }
        }
    }
}

struct CastVote<'a> {
    db: &'a Database,
    ballot: &'a Ballot,
    /// When the vote is cast, in the elections' local wall-clock.
    at: NaiveDateTime,
    voted_at: DateTime<Utc>,
}

impl<'a> CastVote<'a> {
    async fn candidate(
        &self,
        candidates: &Coll<Candidate>,
        id: Id,
        session: &mut ClientSession,
    ) -> Result<Candidate> {
        candidates
            .find_one_with_session(id.as_doc(), None, session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {id}")))
    }
}

#[rocket::async_trait]
impl<'a> Transaction for CastVote<'a> {
    type Output = ();

    async fn run(&self, session: &mut ClientSession) -> Result<()> {
        let ballot = self.ballot;

        let election = Coll::<Election>::from_db(self.db)
            .find_one_with_session(ballot.election_id.as_doc(), None, session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {}", ballot.election_id)))?;

        let candidates = Coll::<Candidate>::from_db(self.db);
        self.candidate(&candidates, ballot.voter_id, session).await?;
        let recipient = self
            .candidate(&candidates, ballot.candidate_id, session)
            .await?;
        if !recipient.is_approved {
            return Err(Error::UnapprovedRecipient);
        }

        if !election.is_open_for_voting(self.at) {
            return Err(Error::VotingClosed);
        }

        let votes = Coll::<Vote>::from_db(self.db);
        let previous = doc! {
            "election_id": ballot.election_id,
            "voter_id": ballot.voter_id,
        };
        if votes
            .find_one_with_session(previous, None, session)
            .await?
            .is_some()
        {
            return Err(Error::AlreadyVoted);
        }
        let replay = doc! {"transaction_hash": ballot.transaction_hash.as_str()};
        if votes
            .find_one_with_session(replay, None, session)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateTransactionHash);
        }

        let vote = Vote {
            id: Id::new(),
            vote: VoteCore {
                election_id: ballot.election_id,
                voter_id: ballot.voter_id,
                candidate_id: ballot.candidate_id,
                transaction_hash: ballot.transaction_hash.clone(),
                voted_at: self.voted_at,
            },
        };
        votes
            .insert_one_with_session(&vote, None, session)
            .await
            .map_err(|err| {
                if is_duplicate_key_on(&err, index::VOTE_ELECTION_VOTER) {
                    Error::AlreadyVoted
                } else if is_duplicate_key_on(&err, index::VOTE_TRANSACTION_HASH) {
                    Error::DuplicateTransactionHash
                } else {
                    Error::Db(err)
                }
            })?;

        // Server-side increment, so concurrent votes never lose an update.
        candidates
            .update_one_with_session(
                ballot.candidate_id.as_doc(),
                doc! {"$inc": {"vote_count": 1_i64}},
                None,
                session,
            )
            .await?;
        candidates
            .update_one_with_session(
                ballot.voter_id.as_doc(),
                doc! {"$set": {"has_voted": true}},
                None,
                session,
            )
            .await?;

        Ok(())
    }
}
