//! Read-only aggregation over committed votes.

use std::collections::HashMap;

use mongodb::{
    bson::{doc, from_document, Document},
    error::Error as DbError,
    Client, ClientSession, Database,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::results::{rank, ResultEntry},
        db::{Candidate, Election},
        mongodb::{serde_id_hex, snapshot_session, Coll, Id},
    },
};

use super::Vote;

/// A candidate whose stored tally disagrees with the votes naming them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyMismatch {
    #[serde(with = "serde_id_hex")]
    pub candidate_id: Id,
    pub candidate_name: String,
    /// The denormalised `vote_count`.
    pub recorded: u64,
    /// The number of committed votes for the candidate.
    pub counted: u64,
}

impl Vote {
    /// The results of an election: every approved candidate, plus anyone who
    /// has received a vote in it, with their number of votes in this election.
    /// Ordered by descending votes, then by name.
    ///
    /// Everything is read from a single snapshot, so results are consistent
    /// even while votes are being cast.
    pub async fn results(
        db_client: &Client,
        db: &Database,
        election_id: Id,
    ) -> Result<Vec<ResultEntry>> {
        let mut session = snapshot_session(db_client).await?;

        Coll::<Election>::from_db(db)
            .find_one_with_session(election_id.as_doc(), None, &mut session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

        let counts = count_votes(db, doc! {"election_id": election_id}, &mut session).await?;

        let voted_for = counts.keys().copied().collect::<Vec<_>>();
        let filter = doc! {
            "$or": [
                {"is_approved": true},
                {"_id": {"$in": voted_for}},
            ]
        };
        let mut candidates = Coll::<Candidate>::from_db(db)
            .find_with_session(filter, None, &mut session)
            .await?;

        let mut entries = Vec::new();
        while let Some(candidate) = candidates.next(&mut session).await {
            let candidate = candidate?;
            entries.push(ResultEntry {
                candidate_id: candidate.id,
                votes: counts.get(&candidate.id).copied().unwrap_or(0),
                candidate_name: candidate.candidate.full_name,
            });
        }

        rank(&mut entries);
        Ok(entries)
    }

    /// Every candidate whose `vote_count` differs from the number of
    /// committed votes naming them, across all elections.
    pub async fn audit_tallies(db_client: &Client, db: &Database) -> Result<Vec<TallyMismatch>> {
        let mut session = snapshot_session(db_client).await?;
        let counts = count_votes(db, doc! {}, &mut session).await?;

        let mut candidates = Coll::<Candidate>::from_db(db)
            .find_with_session(None, None, &mut session)
            .await?;

        let mut mismatches = Vec::new();
        while let Some(candidate) = candidates.next(&mut session).await {
            let candidate = candidate?;
            let counted = counts.get(&candidate.id).copied().unwrap_or(0);
            if candidate.vote_count != counted {
                mismatches.push(TallyMismatch {
                    candidate_id: candidate.id,
                    recorded: candidate.vote_count,
                    counted,
                    candidate_name: candidate.candidate.full_name,
                });
            }
        }

        if !mismatches.is_empty() {
            warn!("{} candidate tally mismatch(es) found", mismatches.len());
        }
        Ok(mismatches)
    }
}

/// Per-recipient total of one `$group` stage.
#[derive(Deserialize)]
struct RecipientCount {
    #[serde(rename = "_id")]
    candidate_id: Id,
    votes: u64,
}

/// Number of votes per recipient among the votes matching `filter`, counted
/// by the server.
async fn count_votes(
    db: &Database,
    filter: Document,
    session: &mut ClientSession,
) -> Result<HashMap<Id, u64>> {
    let pipeline = [
        doc! {"$match": filter},
        doc! {"$group": {"_id": "$candidate_id", "votes": {"$sum": 1_i64}}},
    ];
    let mut groups = Coll::<Vote>::from_db(db)
        .aggregate_with_session(pipeline, None, &mut *session)
        .await?;

    let mut counts = HashMap::new();
    while let Some(group) = groups.next(&mut *session).await {
        let group = from_document::<RecipientCount>(group?).map_err(DbError::from)?;
        counts.insert(group.candidate_id, group.votes);
    }
    Ok(counts)
}
