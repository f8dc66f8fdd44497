//! What a single candidate has done in a single election.

use mongodb::{bson::doc, Client, Database};

use crate::{
    error::{Error, Result},
    model::{
        db::{Application, Vote},
        mongodb::{snapshot_session, Coll, Id},
    },
};

use super::Election;

/// One candidate's standing in one election, read from the votes and
/// applications of that election rather than the candidate-global flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participation {
    pub has_voted: bool,
    pub application: Option<Application>,
}

impl Election {
    /// Has `candidate_id` voted in this election, and have they applied to
    /// stand in it?
    pub async fn participation(
        db_client: &Client,
        db: &Database,
        election_id: Id,
        candidate_id: Id,
    ) -> Result<Participation> {
        let mut session = snapshot_session(db_client).await?;

        Coll::<Election>::from_db(db)
            .find_one_with_session(election_id.as_doc(), None, &mut session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

        let filter = doc! {"election_id": election_id, "voter_id": candidate_id};
        let has_voted = Coll::<Vote>::from_db(db)
            .find_one_with_session(filter, None, &mut session)
            .await?
            .is_some();

        let filter = doc! {"election_id": election_id, "candidate_id": candidate_id};
        let application = Coll::<Application>::from_db(db)
            .find_one_with_session(filter, None, &mut session)
            .await?;

        Ok(Participation {
            has_voted,
            application,
        })
    }
}

#[cfg(test)]
mod tests {
    use mongodb::Client as DbClient;

    use super::*;
    use crate::model::{
        common::application::ApplicationStatus,
        db::{at, Ballot, Candidate},
    };

    #[backend_test]
    async fn participation_is_per_election(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
        candidates: Coll<Candidate>,
    ) {
        let first = Election::example();
        let second = Election::example();
        elections.insert_many([&first, &second], None).await.unwrap();
        let alice = Candidate::approved_example("Alice");
        let victor = Candidate::example("Victor");
        candidates.insert_many([&alice, &victor], None).await.unwrap();

        let nothing_yet = Election::participation(&db_client, &db, first.id, victor.id)
            .await
            .unwrap();
        assert_eq!(
            nothing_yet,
            Participation {
                has_voted: false,
                application: None
            }
        );

        let ballot = Ballot {
            election_id: first.id,
            voter_id: victor.id,
            candidate_id: alice.id,
            transaction_hash: "0x01".to_string(),
        };
        Vote::cast(&db_client, &db, &ballot, at(12, 0, 0)).await.unwrap();
        Application::submit(&db_client, &db, victor.id, second.id, "Me".to_string())
            .await
            .unwrap();

        let in_first = Election::participation(&db_client, &db, first.id, victor.id)
            .await
            .unwrap();
        assert!(in_first.has_voted);
        assert!(in_first.application.is_none());

        // The global `has_voted` flag is now set, but Victor has not voted here.
        let in_second = Election::participation(&db_client, &db, second.id, victor.id)
            .await
            .unwrap();
        assert!(!in_second.has_voted);
        assert_eq!(
            in_second.application.map(|application| application.status),
            Some(ApplicationStatus::Pending)
        );
    }

    #[backend_test]
    async fn participation_in_missing_election(db_client: DbClient, db: Database) {
        let result = Election::participation(&db_client, &db, Id::new(), Id::new()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
