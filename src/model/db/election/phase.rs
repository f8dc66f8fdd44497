//! Creation of elections and control of their phase gates.

use mongodb::{bson::doc, Client, ClientSession, Database};
use rocket::futures::TryStreamExt;

use crate::{
    error::{Error, Result},
    model::{
        api::election::ElectionSpec,
        common::gate::Gate,
        db::{AdminAction, Vote},
        mongodb::{now, transact, Coll, Id, Transaction},
    },
};

use super::Election;

impl Election {
    /// Create a new election from the given spec, recording who created it.
    pub async fn create(
        db_client: &Client,
        db: &Database,
        actor: Id,
        spec: ElectionSpec,
    ) -> Result<Election> {
        spec.validate()?;
        let election = Election {
            id: Id::new(),
            election: spec.into_election(now()),
        };
        transact(db_client, &CreateElection { db, actor, election: &election }).await?;
        info!("Election {} ({}) created by {actor}", election.id, election.title);
        Ok(election)
    }

    /// Look up an election by ID.
    pub async fn get(elections: &Coll<Election>, id: Id) -> Result<Election> {
        elections
            .find_one(id.as_doc(), None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {id}")))
    }

    /// All elections whose `is_active` gate is set.
    pub async fn active(elections: &Coll<Election>) -> Result<Vec<Election>> {
        let filter = doc! {"is_active": true};
        Ok(elections.find(filter, None).await?.try_collect().await?)
    }

    /// Number of votes committed in this election.
    pub async fn total_votes(&self, votes: &Coll<Vote>) -> Result<u64> {
        let filter = doc! {"election_id": self.id};
        Ok(votes.count_documents(filter, None).await?)
    }

    /// Set the named gate of an election to the given value.
    ///
    /// The gate name must be one of `is_active`, `candidacy_registration_open`
    /// or `voting_open`.
    pub async fn toggle_gate(
        db_client: &Client,
        db: &Database,
        actor: Id,
        election_id: Id,
        gate: &str,
        value: bool,
    ) -> Result<()> {
        let gate = gate.parse::<Gate>()?;
        Self::set_gate(db_client, db, actor, election_id, gate, value).await
    }

    /// Set a gate of an election to the given value and log it.
    pub async fn set_gate(
        db_client: &Client,
        db: &Database,
        actor: Id,
        election_id: Id,
        gate: Gate,
        value: bool,
    ) -> Result<()> {
        let body = SetGate {
            db,
            actor,
            election_id,
            gate,
            value,
        };
        match transact(db_client, &body).await {
            Ok(()) => {
                info!("Election {election_id}: {gate} set to {value} by {actor}");
                Ok(())
            }
            Err(err) => {
                warn!("Election {election_id}: failed to set {gate} to {value}: {err}");
                Err(err)
            }
        }
    }

    /// Close an election for good: clears `is_active` and `voting_open` together.
    ///
    /// There is no inverse; the gates can only be reopened individually.
    pub async fn force_end(
        db_client: &Client,
        db: &Database,
        actor: Id,
        election_id: Id,
    ) -> Result<()> {
        match transact(db_client, &ForceEnd { db, actor, election_id }).await {
            Ok(()) => {
                warn!("Election {election_id} force-ended by {actor}");
                Ok(())
            }
            Err(err) => {
                warn!("Election {election_id}: failed to force-end: {err}");
                Err(err)
            }
        }
    }

    /// Set a gate on each of the given elections, returning how many were
    /// updated. Each election is its own transaction with its own audit entry.
    /// Unknown elections are skipped; any other failure stops the batch.
    pub async fn toggle_gate_batch(
        db_client: &Client,
        db: &Database,
        actor: Id,
        election_ids: &[Id],
        gate: &str,
        value: bool,
    ) -> Result<u64> {
        let gate = gate.parse::<Gate>()?;
        let mut affected = 0;
        for &election_id in election_ids {
            let result = Self::set_gate(db_client, db, actor, election_id, gate, value).await;
            affected += count_affected(result)?;
        }
        info!("Batch {gate} -> {value} by {actor}: {affected} election(s) updated");
        Ok(affected)
    }

    /// Force-end each of the given elections, with the same per-election
    /// semantics as [`Election::toggle_gate_batch`].
    pub async fn force_end_batch(
        db_client: &Client,
        db: &Database,
        actor: Id,
        election_ids: &[Id],
    ) -> Result<u64> {
        let mut affected = 0;
        for &election_id in election_ids {
            let result = Self::force_end(db_client, db, actor, election_id).await;
            affected += count_affected(result)?;
        }
        warn!("{affected} election(s) force-ended by {actor}");
        Ok(affected)
    }
}

/// One item of a batch: missing elections count as nothing done.
fn count_affected(result: Result<()>) -> Result<u64> {
    match result {
        Ok(()) => Ok(1),
        Err(Error::NotFound(what)) => {
            warn!("Skipping batch item: {what} does not exist");
            Ok(0)
        }
        Err(err) => Err(err),
    }
}

struct CreateElection<'a> {
    db: &'a Database,
    actor: Id,
    election: &'a Election,
}

#[rocket::async_trait]
impl<'a> Transaction for CreateElection<'a> {
    type Output = ();

    async fn run(&self, session: &mut ClientSession) -> Result<()> {
        Coll::<Election>::from_db(self.db)
            .insert_one_with_session(self.election, None, session)
            .await?;
        AdminAction::record(
            session,
            self.db,
            self.actor,
            "Create election",
            Some(self.election.id),
            &self.election.title,
        )
        .await
    }
}

struct SetGate<'a> {
    db: &'a Database,
    actor: Id,
    election_id: Id,
    gate: Gate,
    value: bool,
}

#[rocket::async_trait]
impl<'a> Transaction for SetGate<'a> {
    type Output = ();

    async fn run(&self, session: &mut ClientSession) -> Result<()> {
        let field = self.gate.field();
        let update = doc! {
            "$set": { field: self.value }
        };
        let result = Coll::<Election>::from_db(self.db)
            .update_one_with_session(self.election_id.as_doc(), update, None, session)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Election {}", self.election_id)));
        }

        AdminAction::record(
            session,
            self.db,
            self.actor,
            format!("Toggle {}", self.gate),
            Some(self.election_id),
            format!("{} -> {}", self.gate, self.value),
        )
        .await
    }
}

struct ForceEnd<'a> {
    db: &'a Database,
    actor: Id,
    election_id: Id,
}

#[rocket::async_trait]
impl<'a> Transaction for ForceEnd<'a> {
    type Output = ();

    async fn run(&self, session: &mut ClientSession) -> Result<()> {
        // Both gates in one document update, so neither is ever cleared alone.
        let update = doc! {
            "$set": {
                "is_active": false,
                "voting_open": false,
            }
        };
        let result = Coll::<Election>::from_db(self.db)
            .update_one_with_session(self.election_id.as_doc(), update, None, session)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Election {}", self.election_id)));
        }

        AdminAction::record(
            session,
            self.db,
            self.actor,
            "Force-end election",
            Some(self.election_id),
            "is_active -> false, voting_open -> false",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mongodb::Client as DbClient;

    use crate::model::db::AdminAction;

    async fn insert(elections: &Coll<Election>, election: &Election) {
        elections.insert_one(election, None).await.unwrap();
    }

    async fn log_for(db: &Database, election_id: Id) -> Vec<AdminAction> {
        AdminAction::for_election(&Coll::from_db(db), election_id)
            .await
            .unwrap()
    }

    #[backend_test]
    async fn create_logs_the_creation(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
    ) {
        let admin = Id::new();
        let created = Election::create(&db_client, &db, admin, ElectionSpec::example())
            .await
            .unwrap();

        let stored = Election::get(&elections, created.id).await.unwrap();
        assert_eq!(stored, created);
        assert!(stored.is_active);
        assert!(stored.candidacy_registration_open);
        assert!(stored.voting_open);

        let log = log_for(&db, created.id).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action.action, "Create election");
        assert_eq!(log[0].actor_id, admin);
    }

    #[backend_test]
    async fn invalid_spec_creates_nothing(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
    ) {
        let mut spec = ElectionSpec::example();
        std::mem::swap(&mut spec.start_date, &mut spec.end_date);
        let result = Election::create(&db_client, &db, Id::new(), spec).await;
        assert!(matches!(result, Err(Error::BadRequest(_))));
        assert_eq!(elections.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test]
    async fn toggle_each_gate(db_client: DbClient, db: Database, elections: Coll<Election>) {
        let election = Election::example();
        insert(&elections, &election).await;
        let admin = Id::new();

        for gate in Gate::ALL {
            Election::toggle_gate(&db_client, &db, admin, election.id, gate.field(), false)
                .await
                .unwrap();
            let stored = Election::get(&elections, election.id).await.unwrap();
            assert!(!stored.gate(gate));
        }
        // Every gate is now closed, and nothing else changed.
        let stored = Election::get(&elections, election.id).await.unwrap();
        assert_eq!(stored.title, election.title);
        assert_eq!(stored.start_date, election.start_date);

        let log = log_for(&db, election.id).await;
        let actions = log.iter().map(|a| a.action.action.as_str()).collect::<Vec<_>>();
        assert_eq!(
            actions,
            vec![
                "Toggle is_active",
                "Toggle candidacy_registration_open",
                "Toggle voting_open",
            ]
        );
        assert_eq!(log[2].details, "voting_open -> false");
    }

    #[backend_test]
    async fn unknown_gate_is_rejected(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
    ) {
        let election = Election::example();
        insert(&elections, &election).await;

        let result =
            Election::toggle_gate(&db_client, &db, Id::new(), election.id, "title", false).await;
        assert!(matches!(result, Err(Error::InvalidGateName(name)) if name == "title"));

        let stored = Election::get(&elections, election.id).await.unwrap();
        assert_eq!(stored, election);
        assert!(log_for(&db, election.id).await.is_empty());
    }

    #[backend_test]
    async fn toggle_missing_election(db_client: DbClient, db: Database) {
        let missing = Id::new();
        let result =
            Election::toggle_gate(&db_client, &db, Id::new(), missing, "voting_open", true).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        // The aborted transaction left no audit entry behind.
        assert!(log_for(&db, missing).await.is_empty());
    }

    #[backend_test]
    async fn force_end_clears_both_gates(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
    ) {
        let election = Election::example();
        insert(&elections, &election).await;

        Election::force_end(&db_client, &db, Id::new(), election.id)
            .await
            .unwrap();

        let stored = Election::get(&elections, election.id).await.unwrap();
        assert!(!stored.is_active);
        assert!(!stored.voting_open);
        assert!(stored.candidacy_registration_open);

        let log = log_for(&db, election.id).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action.action, "Force-end election");

        // Reopening goes through the individual gates.
        Election::toggle_gate(&db_client, &db, Id::new(), election.id, "voting_open", true)
            .await
            .unwrap();
        let stored = Election::get(&elections, election.id).await.unwrap();
        assert!(!stored.is_active);
        assert!(stored.voting_open);
    }

    #[backend_test]
    async fn force_end_missing_election(db_client: DbClient, db: Database) {
        let result = Election::force_end(&db_client, &db, Id::new(), Id::new()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[backend_test]
    async fn batches_skip_missing_elections(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
    ) {
        let first = Election::example();
        let second = Election::example();
        insert(&elections, &first).await;
        insert(&elections, &second).await;
        let ids = [first.id, Id::new(), second.id];

        let affected = Election::toggle_gate_batch(
            &db_client,
            &db,
            Id::new(),
            &ids,
            "candidacy_registration_open",
            false,
        )
        .await
        .unwrap();
        assert_eq!(affected, 2);
        for id in [first.id, second.id] {
            let stored = Election::get(&elections, id).await.unwrap();
            assert!(!stored.candidacy_registration_open);
            assert_eq!(log_for(&db, id).await.len(), 1);
        }

        let affected = Election::force_end_batch(&db_client, &db, Id::new(), &ids)
            .await
            .unwrap();
        assert_eq!(affected, 2);
        assert!(Election::active(&elections).await.unwrap().is_empty());
    }

    #[backend_test]
    async fn batch_with_unknown_gate_does_nothing(
        db_client: DbClient,
        db: Database,
        elections: Coll<Election>,
    ) {
        let election = Election::example();
        insert(&elections, &election).await;

        let result =
            Election::toggle_gate_batch(&db_client, &db, Id::new(), &[election.id], "bogus", true)
                .await;
        assert!(matches!(result, Err(Error::InvalidGateName(_))));
        assert!(log_for(&db, election.id).await.is_empty());
    }

    #[backend_test]
    async fn active_elections(elections: Coll<Election>) {
        let active = Election::example();
        let mut inactive = Election::example();
        inactive.is_active = false;
        insert(&elections, &active).await;
        insert(&elections, &inactive).await;

        let found = Election::active(&elections).await.unwrap();
        assert_eq!(found, vec![active]);
    }
}
