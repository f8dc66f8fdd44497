//! Submission and review of candidacy applications.

use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Client, ClientSession, Database,
};

use crate::{
    error::{Error, Result},
    model::{
        common::application::{ApplicationStatus, Decision},
        db::{AdminAction, Candidate, Election},
        mongodb::{index, is_duplicate_key_on, now, transact, Coll, Id, Transaction},
    },
};

use super::{Application, ApplicationCore, Review};

impl Application {
    /// Apply for candidacy in an election.
    ///
    /// Fails if the candidate already has an application for this election,
    /// whatever its status, or if candidacy registration is closed.
    pub async fn submit(
        db_client: &Client,
        db: &Database,
        candidate_id: Id,
        election_id: Id,
        statement: String,
    ) -> Result<Application> {
        if statement.trim().is_empty() {
            return Err(Error::BadRequest("Statement must not be empty".to_string()));
        }

        let application = Application {
            id: Id::new(),
            application: ApplicationCore {
                candidate_id,
                election_id,
                statement,
                applied_at: now(),
                status: ApplicationStatus::Pending,
                review: None,
            },
        };
        match transact(db_client, &Submit { db, application: &application }).await {
            Ok(()) => {
                info!(
                    "Candidate {candidate_id} applied to stand in election {election_id} ({})",
                    application.id
                );
                Ok(application)
            }
            Err(err) => {
                warn!("Candidate {candidate_id} could not apply to election {election_id}: {err}");
                Err(err)
            }
        }
    }

    /// Approve or reject a pending application.
    ///
    /// The pending status is swapped out atomically, so of any number of
    /// concurrent reviews exactly one succeeds and the rest see
    /// [`Error::AlreadyReviewed`].
    pub async fn review(
        db_client: &Client,
        db: &Database,
        reviewer: Id,
        application_id: Id,
        decision: Decision,
        notes: String,
    ) -> Result<Application> {
        let body = ReviewApplication {
            db,
            application_id,
            decision,
            review: Review {
                reviewed_by: reviewer,
                reviewed_at: now(),
                notes,
            },
        };
        match transact(db_client, &body).await {
            Ok(application) => {
                info!(
                    "Application {application_id} {:?} by {reviewer}",
                    application.status
                );
                Ok(application)
            }
            Err(err) => {
                warn!("Review of application {application_id} by {reviewer} failed: {err}");
                Err(err)
            }
        }
    }
}

struct Submit<'a> {
    db: &'a Database,
    application: &'a Application,
}

#[rocket::async_trait]
impl<'a> Transaction for Submit<'a> {
    type Output = ();

    async fn run(&self, session: &mut ClientSession) -> Result<()> {
        let candidate_id = self.application.candidate_id;
        let election_id = self.application.election_id;

        let election = Coll::<Election>::from_db(self.db)
            .find_one_with_session(election_id.as_doc(), None, session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

        let candidates = Coll::<Candidate>::from_db(self.db);
        candidates
            .find_one_with_session(candidate_id.as_doc(), None, session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

        let applications = Coll::<Application>::from_db(self.db);
        let existing = applications
            .find_one_with_session(
                doc! {
                    "candidate_id": candidate_id,
                    "election_id": election_id,
                },
                None,
                session,
            )
            .await?;
        if existing.is_some() {
            return Err(Error::DuplicateApplication);
        }

        if !election.candidacy_registration_open {
            return Err(Error::RegistrationClosed);
        }

        // The unique index closes the race between the check above and this insert.
        applications
            .insert_one_with_session(self.application, None, session)
            .await
            .map_err(|err| {
                if is_duplicate_key_on(&err, index::APPLICATION_CANDIDATE_ELECTION) {
                    Error::DuplicateApplication
                } else {
                    Error::Db(err)
                }
            })?;

        candidates
            .update_one_with_session(
                candidate_id.as_doc(),
                doc! {"$set": {"applied_for_candidacy": true}},
                None,
                session,
            )
            .await?;

        Ok(())
    }
}

struct ReviewApplication<'a> {
    db: &'a Database,
    application_id: Id,
    decision: Decision,
    review: Review,
}

#[rocket::async_trait]
impl<'a> Transaction for ReviewApplication<'a> {
    type Output = Application;

    async fn run(&self, session: &mut ClientSession) -> Result<Application> {
        let applications = Coll::<Application>::from_db(self.db);

        // Compare-and-swap out of the pending state.
        let filter = doc! {
            "_id": self.application_id,
            "status": ApplicationStatus::Pending,
        };
        let update = doc! {
            "$set": {
                "status": self.decision.outcome(),
                "review": {
                    "reviewed_by": self.review.reviewed_by,
                    "reviewed_at": BsonDateTime::from_chrono(self.review.reviewed_at),
                    "notes": self.review.notes.clone(),
                },
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let application = match applications
            .find_one_and_update_with_session(filter, update, options, session)
            .await?
        {
            Some(application) => application,
            None => {
                let exists = applications
                    .find_one_with_session(self.application_id.as_doc(), None, session)
                    .await?
                    .is_some();
                return Err(if exists {
                    Error::AlreadyReviewed
                } else {
                    Error::not_found(format!("Application {}", self.application_id))
                });
            }
        };

        let candidates = Coll::<Candidate>::from_db(self.db);
        let candidate_id = application.candidate_id;
        let candidate = candidates
            .find_one_with_session(candidate_id.as_doc(), None, session)
            .await?
            .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

        if self.decision == Decision::Approve {
            candidates
                .update_one_with_session(
                    candidate_id.as_doc(),
                    doc! {"$set": {"is_approved": true}},
                    None,
                    session,
                )
                .await?;
        }

        AdminAction::record(
            session,
            self.db,
            self.review.reviewed_by,
            self.decision.action_label(),
            Some(application.election_id),
            &candidate.full_name,
        )
        .await?;

        Ok(application)
    }
}
