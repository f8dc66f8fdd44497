use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{AdminAction, Application, Candidate, Election, Vote};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Candidate collection
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}

// Election collection
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}

// Candidacy application collection
const APPLICATIONS: &str = "candidacy_applications";
impl MongoCollection for Application {
    const NAME: &'static str = APPLICATIONS;
}

// Vote collection
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}

// Admin action log collection
const ADMIN_ACTIONS: &str = "admin_actions";
impl MongoCollection for AdminAction {
    const NAME: &'static str = ADMIN_ACTIONS;
}

/// Names of the unique indexes, so that duplicate key errors can be traced
/// back to the constraint that was violated.
pub mod index {
    pub const CANDIDATE_EMAIL: &str = "candidate_email";
    pub const CANDIDATE_WALLET: &str = "candidate_wallet_address";
    pub const APPLICATION_CANDIDATE_ELECTION: &str = "application_candidate_election";
    pub const VOTE_ELECTION_VOTER: &str = "vote_election_voter";
    pub const VOTE_TRANSACTION_HASH: &str = "vote_transaction_hash";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = |name: &str| {
        IndexOptions::builder()
            .unique(true)
            .name(name.to_string())
            .build()
    };

    // Candidate collection.
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique(index::CANDIDATE_EMAIL))
        .build();
    // Candidates without a wallet address are absent from this index.
    let wallet_index = IndexModel::builder()
        .keys(doc! {"wallet_address": 1})
        .options(
            IndexOptions::builder()
                .unique(true)
                .sparse(true)
                .name(index::CANDIDATE_WALLET.to_string())
                .build(),
        )
        .build();
    Coll::<Candidate>::from_db(db)
        .create_indexes([email_index, wallet_index], None)
        .await?;

    // Election collection. No constraints, but it must exist before any
    // transaction writes to it.
    let active_index = IndexModel::builder().keys(doc! {"is_active": 1}).build();
    Coll::<Election>::from_db(db)
        .create_index(active_index, None)
        .await?;

    // Candidacy application collection.
    let application_index = IndexModel::builder()
        .keys(doc! {"candidate_id": 1, "election_id": 1})
        .options(unique(index::APPLICATION_CANDIDATE_ELECTION))
        .build();
    Coll::<Application>::from_db(db)
        .create_index(application_index, None)
        .await?;

    // Vote collection.
    let voter_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "voter_id": 1})
        .options(unique(index::VOTE_ELECTION_VOTER))
        .build();
    let hash_index = IndexModel::builder()
        .keys(doc! {"transaction_hash": 1})
        .options(unique(index::VOTE_TRANSACTION_HASH))
        .build();
    let recipient_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "candidate_id": 1})
        .build();
    Coll::<Vote>::from_db(db)
        .create_indexes([voter_index, hash_index, recipient_index], None)
        .await?;

    // Admin action log.
    let timestamp_index = IndexModel::builder().keys(doc! {"timestamp": -1}).build();
    Coll::<AdminAction>::from_db(db)
        .create_index(timestamp_index, None)
        .await?;

    Ok(())
}
