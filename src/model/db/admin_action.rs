use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime},
    options::FindOptions,
    ClientSession, Database,
};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::{now, Coll, Id};

/// One entry in the append-only audit trail of privileged operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminActionCore {
    /// Who performed the action.
    pub actor_id: Id,
    /// What kind of action it was, e.g. `Force-end election`.
    pub action: String,
    /// The election affected, if any.
    pub election_id: Option<Id>,
    /// Free-text detail.
    pub details: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

/// An audit log entry from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAction {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub action: AdminActionCore,
}

impl Deref for AdminAction {
    type Target = AdminActionCore;

    fn deref(&self) -> &Self::Target {
        &self.action
    }
}

impl AdminAction {
    /// Append an entry to the audit log as part of the session's transaction,
    /// so that the entry exists iff the mutation it describes committed.
    pub async fn record(
        session: &mut ClientSession,
        db: &Database,
        actor_id: Id,
        action: impl Into<String>,
        election_id: Option<Id>,
        details: impl Into<String>,
    ) -> Result<()> {
        let entry = AdminAction {
            id: Id::new(),
            action: AdminActionCore {
                actor_id,
                action: action.into(),
                election_id,
                details: details.into(),
                timestamp: now(),
            },
        };
        Coll::<AdminAction>::from_db(db)
            .insert_one_with_session(&entry, None, session)
            .await?;
        Ok(())
    }

    /// The most recent entries, newest first.
    pub async fn recent(actions: &Coll<AdminAction>, limit: u32) -> Result<Vec<AdminAction>> {
        // MongoDB reads a zero limit as no limit at all.
        if limit == 0 {
            return Ok(Vec::new());
        }
        let options = FindOptions::builder()
            .sort(doc! {"timestamp": -1, "_id": -1})
            .limit(i64::from(limit))
            .build();
        Ok(actions.find(None, options).await?.try_collect().await?)
    }

    /// Every entry concerning the given election, oldest first.
    pub async fn for_election(
        actions: &Coll<AdminAction>,
        election_id: Id,
    ) -> Result<Vec<AdminAction>> {
        let options = FindOptions::builder()
            .sort(doc! {"timestamp": 1, "_id": 1})
            .build();
        let filter = doc! {"election_id": election_id};
        Ok(actions.find(filter, options).await?.try_collect().await?)
    }
}
