use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        common::application::ApplicationStatus,
        mongodb::{Coll, Id},
    },
};

/// An admin's stamp on a reviewed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewed_by: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub reviewed_at: DateTime<Utc>,
    pub notes: String,
}

/// Core candidacy application data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCore {
    pub candidate_id: Id,
    pub election_id: Id,
    /// Why the candidate wants to stand.
    pub statement: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    /// Present iff the application is no longer pending.
    #[serde(default)]
    pub review: Option<Review>,
}

/// A candidacy application from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub application: ApplicationCore,
}

impl Deref for Application {
    type Target = ApplicationCore;

    fn deref(&self) -> &Self::Target {
        &self.application
    }
}

impl DerefMut for Application {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.application
    }
}

impl Application {
    /// Look up an application by ID.
    pub async fn get(applications: &Coll<Application>, id: Id) -> Result<Application> {
        applications
            .find_one(id.as_doc(), None)
            .await?
            .ok_or_else(|| Error::not_found(format!("Application {id}")))
    }
}
