use chrono::{Duration, NaiveDateTime, Utc};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::mongodb::ensure_indexes_exist;

fn default_audit_page_size() -> u32 {
    15
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seconds east of UTC of the wall-clock that election windows are
    /// written in.
    #[serde(default)]
    voting_utc_offset: i32,
    /// Entries per page of the audit log.
    #[serde(default = "default_audit_page_size")]
    audit_page_size: u32,
}

impl Config {
    /// The offset of election wall-clock time from UTC.
    pub fn voting_utc_offset(&self) -> Duration {
        Duration::seconds(self.voting_utc_offset.into())
    }

    /// The current instant on the election wall-clock, against which voting
    /// windows are checked.
    pub fn voting_clock(&self) -> NaiveDateTime {
        (Utc::now() + self.voting_utc_offset()).naive_utc()
    }

    /// Default number of audit log entries to list.
    pub fn audit_page_size(&self) -> u32 {
        self.audit_page_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            voting_utc_offset: 0,
            audit_page_size: default_audit_page_size(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!(
            "Election clock is UTC{:+}s, audit page size {}",
            config.voting_utc_offset, config.audit_page_size
        );

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
pub(crate) struct DbConfig {
    // secrets
    pub(crate) db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&database_name());

        // Ensure the required indexes exist. This also creates every
        // collection, which transactions cannot do implicitly.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to set up database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
pub fn database_name() -> String {
    "evoting".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub fn database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
