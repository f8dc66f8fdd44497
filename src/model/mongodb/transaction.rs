use std::time::{Duration, Instant};

use mongodb::{
    error::{Error as DbError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{Acknowledgment, ReadConcern, SessionOptions, TransactionOptions, WriteConcern},
    Client, ClientSession,
};
use rand::Rng;

use crate::error::{Error, Result};

/// How long a transaction keeps being retried after write conflicts before
/// it is reported as a storage error.
pub const TRANSACTION_DEADLINE: Duration = Duration::from_secs(120);

/// Smallest and largest upper bound on the randomised wait between attempts.
const BACKOFF_BASE: Duration = Duration::from_millis(5);
const BACKOFF_CAP: Duration = Duration::from_millis(500);

/// A unit of work to be applied atomically.
///
/// The body may be run more than once if it conflicts with a concurrent
/// transaction, so it must do all of its reads and writes through the session
/// it is given and must not have side effects outside the database.
#[rocket::async_trait]
pub trait Transaction {
    type Output: Send;

    async fn run(&self, session: &mut ClientSession) -> Result<Self::Output>;
}

/// Run the given body inside a transaction and commit it.
///
/// Any error from the body aborts the transaction, so nothing it wrote is
/// persisted. Write conflicts with concurrent transactions restart the body
/// from scratch; the retry then observes whatever the winner committed.
pub async fn transact<T>(client: &Client, body: &T) -> Result<T::Output>
where
    T: Transaction + Sync,
{
    let deadline = Instant::now() + TRANSACTION_DEADLINE;
    let mut session = client.start_session(None).await?;
    let mut attempt = 1;
    loop {
        session.start_transaction(transaction_options()).await?;

        let output = match body.run(&mut session).await {
            Ok(output) => output,
            Err(err) => {
                // The server may already have aborted it; the body's error is what matters.
                let _ = session.abort_transaction().await;
                if err.is_transient() && Instant::now() < deadline {
                    debug!("Transaction attempt {attempt} conflicted, retrying: {err}");
                    backoff(attempt).await;
                    attempt += 1;
                    continue;
                }
                return Err(err);
            }
        };

        match commit(&mut session, deadline).await {
            Ok(()) => return Ok(output),
            Err(err)
                if err.contains_label(TRANSIENT_TRANSACTION_ERROR) && Instant::now() < deadline =>
            {
                debug!("Transaction commit attempt {attempt} conflicted, retrying: {err}");
                backoff(attempt).await;
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    // `session` is dropped on every return path, which aborts anything still in progress.
}

/// Commit the current transaction, retrying the commit alone while its outcome is unknown.
async fn commit(
    session: &mut ClientSession,
    deadline: Instant,
) -> std::result::Result<(), DbError> {
    loop {
        match session.commit_transaction().await {
            Err(err)
                if err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                    && Instant::now() < deadline =>
            {
                debug!("Commit result unknown, retrying commit: {err}");
            }
            result => return result,
        }
    }
}

/// Sleep for a random time below an exponentially growing bound, so that
/// transactions which conflicted together do not retry in lockstep.
async fn backoff(attempt: u32) {
    let wait = rand::thread_rng().gen_range(Duration::ZERO..=backoff_bound(attempt));
    rocket::tokio::time::sleep(wait).await;
}

fn backoff_bound(attempt: u32) -> Duration {
    BACKOFF_BASE
        .saturating_mul(1 << attempt.min(10))
        .min(BACKOFF_CAP)
}

fn transaction_options() -> TransactionOptions {
    TransactionOptions::builder()
        .read_concern(ReadConcern::snapshot())
        .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
        .build()
}

/// Start a session whose reads all observe one consistent point in time.
/// Used for read-only reporting, which needs no locking.
pub async fn snapshot_session(client: &Client) -> Result<ClientSession> {
    let options = SessionOptions::builder().snapshot(true).build();
    Ok(client.start_session(Some(options)).await?)
}

impl Error {
    /// Whether this error is a conflict with a concurrent transaction that
    /// is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Db(err) => err.contains_label(TRANSIENT_TRANSACTION_ERROR),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_levels_off() {
        assert_eq!(backoff_bound(1), Duration::from_millis(10));
        assert_eq!(backoff_bound(3), Duration::from_millis(40));
        assert!(backoff_bound(6) > backoff_bound(5));
        assert_eq!(backoff_bound(7), BACKOFF_CAP);
        assert_eq!(backoff_bound(u32::MAX), BACKOFF_CAP);
    }
}
