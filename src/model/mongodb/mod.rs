mod bson;
mod collection;
mod errors;
mod transaction;

pub use bson::{now, serde_id_hex, Id};
pub use collection::{ensure_indexes_exist, index, Coll, MongoCollection};
pub use errors::is_duplicate_key_on;
pub use transaction::{snapshot_session, transact, Transaction, TRANSACTION_DEADLINE};
