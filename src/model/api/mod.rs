//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod actor;
pub mod admin_action;
pub mod application;
pub mod candidate;
pub mod election;
pub mod gate;
pub mod results;
pub mod vote;
