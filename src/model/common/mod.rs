//! Types shared by the database and API representations.

pub mod application;
pub mod gate;
