mod base;
mod workflow;

pub use base::{Application, ApplicationCore, Review};
