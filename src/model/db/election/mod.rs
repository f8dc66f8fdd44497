mod base;
mod participation;
mod phase;

pub use base::{Election, ElectionCore};
pub use participation::Participation;

#[cfg(test)]
pub use base::at;
