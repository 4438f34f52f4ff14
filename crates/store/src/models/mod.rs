//! Persisted record types.

pub mod job;
pub mod status;
