//! Repository layer.
//!
//! Each repository is a zero-sized struct whose methods take the
//! [`JobStore`](crate::JobStore) handle as their first argument.

pub mod job_repo;

pub use job_repo::JobRepo;
