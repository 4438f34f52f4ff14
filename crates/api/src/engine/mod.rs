//! Job execution engine.
//!
//! Contains the dispatcher that admits jobs, writes their records and hands
//! them to the external worker, plus the launcher that starts that worker.

pub mod dispatcher;
pub mod launcher;
