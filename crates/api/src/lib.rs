//! Scene generation coordinator API server library.
//!
//! Exposes the building blocks (config, state, error handling, dispatcher,
//! routes) so integration tests and the binary entrypoint can both use them.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod links;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
