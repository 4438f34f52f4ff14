//! Domain logic for the scene generation coordinator.
//!
//! Everything here is synchronous and free of HTTP concerns: the admission
//! gate, scene filename parsing and indexing, output reconciliation, archive
//! bundling, media listing and prompt decoding. The API crate wires these
//! together behind its handlers.

pub mod bundle;
pub mod error;
pub mod gate;
pub mod media;
pub mod prompts;
pub mod reconcile;
pub mod scene;
pub mod types;
