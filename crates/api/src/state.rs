use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::dispatcher::JobDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (node identity, paths, auth key).
    pub config: Arc<ServerConfig>,
    /// Admission gate, job store and worker launcher.
    pub dispatcher: Arc<JobDispatcher>,
}
