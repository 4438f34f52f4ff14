use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET / and GET /health -- liveness plus the current in-flight job count.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_jobs: state.dispatcher.active_jobs(),
        node_id: state.config.node.node_id.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount health check routes. These never require the job key.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
}
