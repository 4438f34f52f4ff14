use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Job routes, all guarded by the shared job key.
///
/// ```text
/// POST /generate-video    submit
/// GET  /job-status        poll (?job_id=&response_format=json|zip)
/// GET  /list-outputs      reconcile without a record (?folder_id=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-video", post(handlers::generate::generate_video))
        .route("/job-status", get(handlers::jobs::job_status))
        .route("/list-outputs", get(handlers::outputs::list_outputs))
}
