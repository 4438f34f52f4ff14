//! Handler for job submission.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::engine::dispatcher::{SubmissionOutcome, SubmitRequest};
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::handlers::blocking;
use crate::middleware::auth::JobKey;
use crate::response::SubmitResponse;
use crate::state::AppState;

/// Browser tabs the worker opens when the client does not say.
pub const DEFAULT_MAX_TABS: u32 = 10;
/// Upper bound on worker tabs per job.
pub const MAX_TABS_LIMIT: u32 = 40;

#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    /// Base64 prompt file, one scene per non-blank line.
    pub prompts_base64: String,
    #[serde(default)]
    pub max_tabs: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Validate the requested tab count, applying the default when absent.
fn validate_max_tabs(raw: Option<i64>) -> AppResult<u32> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_TABS);
    };
    u32::try_from(raw)
        .ok()
        .filter(|n| (1..=MAX_TABS_LIMIT).contains(n))
        .ok_or_else(|| {
            AppError::BadRequest(format!("max_tabs must be between 1 and {MAX_TABS_LIMIT}"))
        })
}

/// POST /generate-video
///
/// Admit a job and launch its worker. Capacity refusal and launch faults
/// are reported in the body with `200 OK`.
pub async fn generate_video(
    _key: JobKey,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<GenerateVideoRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let max_tabs = validate_max_tabs(input.max_tabs)?;
    let request = SubmitRequest {
        prompt_blob: input.prompts_base64,
        max_tabs,
        email: input.email.filter(|e| !e.trim().is_empty()),
        password: input.password.filter(|p| !p.is_empty()),
    };

    let dispatcher = state.dispatcher.clone();
    let outcome = blocking(move || dispatcher.submit(request)).await?;

    let response = match outcome {
        SubmissionOutcome::Admitted(job) => {
            let node = state.dispatcher.node();
            SubmitResponse::Admitted {
                ok: true,
                status: "pending_job",
                job_id: job.job_id.to_string(),
                pid: job.pid,
                expected_scenes: job.expected_scenes,
                active_jobs_now: job.active_jobs,
                node_id: node.node_id.clone(),
                node_public_url: node.public_url.clone(),
            }
        }
        SubmissionOutcome::Refused(full) => SubmitResponse::LimitReached {
            ok: false,
            status: "limit_reached",
            message: format!(
                "Concurrency limit reached ({} of {} jobs running)",
                full.active, full.capacity
            ),
            active_jobs: full.active,
        },
        SubmissionOutcome::Faulted { message, .. } => SubmitResponse::Error {
            ok: false,
            status: "error",
            error: message,
        },
    };

    Ok(Json(response))
}
