//! Handler for job status polling.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::engine::dispatcher::{JobDispatcher, PollOutcome, TerminalJob};
use crate::error::AppResult;
use crate::extract::ApiQuery;
use crate::handlers::blocking;
use crate::links::BaseUrl;
use crate::middleware::auth::JobKey;
use crate::response::{StatusResponse, TerminalReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobStatusQuery {
    pub job_id: String,
    /// `json` (default) or `zip`. Anything else is treated as `json`.
    #[serde(default)]
    pub response_format: Option<String>,
}

/// How a terminal job is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Json,
    Zip,
}

impl ResponseFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("zip") => Self::Zip,
            _ => Self::Json,
        }
    }
}

/// GET /job-status
///
/// Report a job's state. The first poll that observes a terminal status
/// frees the job's concurrency slot.
pub async fn job_status(
    _key: JobKey,
    State(state): State<AppState>,
    base: BaseUrl,
    ApiQuery(query): ApiQuery<JobStatusQuery>,
) -> AppResult<Json<StatusResponse>> {
    let format = ResponseFormat::parse(query.response_format.as_deref());
    let dispatcher = state.dispatcher.clone();

    let response = blocking(move || {
        let outcome = dispatcher.poll(&query.job_id);
        let active_jobs_now = dispatcher.active_jobs();
        match outcome {
            PollOutcome::NotFound { job_id } => Ok(StatusResponse::NotFound {
                ok: false,
                status: "not_found",
                job_id,
            }),
            PollOutcome::Pending {
                job_id,
                expected_scenes,
            } => Ok(StatusResponse::Pending {
                ok: true,
                status: "pending",
                job_id: job_id.to_string(),
                expected_scenes: Some(expected_scenes),
                active_jobs_now,
            }),
            PollOutcome::Unreadable { job_id } => Ok(StatusResponse::Pending {
                ok: true,
                status: "pending",
                job_id: job_id.to_string(),
                expected_scenes: None,
                active_jobs_now,
            }),
            PollOutcome::Terminal(job) => match format {
                ResponseFormat::Zip => zip_report(&dispatcher, &job, &base),
                ResponseFormat::Json => json_report(&dispatcher, &job, &base, active_jobs_now),
            },
        }
    })
    .await??;

    Ok(Json(response))
}

fn json_report(
    dispatcher: &JobDispatcher,
    job: &TerminalJob,
    base: &BaseUrl,
    active_jobs_now: usize,
) -> AppResult<StatusResponse> {
    let job_id = job.record.job_id.as_str();
    let reconciled = dispatcher.reconcile_job(job, |name| base.folder_file_url(job_id, name))?;

    let report = TerminalReport {
        ok: true,
        status: job.record.status.to_string(),
        job_id: job_id.to_string(),
        expected_scenes: job.record.expected_scenes,
        success_full: reconciled.all_present,
        outputs: reconciled.outputs,
        active_jobs_now,
        record: Default::default(),
    }
    .with_record(job.record.to_json_map());

    Ok(StatusResponse::Report(report))
}

fn zip_report(
    dispatcher: &JobDispatcher,
    job: &TerminalJob,
    base: &BaseUrl,
) -> AppResult<StatusResponse> {
    let job_id = job.record.job_id.as_str();
    let response = match dispatcher.bundle_job(job) {
        Ok(Some(bundle)) => StatusResponse::Zip {
            ok: true,
            status: job.record.status.to_string(),
            job_id: job_id.to_string(),
            zip_url: base.folder_file_url(job_id, &bundle),
            message: "Download the zip file containing all scenes.",
        },
        Ok(None) => StatusResponse::ZipFailed {
            ok: false,
            status: "zip_failed",
            message: "Could not create zip or no files found.",
        },
        Err(e) => {
            tracing::error!(job_id, error = %e, "Failed to bundle job outputs");
            StatusResponse::ZipFailed {
                ok: false,
                status: "zip_failed",
                message: "Could not create zip or no files found.",
            }
        }
    };
    Ok(response)
}
