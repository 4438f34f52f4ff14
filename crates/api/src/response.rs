//! Response payloads for the job endpoints.
//!
//! Every payload carries an explicit `ok` flag. Refusals, missing jobs and
//! archive failures are normal outcomes reported with `200 OK` and a
//! distinct `status` string; only auth, validation and configuration
//! problems use HTTP error codes (see [`crate::error::AppError`]).

use flowgen_core::reconcile::SceneOutput;
use serde::Serialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_jobs: usize,
    pub node_id: String,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Admitted {
        ok: bool,
        status: &'static str,
        job_id: String,
        pid: u32,
        expected_scenes: u64,
        active_jobs_now: usize,
        node_id: String,
        node_public_url: String,
    },
    LimitReached {
        ok: bool,
        status: &'static str,
        message: String,
        active_jobs: usize,
    },
    Error {
        ok: bool,
        status: &'static str,
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    NotFound {
        ok: bool,
        status: &'static str,
        job_id: String,
    },
    Pending {
        ok: bool,
        status: &'static str,
        job_id: String,
        /// Absent when the record could not be read.
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_scenes: Option<u64>,
        active_jobs_now: usize,
    },
    Report(TerminalReport),
    Zip {
        ok: bool,
        status: String,
        job_id: String,
        zip_url: String,
        message: &'static str,
    },
    ZipFailed {
        ok: bool,
        status: &'static str,
        message: &'static str,
    },
}

/// Terminal JSON report: reconciled outputs plus every record field.
#[derive(Debug, Serialize)]
pub struct TerminalReport {
    pub ok: bool,
    pub status: String,
    pub job_id: String,
    pub expected_scenes: u64,
    pub success_full: bool,
    pub outputs: Vec<SceneOutput>,
    pub active_jobs_now: usize,
    /// Record fields not already named above.
    #[serde(flatten)]
    pub record: Map<String, Value>,
}

impl TerminalReport {
    /// Merge `record` in, skipping keys the report already carries.
    pub fn with_record(mut self, record: Map<String, Value>) -> Self {
        const RESERVED: [&str; 7] = [
            "ok",
            "status",
            "job_id",
            "expected_scenes",
            "success_full",
            "outputs",
            "active_jobs_now",
        ];
        self.record = record
            .into_iter()
            .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
            .collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ListOutputsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub outputs: Vec<SceneOutput>,
}
