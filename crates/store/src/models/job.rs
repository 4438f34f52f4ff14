//! The job metadata record stored at `<jobs>/<id>/meta.json`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use flowgen_core::types::JobId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::status::JobStatus;

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// One job's metadata record.
///
/// Every field beyond `job_id` is optional on read because the worker
/// rewrites the file independently. A `null` or mistyped value reads as the
/// field's default, so the record's `status` is still seen. Fields the worker adds (`finished_at`,
/// `reason`, `error`, `total_scenes`, ...) are kept in [`JobRecord::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    #[serde(default, deserialize_with = "lenient")]
    pub status: JobStatus,
    /// Path of the decoded prompt file handed to the worker.
    #[serde(default, deserialize_with = "lenient")]
    pub prompts_file: Option<PathBuf>,
    /// Where scene artifacts are written.
    #[serde(default, deserialize_with = "lenient")]
    pub output_dir: Option<PathBuf>,
    /// Fixed at submission; never changed by the core.
    #[serde(default, deserialize_with = "lenient")]
    pub expected_scenes: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub max_tabs: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub node_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub node_public_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deserialize a field, falling back to its default when the value does not fit.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// DTO for creating a new record at submission time.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_id: JobId,
    pub prompts_file: PathBuf,
    pub output_dir: PathBuf,
    pub expected_scenes: u64,
    pub max_tabs: u32,
    pub email: Option<String>,
    pub node_id: String,
    pub node_public_url: String,
}

impl From<NewJob> for JobRecord {
    fn from(job: NewJob) -> Self {
        Self {
            job_id: job.job_id,
            status: JobStatus::Pending,
            prompts_file: Some(job.prompts_file),
            output_dir: Some(job.output_dir),
            expected_scenes: job.expected_scenes,
            max_tabs: Some(job.max_tabs),
            email: job.email,
            node_id: Some(job.node_id),
            node_public_url: Some(job.node_public_url),
            created_at: Some(Utc::now()),
            extra: Map::new(),
        }
    }
}

impl JobRecord {
    /// Flatten the record into a JSON object, worker-added fields included.
    pub fn to_json_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
