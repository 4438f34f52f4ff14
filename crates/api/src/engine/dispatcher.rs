//! Job dispatcher: admission, record creation, worker launch and polling.
//!
//! Lifecycle of a job as seen from this process:
//!
//! 1. [`JobDispatcher::submit`] admits the job through the
//!    [`ConcurrencyGate`], writes a `pending` record and launches the worker.
//!    Any fault after admission releases the slot again.
//! 2. The worker rewrites the record on its own schedule; this process never
//!    writes it a second time.
//! 3. [`JobDispatcher::poll`] re-reads the record. The first poll that sees a
//!    terminal status frees the job's slot; later polls find nothing to free.
//!
//! All methods perform blocking filesystem I/O. Async callers run them on
//! the blocking pool.

use std::path::PathBuf;
use std::sync::Arc;

use flowgen_core::bundle;
use flowgen_core::error::CoreError;
use flowgen_core::gate::{ConcurrencyGate, GateFull};
use flowgen_core::prompts;
use flowgen_core::reconcile::{self, Reconciliation};
use flowgen_core::types::{validate_path_segment, JobId};
use flowgen_store::models::job::{JobRecord, NewJob};
use flowgen_store::repositories::JobRepo;
use flowgen_store::{JobStore, StoreError};

use crate::config::{NodeConfig, PathsConfig};
use crate::engine::launcher::{LaunchError, LaunchRequest, WorkerLauncher};

/// Errors raised while starting an admitted job.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

/// Parameters of one submission.
#[derive(Clone)]
pub struct SubmitRequest {
    /// Base64 prompt text, optionally behind a data-URL prefix.
    pub prompt_blob: String,
    pub max_tabs: u32,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Result of an admitted and launched job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedJob {
    pub job_id: JobId,
    pub pid: u32,
    pub expected_scenes: u64,
    /// In-flight jobs right after this one was registered.
    pub active_jobs: usize,
}

/// Outcome of [`JobDispatcher::submit`].
#[derive(Debug)]
pub enum SubmissionOutcome {
    Admitted(AdmittedJob),
    /// The gate was saturated. Nothing was written.
    Refused(GateFull),
    /// Starting the job failed after admission; its slot has been released.
    Faulted { job_id: JobId, message: String },
}

/// A job whose worker has reported a terminal status.
#[derive(Debug, Clone)]
pub struct TerminalJob {
    pub record: JobRecord,
    /// Directory holding the job's scene artifacts.
    pub output_dir: PathBuf,
}

/// Outcome of [`JobDispatcher::poll`].
#[derive(Debug)]
pub enum PollOutcome {
    /// No record exists, or the id is not a usable path segment.
    NotFound { job_id: String },
    Pending { job_id: JobId, expected_scenes: u64 },
    /// The record exists but could not be read, most likely mid-write.
    Unreadable { job_id: JobId },
    Terminal(TerminalJob),
}

/// Coordinates the gate, the job store and the worker launcher.
pub struct JobDispatcher {
    gate: ConcurrencyGate,
    store: JobStore,
    launcher: Arc<dyn WorkerLauncher>,
    paths: PathsConfig,
    node: NodeConfig,
}

impl JobDispatcher {
    pub fn new(
        gate: ConcurrencyGate,
        store: JobStore,
        launcher: Arc<dyn WorkerLauncher>,
        paths: PathsConfig,
        node: NodeConfig,
    ) -> Self {
        Self {
            gate,
            store,
            launcher,
            paths,
            node,
        }
    }

    /// Number of jobs currently holding a slot.
    pub fn active_jobs(&self) -> usize {
        self.gate.count()
    }

    pub fn node(&self) -> &NodeConfig {
        &self.node
    }

    // ---- Submission ----

    /// Admit and launch a new job.
    ///
    /// Admission happens before any file is written, so a refused request
    /// leaves no trace on disk.
    pub fn submit(&self, request: SubmitRequest) -> SubmissionOutcome {
        let job_id = JobId::generate();

        if let Err(full) = self.gate.try_admit(&job_id) {
            tracing::info!(
                active = full.active,
                capacity = full.capacity,
                "Job refused, concurrency limit reached",
            );
            return SubmissionOutcome::Refused(full);
        }

        match self.start(&job_id, request) {
            Ok((pid, expected_scenes)) => {
                let active_jobs = self.gate.count();
                tracing::info!(
                    job_id = %job_id,
                    pid,
                    expected_scenes,
                    active_jobs,
                    "Job admitted",
                );
                SubmissionOutcome::Admitted(AdmittedJob {
                    job_id,
                    pid,
                    expected_scenes,
                    active_jobs,
                })
            }
            Err(e) => {
                self.gate.release(&job_id);
                tracing::error!(job_id = %job_id, error = %e, "Job submission failed");
                SubmissionOutcome::Faulted {
                    job_id,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Everything between admission and a running worker.
    fn start(&self, job_id: &JobId, request: SubmitRequest) -> Result<(u32, u64), DispatchError> {
        let text = prompts::decode_prompt_blob(&request.prompt_blob)?;
        let expected_scenes = prompts::count_scenes(&text);
        let prompts_file = prompts::save_prompts(&self.paths.prompts_dir, &text)?;

        let output_dir = self.paths.output_root.join(job_id.as_str());
        std::fs::create_dir_all(&output_dir).map_err(|e| CoreError::io(&output_dir, e))?;

        let (meta_path, _record) = JobRepo::create(
            &self.store,
            NewJob {
                job_id: job_id.clone(),
                prompts_file: prompts_file.clone(),
                output_dir: output_dir.clone(),
                expected_scenes,
                max_tabs: request.max_tabs,
                email: request.email.clone(),
                node_id: self.node.node_id.clone(),
                node_public_url: self.node.public_url.clone(),
            },
        )?;

        let pid = self.launcher.launch(&LaunchRequest {
            job_id: job_id.clone(),
            prompts_file,
            output_dir,
            meta_path,
            max_tabs: request.max_tabs,
            email: request.email,
            password: request.password,
        })?;

        Ok((pid, expected_scenes))
    }

    // ---- Polling ----

    /// Read the current state of a job.
    ///
    /// Observing a terminal status frees the job's gate slot.
    pub fn poll(&self, raw_job_id: &str) -> PollOutcome {
        let Ok(job_id) = JobId::parse(raw_job_id) else {
            return PollOutcome::NotFound {
                job_id: raw_job_id.to_string(),
            };
        };

        let record = match JobRepo::find_by_id(&self.store, &job_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                return PollOutcome::NotFound {
                    job_id: raw_job_id.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Job record unreadable, reporting as pending");
                return PollOutcome::Unreadable { job_id };
            }
        };

        if !record.status.is_terminal() {
            return PollOutcome::Pending {
                job_id,
                expected_scenes: record.expected_scenes,
            };
        }

        if self.gate.release(&job_id) {
            tracing::info!(job_id = %job_id, status = %record.status, "Job finished, slot released");
        }

        let output_dir = self.output_dir_for(&job_id, &record);
        PollOutcome::Terminal(TerminalJob { record, output_dir })
    }

    /// Output directory named in the record, or the default location.
    fn output_dir_for(&self, job_id: &JobId, record: &JobRecord) -> PathBuf {
        record
            .output_dir
            .clone()
            .unwrap_or_else(|| self.paths.output_root.join(job_id.as_str()))
    }

    // ---- Outputs ----

    /// Strict reconciliation of a finished job against its expected count.
    pub fn reconcile_job<F>(&self, job: &TerminalJob, reference: F) -> Result<Reconciliation, CoreError>
    where
        F: Fn(&str) -> String,
    {
        reconcile::reconcile_dir_strict(&job.output_dir, job.record.expected_scenes, reference)
    }

    /// Archive a finished job's artifacts, returning the bundle's file name.
    pub fn bundle_job(&self, job: &TerminalJob) -> Result<Option<String>, CoreError> {
        bundle::ensure_bundle(&job.output_dir)
    }

    /// Discovered reconciliation of one output folder.
    pub fn list_folder<F>(&self, folder: &str, reference: F) -> Result<Reconciliation, CoreError>
    where
        F: Fn(&str) -> String,
    {
        validate_path_segment(folder)?;
        reconcile::reconcile_dir_discovered(&self.paths.output_root.join(folder), reference)
    }

    /// Global discovery across the whole output root.
    pub fn list_all<F>(&self, reference: F) -> Reconciliation
    where
        F: Fn(&str) -> String,
    {
        reconcile::discover_all(&self.paths.output_root, reference)
    }
}
