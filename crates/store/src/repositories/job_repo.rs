//! Repository for job metadata records.
//!
//! There is deliberately no update method: after [`JobRepo::create`] the
//! record belongs to the worker process.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use flowgen_core::types::JobId;

use crate::error::StoreError;
use crate::models::job::{JobRecord, NewJob};
use crate::JobStore;

/// Provides create and read access to job records.
pub struct JobRepo;

impl JobRepo {
    /// Write a fresh pending record for `input`, creating the job directory.
    ///
    /// Returns the record path, which is what the worker is pointed at.
    /// Fails with [`StoreError::AlreadyExists`] instead of overwriting.
    pub fn create(store: &JobStore, input: NewJob) -> Result<(PathBuf, JobRecord), StoreError> {
        let record = JobRecord::from(input);
        let dir = store.job_dir(&record.job_id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let path = store.meta_path(&record.job_id);
        let body = serde_json::to_vec_pretty(&record).map_err(StoreError::Encode)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(record.job_id.clone()));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        file.write_all(&body).map_err(|e| StoreError::io(&path, e))?;
        file.sync_all().map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!(job_id = %record.job_id, path = %path.display(), "Job record created");
        Ok((path, record))
    }

    /// Read the current snapshot of the record for `job_id`.
    ///
    /// Returns `Ok(None)` when no record exists. A record caught mid-write
    /// surfaces as [`StoreError::Malformed`]; re-reading later is expected
    /// to succeed.
    pub fn find_by_id(store: &JobStore, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        let path = store.meta_path(job_id);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed { path, source })
    }
}
