//! File-backed job metadata store.
//!
//! Each job owns one directory under the jobs root holding a single
//! `meta.json`. The core writes that file exactly once, at submission; after
//! that the external worker rewrites it in place with no coordination, so
//! every read here is a best-effort snapshot (last writer wins).

use std::fs;
use std::path::{Path, PathBuf};

use flowgen_core::types::JobId;

pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;

/// Filename of the metadata record inside a job directory.
pub const META_FILE_NAME: &str = "meta.json";

/// Handle to the jobs root directory, passed to every repository call.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the record for `job_id`.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.root.join(job_id.as_str())
    }

    /// Deterministic location of the record for `job_id`.
    pub fn meta_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(META_FILE_NAME)
    }
}
