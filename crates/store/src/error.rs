use std::path::{Path, PathBuf};

use flowgen_core::types::JobId;

/// Errors raised by the job store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure while reading or writing a record.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record exists but does not parse, e.g. because the worker is
    /// rewriting it at this very moment.
    #[error("Malformed job record at {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record for this id already exists.
    #[error("Job record for {0} already exists")]
    AlreadyExists(JobId),

    /// A record could not be encoded.
    #[error("Failed to encode job record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
