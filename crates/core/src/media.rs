//! Media artifact discovery on disk.
//!
//! Only regular files with the [`MEDIA_EXTENSION`] suffix (any case) count
//! as media. Listings are sorted so downstream output is deterministic.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::CoreError;

/// Suffix of scene artifacts produced by the worker.
pub const MEDIA_EXTENSION: &str = ".mp4";

/// Whether `name` carries the media suffix, ignoring ASCII case.
pub fn is_media_file_name(name: &str) -> bool {
    name.len() >= MEDIA_EXTENSION.len()
        && name
            .get(name.len() - MEDIA_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MEDIA_EXTENSION))
}

/// List media filenames directly inside `dir` (non-recursive), sorted.
///
/// A missing directory lists as empty. Entries whose names are not valid
/// UTF-8 are skipped.
pub fn list_media_files(dir: &Path) -> Result<Vec<String>, CoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CoreError::io(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_media_file_name(&name) {
            continue;
        }
        // `metadata` follows symlinks, matching how the files are served.
        let is_file = fs::metadata(entry.path()).is_ok_and(|m| m.is_file());
        if is_file {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

/// List media files anywhere below `root` as `/`-separated relative paths, sorted.
///
/// Unreadable subtrees are logged and skipped; a missing root lists as empty.
pub fn list_media_files_recursive(root: &Path) -> Vec<String> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.io_error().map(|io| io.kind()) != Some(ErrorKind::NotFound) {
                    tracing::warn!(error = %e, root = %root.display(), "Skipping unreadable output entry");
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_media_file_name(name) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        if let Some(parts) = parts {
            files.push(parts.join("/"));
        }
    }

    files.sort();
    files
}
