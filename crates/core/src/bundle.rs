//! Idempotent archive bundling of a job's scene artifacts.
//!
//! A bundle is a single Deflate-compressed ZIP named [`BUNDLE_FILE_NAME`]
//! holding every media file directly inside the directory, each stored under
//! its bare filename. Once a bundle exists it is never rebuilt, even if more
//! artifacts appear later.

use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CoreError;
use crate::media;

/// Canonical bundle filename inside a job's output directory.
pub const BUNDLE_FILE_NAME: &str = "all_scenes.zip";

/// Entries at or above this size need ZIP64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Location of the bundle for `dir`.
pub fn bundle_path(dir: &Path) -> PathBuf {
    dir.join(BUNDLE_FILE_NAME)
}

/// Make sure `dir` holds a bundle of its media files.
///
/// Returns the bundle filename, or `None` when no bundle exists and there
/// are no media files to put in one. Source artifacts are never modified.
///
/// The archive is assembled in a temporary file next to the final path and
/// moved into place without overwriting, so concurrent callers never see a
/// partial bundle and at most one bundle is ever created.
pub fn ensure_bundle(dir: &Path) -> Result<Option<String>, CoreError> {
    let target = bundle_path(dir);
    if target.try_exists().map_err(|e| CoreError::io(&target, e))? {
        return Ok(Some(BUNDLE_FILE_NAME.to_string()));
    }

    let files = media::list_media_files(dir)?;
    if files.is_empty() {
        return Ok(None);
    }

    let mut staging = tempfile::Builder::new()
        .prefix(".all_scenes.")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| CoreError::io(dir, e))?;

    write_archive(dir, &files, staging.as_file_mut())?;

    match staging.persist_noclobber(&target) {
        Ok(_) => {
            tracing::info!(
                dir = %dir.display(),
                file_count = files.len(),
                "Scene bundle created",
            );
        }
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            tracing::debug!(dir = %dir.display(), "Scene bundle created concurrently");
        }
        Err(e) => return Err(CoreError::io(&target, e.error)),
    }

    Ok(Some(BUNDLE_FILE_NAME.to_string()))
}

/// Stream every file in `files` (names relative to `dir`) into a ZIP on `out`.
fn write_archive(dir: &Path, files: &[String], out: &mut File) -> Result<(), CoreError> {
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let base_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for name in files {
        let source_path = dir.join(name);
        let mut source = File::open(&source_path).map_err(|e| CoreError::io(&source_path, e))?;
        let size = source
            .metadata()
            .map_err(|e| CoreError::io(&source_path, e))?
            .len();

        zip.start_file(name.as_str(), base_options.large_file(size >= ZIP64_THRESHOLD))?;
        io::copy(&mut source, &mut zip).map_err(|e| CoreError::io(&source_path, e))?;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| CoreError::io(dir, e))?;
    Ok(())
}
