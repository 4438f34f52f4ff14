//! Prompt blob decoding and scene counting.
//!
//! Clients upload the prompt file as base64, optionally wrapped in a data
//! URL (`data:text/plain;base64,...`). Each non-blank line is one scene.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CoreError;

/// Decode an uploaded prompt blob into text.
///
/// Everything up to and including the first `,` is treated as a data-URL
/// header and dropped. Whitespace inside the payload is ignored. Invalid
/// UTF-8 sequences are replaced rather than rejected.
pub fn decode_prompt_blob(blob: &str) -> Result<String, CoreError> {
    let payload = match blob.split_once(',') {
        Some((_header, rest)) => rest,
        None => blob,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CoreError::Validation(format!("Prompt blob is not valid base64: {e}")))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Number of scenes described by `text`: lines with non-whitespace content.
pub fn count_scenes(text: &str) -> u64 {
    text.lines().filter(|line| !line.trim().is_empty()).count() as u64
}

/// Persist decoded prompt text as `prompts_<uuid>.txt` inside `dir`.
///
/// Returns the full path of the written file. `dir` is created if needed.
pub fn save_prompts(dir: &Path, text: &str) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))?;
    let path = dir.join(format!("prompts_{}.txt", uuid::Uuid::new_v4().simple()));
    fs::write(&path, text).map_err(|e| CoreError::io(&path, e))?;
    Ok(path)
}
