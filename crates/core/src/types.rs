//! Shared identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum accepted length of a job id or output folder name.
const MAX_ID_LEN: usize = 128;

/// Opaque job identifier.
///
/// Freshly generated ids are 32 lowercase hex characters (a v4 UUID in
/// simple form). Ids parsed from clients only need to be a single safe
/// path segment, since they are joined onto the jobs and output roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new random job id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parse a client-supplied id, rejecting anything that is not a plain
    /// path segment.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        validate_path_segment(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate that `raw` can be joined onto a root directory without escaping it.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_ID_LEN` characters.
/// - Must contain only ASCII alphanumeric, hyphen, or underscore characters.
pub fn validate_path_segment(raw: &str) -> Result<(), CoreError> {
    if raw.is_empty() {
        return Err(CoreError::Validation("Identifier must not be empty".to_string()));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Identifier must not exceed {MAX_ID_LEN} characters"
        )));
    }
    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "Identifier may only contain alphanumeric, hyphen, or underscore characters"
                .to_string(),
        ));
    }
    Ok(())
}
