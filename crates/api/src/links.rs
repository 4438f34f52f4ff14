//! Building client-facing artifact URLs.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;

use crate::state::AppState;

/// Path prefix under which the output root is served.
pub const OUTPUT_MOUNT: &str = "/output";

/// Base URL (scheme + authority, no trailing slash) used in artifact links.
///
/// Taken from `NODE_PUBLIC_URL` when configured, otherwise derived from the
/// request's `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl BaseUrl {
    /// URL of `relative` (a `/`-separated path under the output root).
    pub fn output_url(&self, relative: &str) -> String {
        format!("{}{OUTPUT_MOUNT}/{relative}", self.0)
    }

    /// URL of `file_name` inside the output folder `folder`.
    pub fn folder_file_url(&self, folder: &str, file_name: &str) -> String {
        self.output_url(&format!("{folder}/{file_name}"))
    }
}

impl FromRequestParts<AppState> for BaseUrl {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let configured = &state.config.node.public_url;
        if !configured.is_empty() {
            return Ok(BaseUrl(configured.clone()));
        }

        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");

        Ok(BaseUrl(format!("http://{host}")))
    }
}
