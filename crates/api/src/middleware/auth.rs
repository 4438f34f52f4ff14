//! Shared-key bearer authentication extractor for job endpoints.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried the configured `JOB_API_KEY`.
///
/// Accepts `Authorization: Bearer <key>` as well as a bare `<key>` with no
/// scheme. Add this as an extractor parameter on every job handler:
///
/// ```ignore
/// async fn my_handler(_key: JobKey) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JobKey;

/// Pull the token out of an `Authorization` header value.
///
/// Returns an empty string for any other shape.
pub fn extract_bearer_token(header: &str) -> &str {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => token,
        (Some(token), None, None) => token,
        _ => "",
    }
}

impl FromRequestParts<AppState> for JobKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.job_api_key.as_deref() else {
            return Err(AppError::NotConfigured("JOB_API_KEY".into()));
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(extract_bearer_token)
            .unwrap_or("");

        if token.is_empty() || token != expected {
            return Err(AppError::Unauthorized(
                "Unauthorized for job endpoints".into(),
            ));
        }

        Ok(JobKey)
    }
}
