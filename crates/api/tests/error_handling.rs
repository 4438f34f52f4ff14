//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each `AppError` variant produces the correct HTTP
//! status code, error code, and message. They do NOT need an HTTP server --
//! they call `IntoResponse` directly on `AppError` values.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use flowgen_api::error::AppError;
use flowgen_core::error::CoreError;
use flowgen_store::StoreError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: AppError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(AppError::NotFound("/nope".into())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "No resource at /nope");
}

// ---------------------------------------------------------------------------
// Test: AppError::Timeout maps to 408 with a JSON body
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeout_error_returns_408() {
    let (status, json) = error_to_response(AppError::Timeout).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "TIMEOUT");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Validation maps to 400 with VALIDATION_ERROR code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("bad id".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "bad id");
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid field value");
}

// ---------------------------------------------------------------------------
// Test: AppError::Unauthorized maps to 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let (status, json) = error_to_response(AppError::Unauthorized("nope".into())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Test: AppError::NotConfigured names the missing setting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_configured_error_returns_500() {
    let (status, json) = error_to_response(AppError::NotConfigured("JOB_API_KEY".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "NOT_CONFIGURED");
    assert_eq!(json["error"], "JOB_API_KEY not configured on server");
}

// ---------------------------------------------------------------------------
// Test: I/O and store errors are sanitized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn io_error_does_not_leak_paths() {
    let err = AppError::Core(CoreError::io(
        PathBuf::from("/secret/path"),
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn store_error_returns_500() {
    let err = AppError::Store(StoreError::Io {
        path: PathBuf::from("/jobs/x/meta.json"),
        source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("/jobs"));
}

// ---------------------------------------------------------------------------
// Test: AppError::InternalError maps to 500 with sanitized message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_sanitized() {
    let (status, json) = error_to_response(AppError::InternalError("boom".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}
