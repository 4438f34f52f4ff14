//! Request extractors whose rejections render as [`AppError`] JSON bodies.
//!
//! Use these instead of `axum::Json` / `axum::extract::Query` so malformed
//! input produces the same `{ "ok": false, ... }` envelope as every other
//! failure.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::error::AppError;

/// JSON body extractor rejecting with [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor rejecting with [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
