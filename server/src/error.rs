//! Grepable error codes shared by HTTP replies and error frames.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Trait for errors that carry a grepable code and a retry hint.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body of every non-2xx API reply.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ErrorBody {
    pub fn from_error(err: &impl ErrorCode) -> Self {
        Self { code: err.error_code(), message: err.to_string() }
    }
}

/// Pair an error with the HTTP status it maps to.
pub fn error_response(status: StatusCode, err: &impl ErrorCode) -> Response {
    (status, Json(ErrorBody::from_error(err))).into_response()
}

/// Error reply frame for a failed request.
#[must_use]
pub fn error_frame(req: &frames::Frame, err: &impl ErrorCode) -> frames::Frame {
    req.error(err.error_code(), err.to_string(), err.retryable())
}
