// ABOUTME: Unified error handling with stable error codes and HTTP responses
// ABOUTME: Every route handler returns AppError; IntoResponse maps codes to statuses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// Stable error classification shared by all components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or out-of-range input (missing field, rating out of bounds)
    InvalidInput,
    /// Referenced recipe or review does not exist
    NotFound,
    /// Optimistic-concurrency retries exhausted
    Conflict,
    /// Underlying storage failure
    DatabaseError,
    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// HTTP status this code surfaces as at the route boundary
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::DatabaseError | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error carrying a code and a client-safe message
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    /// Error classification
    pub code: ErrorCode,
    /// Human-readable message, safe to return to clients for 4xx codes
    pub message: String,
}

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Malformed input from the client
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Referenced entity does not exist
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Concurrent-mutation retry exhausted
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Storage-layer failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Unexpected internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON serialization failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.http_status();

        // 5xx details are logged server-side, never sent to the client
        let body = if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "internal error");
            json!({ "error": "internal server error" })
        } else {
            json!({ "error": self.message })
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::invalid_input("bad").code.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("missing").code.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::conflict("raced").code.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::database("boom").code.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_display() {
        let err = AppError::not_found("recipe abc not found");
        assert_eq!(err.to_string(), "recipe abc not found");
    }
}
