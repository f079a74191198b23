// ABOUTME: Environment-based server configuration
// ABOUTME: Reads HTTP_PORT, DATABASE_URL and request limits with sensible defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::errors::{AppError, AppResult};
use std::env;

/// Server configuration loaded from the process environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds to
    pub http_port: u16,
    /// SQLite database URL (e.g. `sqlite:ladle.db` or `sqlite::memory:`)
    pub database_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but unparseable.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::internal(format!("Invalid HTTP_PORT '{raw}': {e}")))?,
            Err(_) => 8080,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:ladle.db".to_owned());

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                AppError::internal(format!("Invalid REQUEST_TIMEOUT_SECS '{raw}': {e}"))
            })?,
            Err(_) => 30,
        };

        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| AppError::internal(format!("Invalid MAX_BODY_BYTES '{raw}': {e}")))?,
            Err(_) => 1024 * 1024,
        };

        Ok(Self {
            http_port,
            database_url,
            request_timeout_secs,
            max_body_bytes,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            database_url: "sqlite:ladle.db".to_owned(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}
