// ABOUTME: Health check route
// ABOUTME: Liveness JSON for load balancers and smoke tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    #[must_use]
    pub fn routes() -> Router {
        Router::new().route("/api/health", get(Self::handle_health))
    }

    async fn handle_health() -> impl IntoResponse {
        Json(json!({
            "status": "ok",
            "service": "ladle",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}
