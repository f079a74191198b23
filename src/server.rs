// ABOUTME: Server resource wiring and router assembly
// ABOUTME: Owns the dependency-injected database handle and recommendation engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::recommendations::RecommendationEngine;
use crate::routes::{
    favorites::FavoriteRoutes, health::HealthRoutes, recipes::RecipeRoutes, reviews::ReviewRoutes,
};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared resources injected into every route handler
///
/// Constructed once by the process entry point and passed by reference;
/// there is no process-global connection state.
pub struct ServerResources {
    /// Database handle (pool + domain managers)
    pub database: Database,
    /// Recommendation engine over the same pool
    pub recommendations: RecommendationEngine,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the server's shared resources
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let recommendations = RecommendationEngine::new(database.pool().clone());
        Self {
            database,
            recommendations,
            config,
        }
    }
}

/// Assemble the full application router with middleware
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let timeout = Duration::from_secs(resources.config.request_timeout_secs);
    let max_body = resources.config.max_body_bytes;

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(RecipeRoutes::routes(resources.clone()))
        .merge(ReviewRoutes::routes(resources.clone()))
        .merge(FavoriteRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .layer(RequestBodyLimitLayer::new(max_body))
}

/// Bind and serve until ctrl-c
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let port = resources.config.http_port;
    let router = build_router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind port {port}: {e}")))?;
    info!(port, "ladle server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("ladle server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
