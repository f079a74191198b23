// ABOUTME: Favorite route handlers: toggle on a recipe and list a user's favorites
// ABOUTME: POST /api/recipes/:id/favorite and GET /api/favorites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::errors::AppError;
use crate::routes::recipes::RecipeSummaryResponse;
use crate::server::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for toggling a favorite
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteBody {
    /// User identifier (email)
    pub email: Option<String>,
}

/// Query parameters for listing favorites
#[derive(Debug, Deserialize)]
pub struct ListFavoritesQuery {
    /// User identifier (email)
    pub email: Option<String>,
}

/// Response for a favorite toggle
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteResponse {
    /// New favorite state
    pub is_favorite: bool,
}

/// Response for a user's favorite listing
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoritesResponse {
    /// Favorited recipe summaries, most recent first
    pub items: Vec<RecipeSummaryResponse>,
}

/// Favorite routes handler
pub struct FavoriteRoutes;

impl FavoriteRoutes {
    /// Create all favorite routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/recipes/:id/favorite", post(Self::handle_toggle))
            .route("/api/favorites", get(Self::handle_list))
            .with_state(resources)
    }

    /// Handle POST /api/recipes/:id/favorite - toggle favorite state
    async fn handle_toggle(
        State(resources): State<Arc<ServerResources>>,
        Path(recipe_id): Path<String>,
        Json(body): Json<ToggleFavoriteBody>,
    ) -> Result<Response, AppError> {
        let email = require_email(body.email)?;

        let is_favorite = resources
            .database
            .favorites()
            .toggle(&email, &recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;

        Ok((StatusCode::OK, Json(ToggleFavoriteResponse { is_favorite })).into_response())
    }

    /// Handle GET /api/favorites?email= - list a user's favorites
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListFavoritesQuery>,
    ) -> Result<Response, AppError> {
        let email = require_email(query.email)?;

        let items: Vec<RecipeSummaryResponse> = resources
            .database
            .favorites()
            .list_for_user(&email)
            .await?
            .into_iter()
            .map(RecipeSummaryResponse::from)
            .collect();

        Ok((StatusCode::OK, Json(FavoritesResponse { items })).into_response())
    }
}

fn require_email(email: Option<String>) -> Result<String, AppError> {
    email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::invalid_input("Missing email"))
}
