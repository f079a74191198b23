// ABOUTME: Review CRUD route handlers
// ABOUTME: POST/PUT/DELETE/GET on /api/recipes/:id/reviews with typed request bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::database::{NewReview, ReviewSort, ReviewSortKey, SortOrder, UpdateReview};
use crate::errors::{AppError, AppResult};
use crate::models::Review;
use crate::server::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for creating a review
///
/// Fields are optional so that missing values surface as 400 validation
/// errors instead of body-rejection responses.
#[derive(Debug, Deserialize)]
pub struct CreateReviewBody {
    /// Rating, must be an integer 1-5
    pub rating: Option<f64>,
    /// Review comment
    pub comment: Option<String>,
    /// Reviewer identifier (email)
    pub author: Option<String>,
}

/// Request body for updating a review
#[derive(Debug, Deserialize)]
pub struct UpdateReviewBody {
    /// New rating, must be an integer 1-5
    pub rating: Option<f64>,
    /// New comment
    pub comment: Option<String>,
}

/// Query parameters for PUT (review id to edit)
#[derive(Debug, Deserialize)]
pub struct EditReviewQuery {
    /// Id of the review to update
    #[serde(rename = "editId")]
    pub edit_id: Option<String>,
}

/// Query parameters for DELETE (review id to remove)
#[derive(Debug, Deserialize)]
pub struct DeleteReviewQuery {
    /// Id of the review to delete
    #[serde(rename = "deleteId")]
    pub delete_id: Option<String>,
}

/// Query parameters for listing reviews
#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    /// `rating` or `date`
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

/// A review as returned over the wire
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    /// Review id
    pub id: String,
    /// Owning recipe id
    pub recipe_id: String,
    /// Rating, 1-5
    pub rating: i64,
    /// Comment text
    pub comment: String,
    /// Reviewer identifier
    pub author: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last-update timestamp (RFC 3339)
    pub updated_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            recipe_id: review.recipe_id,
            rating: review.rating,
            comment: review.comment,
            author: review.author,
            created_at: review.created_at.to_rfc3339(),
            updated_at: review.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing a recipe's reviews
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListResponse {
    /// Reviews in the requested order
    pub reviews: Vec<ReviewResponse>,
    /// Aggregate rating for the recipe
    pub average_rating: f64,
    /// Review count for the recipe
    pub review_count: i64,
}

/// Confirmation for an update, echoing the new review state
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateReviewResponse {
    /// Confirmation message
    pub message: String,
    /// Updated review
    pub review: ReviewResponse,
}

/// Confirmation for a delete
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteReviewResponse {
    /// Confirmation message
    pub message: String,
}

/// Review routes handler
pub struct ReviewRoutes;

impl ReviewRoutes {
    /// Create all review routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/recipes/:id/reviews",
                post(Self::handle_create)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete)
                    .get(Self::handle_list),
            )
            .with_state(resources)
    }

    /// Handle POST /api/recipes/:id/reviews - submit a review
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        Path(recipe_id): Path<String>,
        Json(body): Json<CreateReviewBody>,
    ) -> Result<Response, AppError> {
        let review = NewReview {
            rating: parse_rating(body.rating)?,
            comment: body.comment.unwrap_or_default(),
            author: body.author.unwrap_or_default(),
        };

        let created = resources
            .database
            .reviews()
            .create_review(&recipe_id, &review)
            .await?;

        Ok((StatusCode::CREATED, Json(ReviewResponse::from(created))).into_response())
    }

    /// Handle PUT /api/recipes/:id/reviews?editId= - update a review
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        Path(_recipe_id): Path<String>,
        Query(query): Query<EditReviewQuery>,
        Json(body): Json<UpdateReviewBody>,
    ) -> Result<Response, AppError> {
        let review_id = query
            .edit_id
            .ok_or_else(|| AppError::invalid_input("Missing editId query parameter"))?;

        let update = UpdateReview {
            rating: parse_rating(body.rating)?,
            comment: body.comment.unwrap_or_default(),
        };

        let updated = resources
            .database
            .reviews()
            .update_review(&review_id, &update)
            .await?;

        let response = UpdateReviewResponse {
            message: "review updated".to_owned(),
            review: ReviewResponse::from(updated),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/recipes/:id/reviews?deleteId= - remove a review
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        Path(_recipe_id): Path<String>,
        Query(query): Query<DeleteReviewQuery>,
    ) -> Result<Response, AppError> {
        let review_id = query
            .delete_id
            .ok_or_else(|| AppError::invalid_input("Missing deleteId query parameter"))?;

        resources.database.reviews().delete_review(&review_id).await?;

        let response = DeleteReviewResponse {
            message: "review deleted".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/recipes/:id/reviews - list reviews with aggregates
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Path(recipe_id): Path<String>,
        Query(query): Query<ListReviewsQuery>,
    ) -> Result<Response, AppError> {
        let sort = ReviewSort {
            key: ReviewSortKey::parse(query.sort_by.as_deref().unwrap_or(""))?,
            order: SortOrder::parse(query.order.as_deref().unwrap_or(""))?,
        };

        let page = resources
            .database
            .reviews()
            .get_reviews(&recipe_id, sort)
            .await?;

        let response = ReviewListResponse {
            reviews: page.reviews.into_iter().map(ReviewResponse::from).collect(),
            average_rating: page.average_rating,
            review_count: page.review_count,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}

/// Require a rating value and reject non-integers before range checks
fn parse_rating(raw: Option<f64>) -> AppResult<i64> {
    let value = raw.ok_or_else(|| AppError::invalid_input("Missing required field 'rating'"))?;
    if value.fract() != 0.0 {
        return Err(AppError::invalid_input(format!(
            "Rating must be an integer, got {value}"
        )));
    }
    Ok(value as i64)
}
