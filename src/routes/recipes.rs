// ABOUTME: Recipe browsing routes: search facade, detail, categories and recommendations
// ABOUTME: GET /api/recipes translates filter/sort/search query parameters into a RecipeQuery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::database::{NewRecipe, RecipeQuery, RecipeSortKey, SortOrder};
use crate::database::recipes::DEFAULT_PAGE_SIZE;
use crate::errors::AppError;
use crate::models::{Recipe, RecipeSummary};
use crate::server::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Query parameters for the recipe listing facade
#[derive(Debug, Deserialize, Default)]
pub struct ListRecipesQuery {
    /// Free-text search
    pub search: Option<String>,
    /// Exact category filter
    pub category: Option<String>,
    /// Tag membership filter; `tags` accepted as an alias
    #[serde(alias = "tags")]
    pub tag: Option<String>,
    /// Ingredient-name membership filter
    pub ingredient: Option<String>,
    /// Sort key: default, newest, prepTime, cookTime, steps
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// Sort direction: asc or desc
    pub order: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size, capped server-side
    pub limit: Option<u32>,
}

/// Query parameters for recommendations
#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    /// User identifier (email)
    pub email: Option<String>,
}

/// Request body for creating a recipe (the ingestion seam)
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeBody {
    /// Title, required
    pub title: Option<String>,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category label
    #[serde(default)]
    pub category: String,
    /// Tag set
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ingredient name -> quantity text
    #[serde(default)]
    pub ingredients: BTreeMap<String, String>,
    /// Ordered preparation steps
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
    /// Preparation time in minutes
    #[serde(default)]
    pub prep_time_mins: i64,
    /// Cooking time in minutes
    #[serde(default)]
    pub cook_time_mins: i64,
    /// Number of servings
    #[serde(default = "default_servings")]
    pub servings: i64,
}

const fn default_servings() -> i64 {
    1
}

/// A recipe summary as returned over the wire
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummaryResponse {
    /// Recipe id
    pub id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Category
    pub category: String,
    /// Tags
    pub tags: Vec<String>,
    /// First image URL, if any
    pub image: Option<String>,
    /// Preparation time in minutes
    pub prep_time_mins: i64,
    /// Cooking time in minutes
    pub cook_time_mins: i64,
    /// Publication timestamp (RFC 3339)
    pub published_at: String,
    /// Aggregate rating
    pub average_rating: f64,
    /// Review count
    pub review_count: i64,
}

impl From<RecipeSummary> for RecipeSummaryResponse {
    fn from(summary: RecipeSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            description: summary.description,
            category: summary.category,
            tags: summary.tags,
            image: summary.image,
            prep_time_mins: summary.prep_time_mins,
            cook_time_mins: summary.cook_time_mins,
            published_at: summary.published_at.to_rfc3339(),
            average_rating: summary.average_rating,
            review_count: summary.review_count,
        }
    }
}

/// A full recipe as returned over the wire
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    /// Recipe id
    pub id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Category
    pub category: String,
    /// Tags
    pub tags: Vec<String>,
    /// Ingredient name -> quantity text
    pub ingredients: BTreeMap<String, String>,
    /// Ordered preparation steps
    pub instructions: Vec<String>,
    /// Image URLs
    pub images: Vec<String>,
    /// Preparation time in minutes
    pub prep_time_mins: i64,
    /// Cooking time in minutes
    pub cook_time_mins: i64,
    /// Number of servings
    pub servings: i64,
    /// Publication timestamp (RFC 3339)
    pub published_at: String,
    /// Aggregate rating
    pub average_rating: f64,
    /// Review count
    pub review_count: i64,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            category: recipe.category,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            images: recipe.images,
            prep_time_mins: recipe.prep_time_mins,
            cook_time_mins: recipe.cook_time_mins,
            servings: recipe.servings,
            published_at: recipe.published_at.to_rfc3339(),
            average_rating: recipe.average_rating,
            review_count: recipe.review_count,
        }
    }
}

/// One page of the recipe listing facade
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePageResponse {
    /// Summaries for the requested page, possibly empty
    pub items: Vec<RecipeSummaryResponse>,
    /// Echo of the requested page
    pub current_page: u32,
    /// Total pages for the filtered set, minimum 1
    pub total_pages: u32,
    /// Total matches before pagination
    pub total_count: u64,
}

/// Response for the category listing
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    /// Distinct category labels, alphabetical
    pub categories: Vec<String>,
}

/// Recipe routes handler
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/recipes",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/recipes/categories", get(Self::handle_categories))
            .route(
                "/api/recipes/recommendations",
                get(Self::handle_recommendations),
            )
            .route("/api/recipes/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle GET /api/recipes - the query/sort/search facade
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListRecipesQuery>,
    ) -> Result<Response, AppError> {
        let recipe_query = RecipeQuery {
            search: query.search,
            category: query.category,
            tag: query.tag,
            ingredient: query.ingredient,
            sort_by: RecipeSortKey::parse(query.sort_by.as_deref().unwrap_or(""))?,
            order: SortOrder::parse(query.order.as_deref().unwrap_or(""))?,
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        };

        let page = resources
            .database
            .recipes()
            .query_recipes(&recipe_query)
            .await?;

        let response = RecipePageResponse {
            items: page
                .items
                .into_iter()
                .map(RecipeSummaryResponse::from)
                .collect(),
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_count: page.total_count,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/recipes - create a recipe
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<CreateRecipeBody>,
    ) -> Result<Response, AppError> {
        let recipe = NewRecipe {
            title: body.title.unwrap_or_default(),
            description: body.description,
            category: body.category,
            tags: body.tags,
            ingredients: body.ingredients,
            instructions: body.instructions,
            images: body.images,
            prep_time_mins: body.prep_time_mins,
            cook_time_mins: body.cook_time_mins,
            servings: body.servings,
            published_at: None,
        };

        let created = resources.database.recipes().create_recipe(&recipe).await?;

        Ok((StatusCode::CREATED, Json(RecipeResponse::from(created))).into_response())
    }

    /// Handle GET /api/recipes/categories - distinct category labels
    async fn handle_categories(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let categories = resources.database.recipes().list_categories().await?;
        Ok((StatusCode::OK, Json(CategoriesResponse { categories })).into_response())
    }

    /// Handle GET /api/recipes/recommendations?email= - suggestions for a user
    async fn handle_recommendations(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<RecommendationsQuery>,
    ) -> Result<Response, AppError> {
        let email = query
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input("Missing email query parameter"))?;

        let recommendations = resources
            .recommendations
            .recommend_for_user(&email)
            .await?;

        let items: Vec<RecipeSummaryResponse> = recommendations
            .into_iter()
            .map(RecipeSummaryResponse::from)
            .collect();
        Ok((StatusCode::OK, Json(items)).into_response())
    }

    /// Handle GET /api/recipes/:id - recipe detail
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(recipe_id): Path<String>,
    ) -> Result<Response, AppError> {
        let recipe = resources
            .database
            .recipes()
            .get_recipe(&recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;

        Ok((StatusCode::OK, Json(RecipeResponse::from(recipe))).into_response())
    }
}
