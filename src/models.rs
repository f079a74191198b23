// ABOUTME: Core data models for recipes, reviews and favorites
// ABOUTME: Recipes carry derived average_rating/review_count kept in sync by the rating aggregator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recipe with its derived rating fields
///
/// `average_rating` and `review_count` are maintained by the rating
/// aggregator and always reflect the recipe's current review set after a
/// successful mutation. `version` backs optimistic concurrency and is not
/// exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Opaque UUID string, unique
    pub id: String,
    /// Display title
    pub title: String,
    /// Longer free-text description
    pub description: String,
    /// Single category label (e.g. "dessert")
    pub category: String,
    /// Tag set used for browsing and recommendations
    pub tags: Vec<String>,
    /// Ingredient name -> quantity text, ordered by name
    pub ingredients: BTreeMap<String, String>,
    /// Ordered preparation steps
    pub instructions: Vec<String>,
    /// Image URLs in display order
    pub images: Vec<String>,
    /// Preparation time in minutes
    pub prep_time_mins: i64,
    /// Cooking time in minutes
    pub cook_time_mins: i64,
    /// Number of servings
    pub servings: i64,
    /// Publication timestamp
    pub published_at: DateTime<Utc>,
    /// Mean review rating rounded half-up to one decimal, 0 if unreviewed
    pub average_rating: f64,
    /// Number of reviews, always equal to the review row count
    pub review_count: i64,
    /// Optimistic-concurrency version, bumped on every review mutation
    #[serde(skip_serializing, default)]
    pub version: i64,
}

/// A single user-submitted rating and comment attached to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Opaque UUID string, unique across all recipes
    pub id: String,
    /// Owning recipe id
    pub recipe_id: String,
    /// Integer rating, 1 through 5
    pub rating: i64,
    /// Free-text comment
    pub comment: String,
    /// Reviewer identifier (email)
    pub author: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp; equals `created_at` until first edit
    pub updated_at: DateTime<Utc>,
}

/// A user's favorite marker on a recipe, unique per (user, recipe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    /// User identifier (email)
    pub user_email: String,
    /// Favorited recipe id
    pub recipe_id: String,
    /// When the favorite was created
    pub created_at: DateTime<Utc>,
}

/// Lightweight recipe projection for list, search and recommendation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    /// Recipe id
    pub id: String,
    /// Display title
    pub title: String,
    /// Description
    pub description: String,
    /// Category label
    pub category: String,
    /// Tag set
    pub tags: Vec<String>,
    /// First image URL, if any
    pub image: Option<String>,
    /// Preparation time in minutes
    pub prep_time_mins: i64,
    /// Cooking time in minutes
    pub cook_time_mins: i64,
    /// Publication timestamp
    pub published_at: DateTime<Utc>,
    /// Current aggregate rating
    pub average_rating: f64,
    /// Current review count
    pub review_count: i64,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            image: recipe.images.first().cloned(),
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            category: recipe.category,
            tags: recipe.tags,
            prep_time_mins: recipe.prep_time_mins,
            cook_time_mins: recipe.cook_time_mins,
            published_at: recipe.published_at,
            average_rating: recipe.average_rating,
            review_count: recipe.review_count,
        }
    }
}
