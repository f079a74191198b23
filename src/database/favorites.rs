// ABOUTME: Favorite associations between a user and a recipe
// ABOUTME: Unique per (user, recipe); toggled by user action, never otherwise mutated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::errors::{AppError, AppResult};
use crate::models::RecipeSummary;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::recipes::row_to_recipe;

/// Favorite database operations manager
pub struct FavoriteManager {
    pool: SqlitePool,
}

impl FavoriteManager {
    /// Create a new favorite manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Toggle a user's favorite on a recipe
    ///
    /// Returns the new favorite state, or `None` if the recipe does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn toggle(&self, user_email: &str, recipe_id: &str) -> AppResult<Option<bool>> {
        let recipe_exists = sqlx::query("SELECT id FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read recipe: {e}")))?
            .is_some();
        if !recipe_exists {
            return Ok(None);
        }

        let existing = sqlx::query(
            r"
            SELECT recipe_id FROM favorites
            WHERE user_email = $1 AND recipe_id = $2
            ",
        )
        .bind(user_email)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read favorite: {e}")))?;

        if existing.is_some() {
            sqlx::query(
                r"
                DELETE FROM favorites
                WHERE user_email = $1 AND recipe_id = $2
                ",
            )
            .bind(user_email)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to remove favorite: {e}")))?;
            Ok(Some(false))
        } else {
            sqlx::query(
                r"
                INSERT INTO favorites (user_email, recipe_id, created_at)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(user_email)
            .bind(recipe_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to add favorite: {e}")))?;
            Ok(Some(true))
        }
    }

    /// Whether a user has favorited a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn is_favorite(&self, user_email: &str, recipe_id: &str) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            SELECT recipe_id FROM favorites
            WHERE user_email = $1 AND recipe_id = $2
            ",
        )
        .bind(user_email)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read favorite: {e}")))?;

        Ok(row.is_some())
    }

    /// List a user's favorited recipes, most recently favorited first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_for_user(&self, user_email: &str) -> AppResult<Vec<RecipeSummary>> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.title, r.description, r.category, r.tags, r.ingredients,
                   r.instructions, r.images, r.prep_time_mins, r.cook_time_mins,
                   r.servings, r.published_at, r.average_rating, r.review_count, r.version
            FROM favorites f
            JOIN recipes r ON r.id = f.recipe_id
            WHERE f.user_email = $1
            ORDER BY f.created_at DESC, f.rowid DESC
            ",
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list favorites: {e}")))?;

        rows.iter()
            .map(|row| row_to_recipe(row).map(RecipeSummary::from))
            .collect()
    }

    /// Count favorites for a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn count_for_recipe(&self, recipe_id: &str) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM favorites WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count favorites: {e}")))?;

        Ok(row.get("count"))
    }
}
