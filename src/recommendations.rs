// ABOUTME: Content-based recipe recommendations from a user's highly-rated reviews
// ABOUTME: Ranks candidates by tag overlap with the seed recipe, then aggregate rating, then recency
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::database::recipes::RecipeManager;
use crate::errors::{AppError, AppResult};
use crate::models::RecipeSummary;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Fixed result size for a recommendation request
pub const RECOMMENDATION_PAGE_SIZE: usize = 10;

/// Minimum rating for a review to seed recommendations: 0.8 x the 5-point
/// maximum. One normalized threshold everywhere; no mixed scales.
pub const HIGH_RATING_THRESHOLD: i64 = 4;

/// Generates ranked recipe suggestions for a user
pub struct RecommendationEngine {
    pool: SqlitePool,
    recipes: RecipeManager,
}

impl RecommendationEngine {
    /// Create a new recommendation engine over the shared pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let recipes = RecipeManager::new(pool.clone());
        Self { pool, recipes }
    }

    /// Recommend recipes for a user based on their highest-rated review
    ///
    /// The seed is the user's top review with rating >=
    /// [`HIGH_RATING_THRESHOLD`], ties broken by most recent. Candidates
    /// share at least one tag with the seed, exclude the seed itself and
    /// anything the user already reviewed, and are ranked by tag-overlap
    /// count, then aggregate rating, then publication recency.
    ///
    /// "Nothing to recommend" (no reviews, no qualifying seed, seed
    /// without tags, no overlapping candidates, or a dangling seed
    /// reference) is a successful empty result, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if a storage operation fails.
    pub async fn recommend_for_user(&self, user_email: &str) -> AppResult<Vec<RecipeSummary>> {
        // Reviews ranked by rating, then recency; the first qualifying row
        // is the seed.
        let review_rows = sqlx::query(
            r"
            SELECT recipe_id, rating
            FROM reviews
            WHERE author = $1
            ORDER BY rating DESC, created_at DESC, rowid DESC
            ",
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read user reviews: {e}")))?;

        if review_rows.is_empty() {
            return Ok(Vec::new());
        }

        let reviewed_ids: HashSet<String> = review_rows
            .iter()
            .map(|row| row.get::<String, _>("recipe_id"))
            .collect();

        let seed_id = review_rows
            .iter()
            .find(|row| row.get::<i64, _>("rating") >= HIGH_RATING_THRESHOLD)
            .map(|row| row.get::<String, _>("recipe_id"));
        let Some(seed_id) = seed_id else {
            debug!(user_email, "no review meets the high-rating threshold");
            return Ok(Vec::new());
        };

        let Some(seed) = self.recipes.get_recipe(&seed_id).await? else {
            // Dangling reference; the review outlived its recipe somehow.
            warn!(user_email, seed_id, "seed recipe missing, returning no recommendations");
            return Ok(Vec::new());
        };

        let seed_tags: HashSet<String> = seed.tags.iter().map(|t| t.to_lowercase()).collect();
        if seed_tags.is_empty() {
            debug!(seed_id, "seed recipe has no tags, nothing to overlap");
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(usize, RecipeSummary)> = self
            .recipes
            .list_all()
            .await?
            .into_iter()
            .filter(|candidate| candidate.id != seed.id && !reviewed_ids.contains(&candidate.id))
            .filter_map(|candidate| {
                let match_count = candidate
                    .tags
                    .iter()
                    .filter(|tag| seed_tags.contains(&tag.to_lowercase()))
                    .count();
                (match_count > 0).then(|| (match_count, RecipeSummary::from(candidate)))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| {
                    b.1.average_rating
                        .partial_cmp(&a.1.average_rating)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| b.1.published_at.cmp(&a.1.published_at))
        });

        let mut seen = HashSet::new();
        let results: Vec<RecipeSummary> = ranked
            .into_iter()
            .take(RECOMMENDATION_PAGE_SIZE)
            .map(|(_, summary)| summary)
            .filter(|summary| seen.insert(summary.id.clone()))
            .collect();

        Ok(results)
    }
}
