// ABOUTME: Rating aggregation: recomputes average_rating and review_count for one recipe
// ABOUTME: Invariant: after any review mutation, the stored aggregates match the review rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::errors::{AppError, AppResult};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::warn;

/// Recomputes a recipe's derived rating fields from its current review set
pub struct RatingAggregator {
    pool: SqlitePool,
}

impl RatingAggregator {
    /// Create a new rating aggregator
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Recompute and store `average_rating` / `review_count` for a recipe
    ///
    /// Idempotent: with no intervening review mutation, a second call writes
    /// the same values. A recipe that disappeared between the review
    /// mutation and this call is logged and ignored rather than treated as
    /// a hard failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn recompute(&self, recipe_id: &str) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let (average_rating, review_count) = aggregate_in_tx(&mut tx, recipe_id).await?;

        let result = sqlx::query(
            r"
            UPDATE recipes SET average_rating = $1, review_count = $2
            WHERE id = $3
            ",
        )
        .bind(average_rating)
        .bind(review_count)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to store aggregate: {e}")))?;

        if result.rows_affected() == 0 {
            warn!(recipe_id, "recipe vanished before rating recompute; skipping");
            return Ok(());
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit aggregate: {e}")))?;

        Ok(())
    }
}

/// Compute (average, count) for a recipe's reviews inside a transaction
///
/// Used by the review store so the aggregate write lands in the same
/// transaction as the review mutation; callers never observe a recipe with
/// stale aggregates after a successful mutation returns.
pub(crate) async fn aggregate_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: &str,
) -> AppResult<(f64, i64)> {
    let row = sqlx::query(
        r"
        SELECT COUNT(*) AS review_count, COALESCE(SUM(rating), 0) AS rating_sum
        FROM reviews
        WHERE recipe_id = $1
        ",
    )
    .bind(recipe_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::database(format!("Failed to aggregate reviews: {e}")))?;

    let count: i64 = row.get("review_count");
    let sum: i64 = row.get("rating_sum");

    Ok((round_average(sum, count), count))
}

/// Mean rating rounded half-up to one decimal place; 0 for an empty set
pub(crate) fn round_average(rating_sum: i64, review_count: i64) -> f64 {
    if review_count == 0 {
        return 0.0;
    }
    let tenths = (rating_sum * 10) as f64 / review_count as f64;
    (tenths + 0.5).floor() / 10.0
}
