// ABOUTME: Review store: CRUD on reviews with recipe-existence validation
// ABOUTME: Mutations recompute the recipe aggregate in the same write-locked transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::Review;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;
use uuid::Uuid;

use super::ratings;
use super::SortOrder;

/// Maximum attempts for a review mutation before giving up with `Conflict`
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Base delay between mutation retries; grows linearly with the attempt
const RETRY_BACKOFF: Duration = Duration::from_millis(15);

/// Minimum accepted rating
pub const MIN_RATING: i64 = 1;
/// Maximum accepted rating
pub const MAX_RATING: i64 = 5;

/// Request to create a review
#[derive(Debug, Clone)]
pub struct NewReview {
    /// Integer rating, 1 through 5
    pub rating: i64,
    /// Free-text comment, required
    pub comment: String,
    /// Reviewer identifier (email), required
    pub author: String,
}

/// Request to update an existing review's rating and comment
#[derive(Debug, Clone)]
pub struct UpdateReview {
    /// New rating, 1 through 5
    pub rating: i64,
    /// New comment
    pub comment: String,
}

/// Sort key for review listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSortKey {
    /// By rating value
    Rating,
    /// By creation date
    #[default]
    Date,
}

impl ReviewSortKey {
    /// Parse a user-facing sort key
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown keys.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "rating" => Ok(Self::Rating),
            "date" | "" => Ok(Self::Date),
            other => Err(AppError::invalid_input(format!(
                "Unknown review sort key '{other}'"
            ))),
        }
    }
}

/// Sort options for review listings
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewSort {
    /// Sort key
    pub key: ReviewSortKey,
    /// Sort direction
    pub order: SortOrder,
}

/// A recipe's reviews together with its current aggregate fields
#[derive(Debug, Clone)]
pub struct ReviewPage {
    /// Reviews in the requested order
    pub reviews: Vec<Review>,
    /// Stored aggregate rating
    pub average_rating: f64,
    /// Stored review count
    pub review_count: i64,
}

/// Review database operations manager
pub struct ReviewManager {
    pool: SqlitePool,
}

impl ReviewManager {
    /// Create a new review manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a review on a recipe
    ///
    /// The review insert, the aggregate recompute and the version bump all
    /// commit in one write-locked transaction; a caller that sees this
    /// return success will also see consistent
    /// `average_rating`/`review_count`. Lock contention and version races
    /// are retried with backoff before surfacing as `Conflict`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty author/comment or out-of-range rating,
    /// `NotFound` if the recipe does not exist, `Conflict` if concurrent
    /// mutations exhaust the retry attempts.
    pub async fn create_review(&self, recipe_id: &str, review: &NewReview) -> AppResult<Review> {
        validate_rating(review.rating)?;
        if review.author.trim().is_empty() {
            return Err(AppError::invalid_input("Review author must not be empty"));
        }
        if review.comment.trim().is_empty() {
            return Err(AppError::invalid_input("Review comment must not be empty"));
        }

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            match self.try_create(recipe_id, review).await {
                Ok(Some(created)) => return Ok(created),
                Ok(None) => {
                    warn!(recipe_id, attempt, "review create lost version race, retrying");
                }
                Err(err) if err.code == ErrorCode::Conflict => {
                    warn!(recipe_id, attempt, "write contention on review create, retrying");
                }
                Err(err) => return Err(err),
            }
            sleep(RETRY_BACKOFF * attempt).await;
        }

        Err(AppError::conflict(format!(
            "Concurrent review mutations on recipe {recipe_id}; please retry"
        )))
    }

    async fn try_create(&self, recipe_id: &str, review: &NewReview) -> AppResult<Option<Review>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let Some(version) = lock_recipe(&mut tx, recipe_id).await? else {
            return Err(AppError::not_found(format!("Recipe {recipe_id} not found")));
        };

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO reviews (id, recipe_id, rating, comment, author, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(&id)
        .bind(recipe_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(&review.author)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to create review", &e))?;

        if Self::write_aggregate(tx, recipe_id, version).await? {
            Ok(Some(Review {
                id,
                recipe_id: recipe_id.to_owned(),
                rating: review.rating,
                comment: review.comment.clone(),
                author: review.author.clone(),
                created_at: now,
                updated_at: now,
            }))
        } else {
            Ok(None)
        }
    }

    /// Update a review's rating and comment by review id
    ///
    /// The owning recipe is located from the review itself; callers do not
    /// need to know it.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an out-of-range rating or empty comment,
    /// `NotFound` if the review does not exist, `Conflict` on exhausted
    /// retries.
    pub async fn update_review(&self, review_id: &str, update: &UpdateReview) -> AppResult<Review> {
        validate_rating(update.rating)?;
        if update.comment.trim().is_empty() {
            return Err(AppError::invalid_input("Review comment must not be empty"));
        }

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            match self.try_update(review_id, update).await {
                Ok(Some(updated)) => return Ok(updated),
                Ok(None) => {
                    warn!(review_id, attempt, "review update lost version race, retrying");
                }
                Err(err) if err.code == ErrorCode::Conflict => {
                    warn!(review_id, attempt, "write contention on review update, retrying");
                }
                Err(err) => return Err(err),
            }
            sleep(RETRY_BACKOFF * attempt).await;
        }

        Err(AppError::conflict(format!(
            "Concurrent review mutations around review {review_id}; please retry"
        )))
    }

    async fn try_update(&self, review_id: &str, update: &UpdateReview) -> AppResult<Option<Review>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        if !lock_review(&mut tx, review_id).await? {
            return Err(AppError::not_found(format!("Review {review_id} not found")));
        }

        let review_row = sqlx::query(
            r"
            SELECT id, recipe_id, rating, comment, author, created_at, updated_at
            FROM reviews
            WHERE id = $1
            ",
        )
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to read review", &e))?;
        let existing = row_to_review(&review_row)?;

        let Some(version) = recipe_version(&mut tx, &existing.recipe_id).await? else {
            return Err(AppError::not_found(format!(
                "Recipe {} not found",
                existing.recipe_id
            )));
        };

        let now = Utc::now();
        sqlx::query(
            r"
            UPDATE reviews SET rating = $1, comment = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(update.rating)
        .bind(&update.comment)
        .bind(now.to_rfc3339())
        .bind(review_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to update review", &e))?;

        if Self::write_aggregate(tx, &existing.recipe_id, version).await? {
            Ok(Some(Review {
                rating: update.rating,
                comment: update.comment.clone(),
                updated_at: now,
                ..existing
            }))
        } else {
            Ok(None)
        }
    }

    /// Delete a review by id
    ///
    /// # Errors
    ///
    /// `NotFound` if the review does not exist, `Conflict` on exhausted
    /// retries.
    pub async fn delete_review(&self, review_id: &str) -> AppResult<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            match self.try_delete(review_id).await {
                Ok(Some(())) => return Ok(()),
                Ok(None) => {
                    warn!(review_id, attempt, "review delete lost version race, retrying");
                }
                Err(err) if err.code == ErrorCode::Conflict => {
                    warn!(review_id, attempt, "write contention on review delete, retrying");
                }
                Err(err) => return Err(err),
            }
            sleep(RETRY_BACKOFF * attempt).await;
        }

        Err(AppError::conflict(format!(
            "Concurrent review mutations around review {review_id}; please retry"
        )))
    }

    async fn try_delete(&self, review_id: &str) -> AppResult<Option<()>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        if !lock_review(&mut tx, review_id).await? {
            return Err(AppError::not_found(format!("Review {review_id} not found")));
        }

        let review_row = sqlx::query("SELECT recipe_id FROM reviews WHERE id = $1")
            .bind(review_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| write_error("Failed to read review", &e))?;
        let recipe_id: String = review_row.get("recipe_id");

        let Some(version) = recipe_version(&mut tx, &recipe_id).await? else {
            return Err(AppError::not_found(format!("Recipe {recipe_id} not found")));
        };

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error("Failed to delete review", &e))?;

        if Self::write_aggregate(tx, &recipe_id, version).await? {
            Ok(Some(()))
        } else {
            Ok(None)
        }
    }

    /// List a recipe's reviews with its stored aggregate fields
    ///
    /// Both reads happen inside one transaction, so the returned list
    /// always agrees with the aggregate fields even under concurrent
    /// mutations. Ties on the sort key preserve insertion order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the recipe does not exist.
    pub async fn get_reviews(&self, recipe_id: &str, sort: ReviewSort) -> AppResult<ReviewPage> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let Some(recipe_row) =
            sqlx::query("SELECT average_rating, review_count FROM recipes WHERE id = $1")
                .bind(recipe_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to read recipe: {e}")))?
        else {
            return Err(AppError::not_found(format!("Recipe {recipe_id} not found")));
        };

        let order_clause = match (sort.key, sort.order) {
            (ReviewSortKey::Rating, SortOrder::Asc) => "rating ASC, rowid ASC",
            (ReviewSortKey::Rating, SortOrder::Desc) => "rating DESC, rowid ASC",
            (ReviewSortKey::Date, SortOrder::Asc) => "created_at ASC, rowid ASC",
            (ReviewSortKey::Date, SortOrder::Desc) => "created_at DESC, rowid ASC",
        };
        let query = format!(
            r"
            SELECT id, recipe_id, rating, comment, author, created_at, updated_at
            FROM reviews
            WHERE recipe_id = $1
            ORDER BY {order_clause}
            "
        );

        let rows = sqlx::query(&query)
            .bind(recipe_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to list reviews: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to finish review listing: {e}")))?;

        let reviews = rows
            .iter()
            .map(row_to_review)
            .collect::<AppResult<Vec<Review>>>()?;

        Ok(ReviewPage {
            reviews,
            average_rating: recipe_row.get("average_rating"),
            review_count: recipe_row.get("review_count"),
        })
    }

    /// Recompute the aggregate, bump the recipe version and commit `tx`
    ///
    /// Returns false when another writer bumped the version first; the
    /// transaction is dropped (rolled back) and the caller retries. With
    /// the write lock claimed up front this is a backstop, not the normal
    /// contention path.
    async fn write_aggregate(
        mut tx: sqlx::Transaction<'_, sqlx::Sqlite>,
        recipe_id: &str,
        expected_version: i64,
    ) -> AppResult<bool> {
        let (average_rating, review_count) = ratings::aggregate_in_tx(&mut tx, recipe_id).await?;

        let result = sqlx::query(
            r"
            UPDATE recipes
            SET average_rating = $1, review_count = $2, version = version + 1
            WHERE id = $3 AND version = $4
            ",
        )
        .bind(average_rating)
        .bind(review_count)
        .bind(recipe_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("Failed to store aggregate", &e))?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit()
            .await
            .map_err(|e| write_error("Failed to commit review mutation", &e))?;

        Ok(true)
    }
}

/// Claim the database write lock and read the recipe's current version
///
/// The no-op update is the transaction's first statement on purpose: it
/// makes SQLite acquire the write lock immediately, queueing concurrent
/// writers on the busy handler. A read-first transaction would instead take
/// a snapshot and fail the later write with an unretryable busy error.
///
/// Returns `None` if the recipe does not exist.
async fn lock_recipe(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    recipe_id: &str,
) -> AppResult<Option<i64>> {
    let claimed = sqlx::query("UPDATE recipes SET version = version WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| write_error("Failed to lock recipe", &e))?;
    if claimed.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query("SELECT version FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| write_error("Failed to read recipe version", &e))?;
    Ok(Some(row.get("version")))
}

/// Claim the database write lock via the review row; false if it is missing
async fn lock_review(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    review_id: &str,
) -> AppResult<bool> {
    let claimed = sqlx::query("UPDATE reviews SET id = id WHERE id = $1")
        .bind(review_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| write_error("Failed to lock review", &e))?;
    Ok(claimed.rows_affected() > 0)
}

/// Read a recipe's version inside an already write-locked transaction
async fn recipe_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    recipe_id: &str,
) -> AppResult<Option<i64>> {
    let row = sqlx::query("SELECT version FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| write_error("Failed to read recipe version", &e))?;
    Ok(row.map(|r| r.get("version")))
}

/// Map a mutation failure, classifying lock contention as retryable
///
/// SQLITE_BUSY/SQLITE_LOCKED (and their extended variants, including
/// snapshot upgrades) become `Conflict` so the attempt loop retries them
/// instead of surfacing a 500.
fn write_error(context: &str, err: &sqlx::Error) -> AppError {
    if is_lock_contention(err) {
        AppError::conflict(format!("{context}: database write lock contention"))
    } else {
        AppError::database(format!("{context}: {err}"))
    }
}

// SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_BUSY_RECOVERY (261),
// SQLITE_BUSY_SNAPSHOT (517), SQLITE_LOCKED_SHAREDCACHE (262)
fn is_lock_contention(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| matches!(code.as_ref(), "5" | "6" | "261" | "262" | "517"))
}

fn validate_rating(rating: i64) -> AppResult<()> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!(
            "Rating must be an integer between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

pub(crate) fn row_to_review(row: &SqliteRow) -> AppResult<Review> {
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(Review {
        id: row.get("id"),
        recipe_id: row.get("recipe_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        author: row.get("author"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
    })
}
