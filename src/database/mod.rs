// ABOUTME: Database connection management and migration entry point
// ABOUTME: Domain managers (recipes, reviews, ratings, favorites) each borrow the shared pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

/// Favorite associations between users and recipes
pub mod favorites;
/// Derived rating recomputation for a single recipe
pub mod ratings;
/// Recipe storage plus the query/sort/search facade
pub mod recipes;
/// Review CRUD with per-recipe optimistic concurrency
pub mod reviews;

pub use favorites::FavoriteManager;
pub use ratings::RatingAggregator;
pub use recipes::{NewRecipe, RecipeManager, RecipePage, RecipeQuery, RecipeSortKey};
pub use reviews::{NewReview, ReviewManager, ReviewPage, ReviewSort, ReviewSortKey, UpdateReview};

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// How long a writer queues on SQLite's write lock before failing busy
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sort direction shared by review and recipe listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a user-facing order value
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anything other than `asc`/`desc`.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" | "" => Ok(Self::Desc),
            other => Err(AppError::invalid_input(format!(
                "Unknown sort order '{other}'"
            ))),
        }
    }
}

/// Database connection pool shared by all domain managers
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run pending migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let pool = if database_url.contains(":memory:") {
            // An in-memory database exists per connection; a larger pool
            // would hand each caller its own empty schema.
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(database_url)
                .await
        } else {
            let options = SqliteConnectOptions::from_str(database_url)
                .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                // Writers queue on the lock instead of failing fast
                .busy_timeout(BUSY_TIMEOUT);
            SqlitePoolOptions::new().connect_with(options).await
        }
        .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run all pending migrations embedded from ./migrations at compile time
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails.
    pub async fn migrate(&self) -> AppResult<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get a reference to the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Recipe manager bound to this database
    #[must_use]
    pub fn recipes(&self) -> RecipeManager {
        RecipeManager::new(self.pool.clone())
    }

    /// Review manager bound to this database
    #[must_use]
    pub fn reviews(&self) -> ReviewManager {
        ReviewManager::new(self.pool.clone())
    }

    /// Rating aggregator bound to this database
    #[must_use]
    pub fn ratings(&self) -> RatingAggregator {
        RatingAggregator::new(self.pool.clone())
    }

    /// Favorite manager bound to this database
    #[must_use]
    pub fn favorites(&self) -> FavoriteManager {
        FavoriteManager::new(self.pool.clone())
    }
}
