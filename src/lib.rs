// ABOUTME: Library entry point for the Ladle recipe service
// ABOUTME: Review/rating aggregation, tag-based recommendations and the recipe query facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

//! # Ladle
//!
//! A server-rendered recipe application's data core: review and rating
//! aggregation, content-based recommendations, favorites, and the
//! query/sort/search facade behind recipe browsing.
//!
//! ## Invariant
//!
//! After any successful review mutation, a recipe's `average_rating` equals
//! the mean of its review ratings rounded half-up to one decimal (0 when
//! unreviewed) and `review_count` equals the number of reviews. Mutations
//! recompute both fields inside the same per-recipe optimistic-concurrency
//! transaction, so callers never observe stale aggregates.
//!
//! ## Architecture
//!
//! - **database**: `sqlx`/SQLite managers per domain (recipes, reviews,
//!   ratings, favorites), each borrowing a shared pool
//! - **recommendations**: tag-overlap ranking seeded by a user's
//!   highest-rated review
//! - **routes**: axum handlers translating typed errors into HTTP statuses
//! - **server**: dependency-injected resource wiring and router assembly

/// Environment-based server configuration
pub mod config;

/// Database managers and the connection pool
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Core data models for recipes, reviews and favorites
pub mod models;

/// Content-based recommendation engine
pub mod recommendations;

/// HTTP route handlers
pub mod routes;

/// Server resources and router assembly
pub mod server;
