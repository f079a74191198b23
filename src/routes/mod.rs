// ABOUTME: Route module organization for the Ladle HTTP API
// ABOUTME: One routes struct per domain; thin handlers that delegate to the database managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

//! HTTP routes, organized by domain
//!
//! Each module exposes a `*Routes` struct whose `routes()` constructor
//! returns an axum `Router`. Handlers validate and parse request input into
//! typed values before anything reaches the core managers, and translate
//! typed `AppError`s into HTTP statuses on the way out.

/// Favorite toggling and listing
pub mod favorites;
/// Liveness endpoint
pub mod health;
/// Recipe browsing, search facade and recommendations
pub mod recipes;
/// Review CRUD endpoints
pub mod reviews;
