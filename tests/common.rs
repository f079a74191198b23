// ABOUTME: Shared test utilities: in-memory database setup and recipe seeding
// ABOUTME: Keeps per-test boilerplate down across the integration suites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs, dead_code)]

use chrono::{DateTime, Utc};
use ladle::config::ServerConfig;
use ladle::database::{Database, NewRecipe};
use ladle::models::Recipe;
use ladle::server::ServerResources;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Create an in-memory database with migrations applied
pub async fn create_test_database() -> Database {
    Database::new("sqlite::memory:").await.unwrap()
}

/// Create full server resources over an in-memory database
pub async fn create_test_resources() -> Arc<ServerResources> {
    let database = create_test_database().await;
    Arc::new(ServerResources::new(database, ServerConfig::default()))
}

/// A minimal recipe request; tests adjust fields before seeding
pub fn new_recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_owned(),
        description: String::new(),
        category: String::new(),
        tags: Vec::new(),
        ingredients: BTreeMap::new(),
        instructions: Vec::new(),
        images: Vec::new(),
        prep_time_mins: 10,
        cook_time_mins: 20,
        servings: 2,
        published_at: None,
    }
}

/// A recipe request with category and tags, the common case
pub fn tagged_recipe(title: &str, category: &str, tags: &[&str]) -> NewRecipe {
    let mut recipe = new_recipe(title);
    recipe.category = category.to_owned();
    recipe.tags = tags.iter().map(|&t| t.to_owned()).collect();
    recipe
}

/// Insert a recipe and return it
pub async fn seed_recipe(database: &Database, recipe: &NewRecipe) -> Recipe {
    database.recipes().create_recipe(recipe).await.unwrap()
}

/// Fixed timestamp helper for deterministic recency ordering
pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}
