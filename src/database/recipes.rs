// ABOUTME: Recipe storage and the query/sort/search facade
// ABOUTME: Translates filter/sort/search parameters into SQL plus post-fetch sorting and pagination
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

use crate::errors::{AppError, AppResult};
use crate::models::{Recipe, RecipeSummary};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::SortOrder;

/// Default page size for recipe listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Hard cap on page size to prevent unbounded result sets
pub const MAX_PAGE_SIZE: u32 = 50;

// Free-text relevance weights: title matches outrank description matches,
// which outrank tag matches.
const TITLE_WEIGHT: i64 = 3;
const DESCRIPTION_WEIGHT: i64 = 2;
const TAG_WEIGHT: i64 = 1;

/// Request to create a recipe (the ingestion seam)
#[derive(Debug, Clone)]
pub struct NewRecipe {
    /// Display title, required
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Category label
    pub category: String,
    /// Tag set
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
    /// Publication timestamp; defaults to now
    pub published_at: Option<DateTime<Utc>>,
}

/// Sort key for recipe listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipeSortKey {
    /// Relevance order for searches, insertion order otherwise
    #[default]
    Default,
    /// Publication date
    Newest,
    /// Preparation time in minutes
    PrepTime,
    /// Cooking time in minutes
    CookTime,
    /// Number of instruction steps
    Steps,
}

impl RecipeSortKey {
    /// Parse a user-facing sort key
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown keys.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "default" | "" => Ok(Self::Default),
            "newest" => Ok(Self::Newest),
            "prepTime" | "prep_time" => Ok(Self::PrepTime),
            "cookTime" | "cook_time" => Ok(Self::CookTime),
            "steps" => Ok(Self::Steps),
            other => Err(AppError::invalid_input(format!(
                "Unknown sort key '{other}'"
            ))),
        }
    }
}

/// Filter, sort and pagination parameters for recipe listings
#[derive(Debug, Clone)]
pub struct RecipeQuery {
    /// Free-text search across title, description and tags
    pub search: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    /// Tag membership
    pub tag: Option<String>,
    /// Ingredient-name membership
    pub ingredient: Option<String>,
    /// Sort key
    pub sort_by: RecipeSortKey,
    /// Sort direction (ignored for the default relevance/insertion order)
    pub order: SortOrder,
    /// 1-based page number
    pub page: u32,
    /// Page size; 0 falls back to the default, larger values are capped
    pub limit: u32,
}

impl Default for RecipeQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            tag: None,
            ingredient: None,
            sort_by: RecipeSortKey::Default,
            order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of recipe summaries
#[derive(Debug, Clone)]
pub struct RecipePage {
    /// Summaries for the requested page, possibly empty
    pub items: Vec<RecipeSummary>,
    /// Echo of the requested page number
    pub current_page: u32,
    /// Total pages for the filtered set, minimum 1
    pub total_pages: u32,
    /// Total matching recipes before pagination
    pub total_count: u64,
}

/// Recipe database operations manager
pub struct RecipeManager {
    pool: SqlitePool,
}

impl RecipeManager {
    /// Create a new recipe manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new recipe
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the title is empty, or a database error.
    pub async fn create_recipe(&self, recipe: &NewRecipe) -> AppResult<Recipe> {
        if recipe.title.trim().is_empty() {
            return Err(AppError::invalid_input("Recipe title must not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let published_at = recipe.published_at.unwrap_or_else(Utc::now);
        let tags_json = serde_json::to_string(&recipe.tags)?;
        let ingredients_json = serde_json::to_string(&recipe.ingredients)?;
        let instructions_json = serde_json::to_string(&recipe.instructions)?;
        let images_json = serde_json::to_string(&recipe.images)?;

        sqlx::query(
            r"
            INSERT INTO recipes (
                id, title, description, category, tags, ingredients,
                instructions, images, prep_time_mins, cook_time_mins,
                servings, published_at, average_rating, review_count, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, 0, 0)
            ",
        )
        .bind(&id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(&recipe.category)
        .bind(&tags_json)
        .bind(&ingredients_json)
        .bind(&instructions_json)
        .bind(&images_json)
        .bind(recipe.prep_time_mins)
        .bind(recipe.cook_time_mins)
        .bind(recipe.servings)
        .bind(published_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create recipe: {e}")))?;

        Ok(Recipe {
            id,
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            category: recipe.category.clone(),
            tags: recipe.tags.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            images: recipe.images.clone(),
            prep_time_mins: recipe.prep_time_mins,
            cook_time_mins: recipe.cook_time_mins,
            servings: recipe.servings,
            published_at,
            average_rating: 0.0,
            review_count: 0,
            version: 0,
        })
    }

    /// Get a recipe by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_recipe(&self, recipe_id: &str) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, category, tags, ingredients,
                   instructions, images, prep_time_mins, cook_time_mins,
                   servings, published_at, average_rating, review_count, version
            FROM recipes
            WHERE id = $1
            ",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        row.map(|r| row_to_recipe(&r)).transpose()
    }

    /// List all recipes in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_all(&self) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, category, tags, ingredients,
                   instructions, images, prep_time_mins, cook_time_mins,
                   servings, published_at, average_rating, review_count, version
            FROM recipes
            ORDER BY rowid
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list recipes: {e}")))?;

        rows.iter().map(row_to_recipe).collect()
    }

    /// List distinct non-empty categories, alphabetically
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_categories(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT category FROM recipes
            WHERE category != ''
            ORDER BY category
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list categories: {e}")))?;

        Ok(rows.iter().map(|r| r.get("category")).collect())
    }

    /// Run the query/sort/search facade over the recipe set
    ///
    /// Category filtering happens in SQL; tag and ingredient membership,
    /// text relevance and the sort keys the store cannot order natively
    /// (instruction-step count, relevance) are applied post-fetch.
    ///
    /// An out-of-range page yields empty `items`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn query_recipes(&self, query: &RecipeQuery) -> AppResult<RecipePage> {
        let rows = if let Some(category) = &query.category {
            sqlx::query(
                r"
                SELECT id, title, description, category, tags, ingredients,
                       instructions, images, prep_time_mins, cook_time_mins,
                       servings, published_at, average_rating, review_count, version
                FROM recipes
                WHERE category = $1
                ORDER BY rowid
                ",
            )
            .bind(category)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(
                r"
                SELECT id, title, description, category, tags, ingredients,
                       instructions, images, prep_time_mins, cook_time_mins,
                       servings, published_at, average_rating, review_count, version
                FROM recipes
                ORDER BY rowid
                ",
            )
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::database(format!("Failed to query recipes: {e}")))?;

        let mut recipes = rows
            .iter()
            .map(row_to_recipe)
            .collect::<AppResult<Vec<Recipe>>>()?;

        if let Some(tag) = &query.tag {
            recipes.retain(|r| r.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)));
        }

        if let Some(ingredient) = &query.ingredient {
            recipes.retain(|r| {
                r.ingredients
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case(ingredient))
            });
        }

        // Relevance scores are computed before sorting so the default sort
        // can use them when a search term is present.
        let search_terms = query
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.trim().is_empty());
        let mut scored: Vec<(i64, Recipe)> = match &search_terms {
            Some(terms) => recipes
                .into_iter()
                .map(|r| (relevance_score(&r, terms), r))
                .filter(|(score, _)| *score > 0)
                .collect(),
            None => recipes.into_iter().map(|r| (0, r)).collect(),
        };

        sort_recipes(&mut scored, query.sort_by, query.order, search_terms.is_some());

        let total_count = scored.len() as u64;
        let limit = if query.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            query.limit.min(MAX_PAGE_SIZE)
        };
        let page = query.page.max(1);
        let total_pages = ((total_count + u64::from(limit) - 1) / u64::from(limit)).max(1) as u32;

        let start = (u64::from(page) - 1) * u64::from(limit);
        let items: Vec<RecipeSummary> = scored
            .into_iter()
            .skip(start as usize)
            .take(limit as usize)
            .map(|(_, r)| RecipeSummary::from(r))
            .collect();

        Ok(RecipePage {
            items,
            current_page: page,
            total_pages,
            total_count,
        })
    }
}

/// Weighted token-match relevance of a recipe against a lowercased query
fn relevance_score(recipe: &Recipe, search: &str) -> i64 {
    let title = recipe.title.to_lowercase();
    let description = recipe.description.to_lowercase();
    let tags: Vec<String> = recipe.tags.iter().map(|t| t.to_lowercase()).collect();

    let mut score = 0;
    for token in search.split_whitespace() {
        if title.contains(token) {
            score += TITLE_WEIGHT;
        }
        if description.contains(token) {
            score += DESCRIPTION_WEIGHT;
        }
        if tags.iter().any(|t| t.contains(token)) {
            score += TAG_WEIGHT;
        }
    }
    score
}

/// Sort scored recipes in place; stable, so ties keep insertion order
fn sort_recipes(
    scored: &mut [(i64, Recipe)],
    sort_by: RecipeSortKey,
    order: SortOrder,
    searching: bool,
) {
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    match sort_by {
        RecipeSortKey::Default => {
            // Relevance order for searches, insertion order otherwise; the
            // order parameter does not apply to the default sort.
            if searching {
                scored.sort_by(|a, b| b.0.cmp(&a.0));
            }
        }
        RecipeSortKey::Newest => {
            scored.sort_by(|a, b| directed(a.1.published_at.cmp(&b.1.published_at)));
        }
        RecipeSortKey::PrepTime => {
            scored.sort_by(|a, b| directed(a.1.prep_time_mins.cmp(&b.1.prep_time_mins)));
        }
        RecipeSortKey::CookTime => {
            scored.sort_by(|a, b| directed(a.1.cook_time_mins.cmp(&b.1.cook_time_mins)));
        }
        RecipeSortKey::Steps => {
            scored.sort_by(|a, b| directed(a.1.instructions.len().cmp(&b.1.instructions.len())));
        }
    }
}

pub(crate) fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    let tags_json: String = row.get("tags");
    let ingredients_json: String = row.get("ingredients");
    let instructions_json: String = row.get("instructions");
    let images_json: String = row.get("images");
    let published_at_str: String = row.get("published_at");

    Ok(Recipe {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        tags: serde_json::from_str(&tags_json)?,
        ingredients: serde_json::from_str(&ingredients_json)?,
        instructions: serde_json::from_str(&instructions_json)?,
        images: serde_json::from_str(&images_json)?,
        prep_time_mins: row.get("prep_time_mins"),
        cook_time_mins: row.get("cook_time_mins"),
        servings: row.get("servings"),
        published_at: DateTime::parse_from_rfc3339(&published_at_str)
            .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))?
            .with_timezone(&Utc),
        average_rating: row.get("average_rating"),
        review_count: row.get("review_count"),
        version: row.get("version"),
    })
}
