// ABOUTME: Unit tests for the review store and rating aggregator
// ABOUTME: Covers aggregate invariants, validation, ordering and idempotence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Kitchen

#![allow(missing_docs, clippy::unwrap_used, clippy::float_cmp)]

mod common;

use common::{create_test_database, new_recipe, seed_recipe, tagged_recipe};
use ladle::database::{Database, NewReview, ReviewSort, ReviewSortKey, SortOrder, UpdateReview};
use ladle::errors::ErrorCode;

fn review(rating: i64, author: &str) -> NewReview {
    NewReview {
        rating,
        comment: format!("comment from {author}"),
        author: author.to_owned(),
    }
}

// ============================================================================
// Creation and the aggregate invariant
// ============================================================================

#[tokio::test]
async fn first_review_sets_aggregate() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Pad Thai")).await;

    let created = db
        .reviews()
        .create_review(
            &recipe.id,
            &NewReview {
                rating: 5,
                comment: "great".to_owned(),
                author: "alice@example.com".to_owned(),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.rating, 5);
    assert_eq!(created.recipe_id, recipe.id);
    assert_eq!(created.created_at, created.updated_at);

    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 1);
    assert_eq!(stored.average_rating, 5.0);
}

#[tokio::test]
async fn aggregate_tracks_multiple_reviews_and_deletes() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Ramen")).await;
    let reviews = db.reviews();

    reviews
        .create_review(&recipe.id, &review(5, "alice@example.com"))
        .await
        .unwrap();
    let low = reviews
        .create_review(&recipe.id, &review(3, "bob@example.com"))
        .await
        .unwrap();

    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.average_rating, 4.0);
    assert_eq!(stored.review_count, 2);

    reviews.delete_review(&low.id).await.unwrap();

    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.average_rating, 5.0);
    assert_eq!(stored.review_count, 1);
}

#[tokio::test]
async fn deleting_last_review_resets_aggregate() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Gazpacho")).await;

    let only = db
        .reviews()
        .create_review(&recipe.id, &review(4, "alice@example.com"))
        .await
        .unwrap();
    db.reviews().delete_review(&only.id).await.unwrap();

    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.average_rating, 0.0);
    assert_eq!(stored.review_count, 0);
}

#[tokio::test]
async fn average_rounds_half_up_to_one_decimal() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Paella")).await;
    let reviews = db.reviews();

    // 5 + 4 + 4 + 4 = 17, mean 4.25 -> rounds up to 4.3
    for (i, rating) in [5, 4, 4, 4].into_iter().enumerate() {
        reviews
            .create_review(&recipe.id, &review(rating, &format!("user{i}@example.com")))
            .await
            .unwrap();
    }

    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.average_rating, 4.3);
    assert_eq!(stored.review_count, 4);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn rating_out_of_range_is_rejected() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Tacos")).await;

    for rating in [0, 6, -1, 100] {
        let err = db
            .reviews()
            .create_review(&recipe.id, &review(rating, "alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput, "rating {rating}");
    }

    // Nothing was written
    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 0);
}

#[tokio::test]
async fn empty_author_or_comment_is_rejected() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Bibimbap")).await;

    let no_author = NewReview {
        rating: 4,
        comment: "tasty".to_owned(),
        author: "  ".to_owned(),
    };
    let err = db
        .reviews()
        .create_review(&recipe.id, &no_author)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let no_comment = NewReview {
        rating: 4,
        comment: String::new(),
        author: "alice@example.com".to_owned(),
    };
    let err = db
        .reviews()
        .create_review(&recipe.id, &no_comment)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn review_on_missing_recipe_is_not_found() {
    let db = create_test_database().await;

    let err = db
        .reviews()
        .create_review("no-such-recipe", &review(5, "alice@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

// ============================================================================
// Update and delete
// ============================================================================

#[tokio::test]
async fn update_changes_fields_and_aggregate() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Pho")).await;

    let created = db
        .reviews()
        .create_review(&recipe.id, &review(2, "alice@example.com"))
        .await
        .unwrap();

    let updated = db
        .reviews()
        .update_review(
            &created.id,
            &UpdateReview {
                rating: 5,
                comment: "changed my mind".to_owned(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.rating, 5);
    assert_eq!(updated.comment, "changed my mind");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.average_rating, 5.0);
}

#[tokio::test]
async fn update_rejects_out_of_range_rating() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Falafel")).await;
    let created = db
        .reviews()
        .create_review(&recipe.id, &review(3, "alice@example.com"))
        .await
        .unwrap();

    let err = db
        .reviews()
        .update_review(
            &created.id,
            &UpdateReview {
                rating: 9,
                comment: "x".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn update_and_delete_of_missing_review_are_not_found() {
    let db = create_test_database().await;

    let err = db
        .reviews()
        .update_review(
            "no-such-review",
            &UpdateReview {
                rating: 4,
                comment: "x".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = db.reviews().delete_review("no-such-review").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

// ============================================================================
// Listing and ordering
// ============================================================================

#[tokio::test]
async fn round_trip_create_then_get() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Curry")).await;

    let created = db
        .reviews()
        .create_review(
            &recipe.id,
            &NewReview {
                rating: 4,
                comment: "solid weeknight dish".to_owned(),
                author: "bob@example.com".to_owned(),
            },
        )
        .await
        .unwrap();

    let page = db
        .reviews()
        .get_reviews(&recipe.id, ReviewSort::default())
        .await
        .unwrap();

    assert_eq!(page.review_count, 1);
    assert_eq!(page.average_rating, 4.0);
    let fetched = &page.reviews[0];
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.rating, 4);
    assert_eq!(fetched.comment, "solid weeknight dish");
    assert_eq!(fetched.author, "bob@example.com");
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
async fn rating_sort_is_stable_on_ties() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Lasagna")).await;
    let reviews = db.reviews();

    let first_five = reviews
        .create_review(&recipe.id, &review(5, "a@example.com"))
        .await
        .unwrap();
    reviews
        .create_review(&recipe.id, &review(3, "b@example.com"))
        .await
        .unwrap();
    let second_five = reviews
        .create_review(&recipe.id, &review(5, "c@example.com"))
        .await
        .unwrap();
    reviews
        .create_review(&recipe.id, &review(4, "d@example.com"))
        .await
        .unwrap();

    let page = reviews
        .get_reviews(
            &recipe.id,
            ReviewSort {
                key: ReviewSortKey::Rating,
                order: SortOrder::Desc,
            },
        )
        .await
        .unwrap();

    let ratings: Vec<i64> = page.reviews.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![5, 5, 4, 3]);
    // Equal ratings keep insertion order
    assert_eq!(page.reviews[0].id, first_five.id);
    assert_eq!(page.reviews[1].id, second_five.id);

    let page = reviews
        .get_reviews(
            &recipe.id,
            ReviewSort {
                key: ReviewSortKey::Rating,
                order: SortOrder::Asc,
            },
        )
        .await
        .unwrap();
    let ratings: Vec<i64> = page.reviews.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![3, 4, 5, 5]);
}

#[tokio::test]
async fn get_reviews_on_missing_recipe_is_not_found() {
    let db = create_test_database().await;

    let err = db
        .reviews()
        .get_reviews("no-such-recipe", ReviewSort::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn listing_aggregates_agree_with_the_rows() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &new_recipe("Goulash")).await;

    for (rating, author) in [(4, "a@example.com"), (5, "b@example.com"), (3, "c@example.com")] {
        db.reviews()
            .create_review(&recipe.id, &review(rating, author))
            .await
            .unwrap();
    }

    let page = db
        .reviews()
        .get_reviews(&recipe.id, ReviewSort::default())
        .await
        .unwrap();

    assert_eq!(page.reviews.len() as i64, page.review_count);
    assert_eq!(page.average_rating, 4.0);
}

// ============================================================================
// Concurrent mutations
// ============================================================================

async fn file_backed_database(dir: &tempfile::TempDir) -> Database {
    let url = format!("sqlite:{}/ladle.db", dir.path().display());
    Database::new(&url).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_on_one_recipe_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_backed_database(&dir).await;
    let recipe = seed_recipe(&db, &new_recipe("Hotpot")).await;

    let mut handles = Vec::new();
    for i in 0..10_i64 {
        let db = db.clone();
        let recipe_id = recipe.id.clone();
        handles.push(tokio::spawn(async move {
            db.reviews()
                .create_review(&recipe_id, &review(i % 5 + 1, &format!("user{i}@example.com")))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Ratings 1..=5 twice over: sum 30, mean 3.0
    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 10);
    assert_eq!(stored.average_rating, 3.0);

    let page = db
        .reviews()
        .get_reviews(&recipe.id, ReviewSort::default())
        .await
        .unwrap();
    assert_eq!(page.reviews.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_on_different_recipes_do_not_fail_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_backed_database(&dir).await;

    let mut recipe_ids = Vec::new();
    for i in 0..8 {
        let recipe = seed_recipe(&db, &new_recipe(&format!("Dish {i}"))).await;
        recipe_ids.push(recipe.id);
    }

    let mut handles = Vec::new();
    for recipe_id in &recipe_ids {
        let db = db.clone();
        let recipe_id = recipe_id.clone();
        handles.push(tokio::spawn(async move {
            db.reviews()
                .create_review(&recipe_id, &review(4, "alice@example.com"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for recipe_id in &recipe_ids {
        let stored = db.recipes().get_recipe(recipe_id).await.unwrap().unwrap();
        assert_eq!(stored.review_count, 1);
        assert_eq!(stored.average_rating, 4.0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_mutations_keep_the_aggregate_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_backed_database(&dir).await;
    let recipe = seed_recipe(&db, &new_recipe("Ratatouille")).await;

    let mut seeded = Vec::new();
    for i in 0..4_i64 {
        let created = db
            .reviews()
            .create_review(&recipe.id, &review(2, &format!("seed{i}@example.com")))
            .await
            .unwrap();
        seeded.push(created.id);
    }

    // Deletes, updates and creates all race on the same recipe
    let mut handles = Vec::new();
    for review_id in seeded.iter().take(2).cloned() {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.reviews().delete_review(&review_id).await
        }));
    }
    for review_id in seeded.iter().skip(2).cloned() {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.reviews()
                .update_review(
                    &review_id,
                    &UpdateReview {
                        rating: 5,
                        comment: "revised".to_owned(),
                    },
                )
                .await
                .map(|_| ())
        }));
    }
    for i in 0..2_i64 {
        let db = db.clone();
        let recipe_id = recipe.id.clone();
        handles.push(tokio::spawn(async move {
            db.reviews()
                .create_review(&recipe_id, &review(5, &format!("late{i}@example.com")))
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 2 deleted, 2 updated to 5, 2 created at 5
    let stored = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.review_count, 4);
    assert_eq!(stored.average_rating, 5.0);

    let page = db
        .reviews()
        .get_reviews(&recipe.id, ReviewSort::default())
        .await
        .unwrap();
    assert_eq!(page.reviews.len() as i64, stored.review_count);
}

// ============================================================================
// Rating aggregator
// ============================================================================

#[tokio::test]
async fn recompute_is_idempotent() {
    let db = create_test_database().await;
    let recipe = seed_recipe(&db, &tagged_recipe("Chili", "dinner", &["spicy"])).await;

    db.reviews()
        .create_review(&recipe.id, &review(4, "a@example.com"))
        .await
        .unwrap();
    db.reviews()
        .create_review(&recipe.id, &review(5, "b@example.com"))
        .await
        .unwrap();

    db.ratings().recompute(&recipe.id).await.unwrap();
    let first = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();

    db.ratings().recompute(&recipe.id).await.unwrap();
    let second = db.recipes().get_recipe(&recipe.id).await.unwrap().unwrap();

    assert_eq!(first.average_rating, 4.5);
    assert_eq!(first.average_rating, second.average_rating);
    assert_eq!(first.review_count, second.review_count);
}

#[tokio::test]
async fn recompute_on_missing_recipe_is_silent() {
    let db = create_test_database().await;

    // Logged and skipped, not an error
    db.ratings().recompute("no-such-recipe").await.unwrap();
}
