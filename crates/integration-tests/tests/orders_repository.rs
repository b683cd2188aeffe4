//! Integration tests for order persistence and duplicate detection.
//!
//! These need `PostgreSQL`; see the crate docs for how to run them.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use resilient_orders_core::{NaturalKey, Order, OrderId, OrderReference, StoreId};
use resilient_orders_db::{OrdersRepository, RepositoryError, StagingTable};
use resilient_orders_integration_tests::{
    lock_timeout_pool, order, table_exists, test_pool, unique_store,
};

fn key(store: &StoreId, reference: &str) -> NaturalKey {
    NaturalKey::new(store.clone(), OrderReference::new(reference))
}

// =============================================================================
// Save / Find
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_save_then_find_round_trip() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    let saved = order(&store, "R1", "two boxes of tea");

    repo.save(&saved).await.unwrap();
    let found = repo
        .find_by(saved.store_id(), saved.order_reference())
        .await
        .unwrap();

    assert_eq!(found, Some(saved));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_unknown_key_is_none() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);

    let found = repo
        .find_by(&unique_store(), &OrderReference::new("never-saved"))
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_save_same_natural_key_conflicts() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    let first = order(&store, "R1", "first");
    let second = order(&store, "R1", "second");

    repo.save(&first).await.unwrap();
    let err = repo.save(&second).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
    let found = repo.find_by(&store, first.order_reference()).await.unwrap();
    assert_eq!(found.unwrap().description(), "first");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_with_id_copy_round_trips_with_new_identity() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    let draft = order(&store, "R1", "draft");
    let assigned = Order::with_id(OrderId::new(format!("{store}-1")), &draft);

    repo.save(&assigned).await.unwrap();
    let found = repo.find_by(&store, draft.order_reference()).await.unwrap().unwrap();

    assert_eq!(found.order_id(), assigned.order_id());
    assert_eq!(found.natural_key(), draft.natural_key());
}

// =============================================================================
// Duplicate Detection
// =============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_empty_batch() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let staging = StagingTable::random();
    let name = staging.name().to_owned();

    let duplicates = repo.find_duplicate_in(staging, &[]).await.unwrap();

    assert!(duplicates.is_empty());
    assert!(!table_exists(&pool, &name).await);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_no_collisions() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();

    let duplicates = repo
        .find_duplicate(&[order(&store, "R1", ""), order(&store, "R2", "")])
        .await
        .unwrap();

    assert!(duplicates.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_exact_collision() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    repo.save(&order(&store, "R1", "persisted")).await.unwrap();

    let duplicates = repo
        .find_duplicate(&[order(&store, "R1", "candidate")])
        .await
        .unwrap();

    assert_eq!(duplicates, HashSet::from([key(&store, "R1")]));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_partial_batch() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store_one = unique_store();
    let store_two = unique_store();
    repo.save(&order(&store_one, "R1", "persisted")).await.unwrap();

    let duplicates = repo
        .find_duplicate(&[order(&store_one, "R1", ""), order(&store_two, "R2", "")])
        .await
        .unwrap();

    assert_eq!(duplicates, HashSet::from([key(&store_one, "R1")]));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_ignores_repeats_within_batch() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();

    let duplicates = repo
        .find_duplicate(&[order(&store, "R1", "a"), order(&store, "R1", "b")])
        .await
        .unwrap();

    assert!(duplicates.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_reports_repeated_collision_once() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    repo.save(&order(&store, "R1", "persisted")).await.unwrap();

    let duplicates = repo
        .find_duplicate(&[order(&store, "R1", "a"), order(&store, "R1", "b")])
        .await
        .unwrap();

    assert_eq!(duplicates.len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_spans_multiple_insert_chunks() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    repo.save(&order(&store, "R-2499", "persisted")).await.unwrap();

    let candidates: Vec<_> = (0..2500)
        .map(|i| order(&store, &format!("R-{i}"), ""))
        .collect();
    let duplicates = repo.find_duplicate(&candidates).await.unwrap();

    assert_eq!(duplicates, HashSet::from([key(&store, "R-2499")]));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_drops_staging_table_on_success() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    repo.save(&order(&store, "R1", "")).await.unwrap();
    let staging = StagingTable::random();
    let name = staging.name().to_owned();

    let duplicates = repo
        .find_duplicate_in(staging, &[order(&store, "R1", "")])
        .await
        .unwrap();

    assert_eq!(duplicates.len(), 1);
    assert!(!table_exists(&pool, &name).await);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_cleans_up_after_failure() {
    let pool = test_pool().await;
    let repo = OrdersRepository::new(&pool);
    let store = unique_store();
    let staging = StagingTable::random();
    let name = staging.name().to_owned();

    // Longer than the VARCHAR(64) staging column, so staging fails mid-call.
    let oversized = order(&store, &"R".repeat(65), "");
    let err = repo
        .find_duplicate_in(staging, &[order(&store, "R1", ""), oversized])
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Database(_)));
    assert!(!table_exists(&pool, &name).await);

    // The pool is still usable afterwards.
    assert!(repo.find_duplicate(&[]).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_duplicate_cleans_up_when_matching_fails() {
    let pool = test_pool().await;
    let store = unique_store();
    let staging = StagingTable::random();
    let name = staging.name().to_owned();

    // Creating and filling the staging table never touches `orders`, so with
    // `orders` locked the call gets as far as the join-update and fails there.
    let mut locker = pool.begin().await.unwrap();
    sqlx::query("LOCK TABLE orders IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *locker)
        .await
        .unwrap();

    let impatient = lock_timeout_pool("200ms").await;
    let result = OrdersRepository::new(&impatient)
        .find_duplicate_in(staging, &[order(&store, "R1", "")])
        .await;
    locker.rollback().await.unwrap();

    assert!(matches!(result, Err(RepositoryError::Database(_))));
    assert!(!table_exists(&pool, &name).await);
}
