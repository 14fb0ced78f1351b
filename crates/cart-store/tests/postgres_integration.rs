//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p cart-store --test postgres_integration
//! ```

use std::sync::Arc;

use cart_store::{
    CartId, CartItemId, CartItemRecord, CartRecord, CartStore, CartStoreError, CartStoreExt,
    PostgresCartStore, SaveOptions, UserId, Version,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_carts_table.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresCartStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE cart_items, carts")
        .execute(&pool)
        .await
        .unwrap();

    PostgresCartStore::new(pool)
}

fn cart_with_items(user: &str, items: &[(&str, u32)]) -> CartRecord {
    let mut cart = CartRecord::empty(CartId::new(), UserId::new(user));
    cart.items = items
        .iter()
        .map(|(product, quantity)| CartItemRecord::new(CartItemId::new(), (*product).into(), *quantity))
        .collect();
    cart
}

#[tokio::test]
#[serial]
async fn insert_and_find_preserves_item_order() {
    let store = get_test_store().await;
    let cart = cart_with_items("user-1", &[("C", 3), ("A", 2), ("B", 0)]);

    let saved = store.insert(cart.clone()).await.unwrap();
    assert_eq!(saved.version, Version::first());

    let found = store
        .find_by_user_id(&UserId::new("user-1"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.id, cart.id);
    assert_eq!(found.version, Version::first());
    let products: Vec<_> = found.items.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(products, vec!["C", "A", "B"]);
    assert_eq!(found.items[2].quantity, 0);
}

#[tokio::test]
#[serial]
async fn find_missing_user_returns_none() {
    let store = get_test_store().await;

    let found = store.find_by_user_id(&UserId::new("nobody")).await.unwrap();
    assert!(found.is_none());
    assert!(!store.exists_by_user_id(&UserId::new("nobody")).await.unwrap());
}

#[tokio::test]
#[serial]
async fn second_cart_for_user_is_rejected() {
    let store = get_test_store().await;
    store.insert(cart_with_items("user-1", &[])).await.unwrap();

    let result = store.insert(cart_with_items("user-1", &[])).await;
    assert!(matches!(result, Err(CartStoreError::DuplicateCart { .. })));
}

#[tokio::test]
#[serial]
async fn versioned_save_replaces_items() {
    let store = get_test_store().await;
    let saved = store
        .insert(cart_with_items("user-1", &[("A", 1), ("B", 2)]))
        .await
        .unwrap();

    let mut next = saved.clone();
    next.items.retain(|i| i.product_id.as_str() != "A");
    next.items
        .push(CartItemRecord::new(CartItemId::new(), "D".into(), 4));

    let stored = store
        .save(next, SaveOptions::expect_version(saved.version))
        .await
        .unwrap();
    assert_eq!(stored.version, Version::new(2));

    let found = store
        .find_by_user_id(&UserId::new("user-1"))
        .await
        .unwrap()
        .unwrap();
    let products: Vec<_> = found.items.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(products, vec!["B", "D"]);
}

#[tokio::test]
#[serial]
async fn stale_save_conflicts_and_leaves_cart_untouched() {
    let store = get_test_store().await;
    let saved = store
        .insert(cart_with_items("user-1", &[("A", 1)]))
        .await
        .unwrap();

    let mut winner = saved.clone();
    winner.items[0].quantity = 5;
    store
        .save(winner, SaveOptions::expect_version(saved.version))
        .await
        .unwrap();

    let mut loser = saved.clone();
    loser.items.clear();
    let result = store
        .save(loser, SaveOptions::expect_version(saved.version))
        .await;

    match result {
        Err(CartStoreError::ConcurrencyConflict {
            expected, actual, ..
        }) => {
            assert_eq!(expected, Version::first());
            assert_eq!(actual, Version::new(2));
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let found = store
        .find_by_user_id(&UserId::new("user-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].quantity, 5);
}

#[tokio::test]
#[serial]
async fn duplicate_product_record_is_not_written() {
    let store = get_test_store().await;
    let cart = cart_with_items("user-1", &[("A", 1), ("A", 2)]);

    let result = store.insert(cart).await;
    assert!(matches!(result, Err(CartStoreError::InvalidRecord(_))));
    assert!(!store.exists_by_user_id(&UserId::new("user-1")).await.unwrap());
}

#[tokio::test]
#[serial]
async fn versioned_save_of_missing_cart_conflicts() {
    let store = get_test_store().await;
    let cart = cart_with_items("user-1", &[("A", 1)]);

    let result = store
        .save(cart, SaveOptions::expect_version(Version::new(3)))
        .await;

    match result {
        Err(CartStoreError::ConcurrencyConflict {
            expected, actual, ..
        }) => {
            assert_eq!(expected, Version::new(3));
            assert_eq!(actual, Version::initial());
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(!store.exists_by_user_id(&UserId::new("user-1")).await.unwrap());
}
