//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p ledger --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;
use std::time::Duration;

use common::{Identity, UserId};
use ledger::{
    InventoryLedger, LedgerError, LedgerTransaction, NewProduct, PostgresInventoryLedger,
    ProductId, ProductPatch, build_update,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

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
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_products_table.sql"
            ))
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

async fn get_test_ledger() -> PostgresInventoryLedger {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresInventoryLedger::new(pool)
}

fn seller() -> Identity {
    Identity::seller(UserId::new(10), "sam")
}

async fn seed(ledger: &PostgresInventoryLedger, amount: i32) -> ProductId {
    ledger
        .create_product(
            &seller(),
            NewProduct::new("Kettle", "Electric", "kettle.png", 3500, amount),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn create_and_fetch_product() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 4).await;

    let product = ledger.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.title, "Kettle");
    assert_eq!(product.seller_id, UserId::new(10));
    assert_eq!(product.seller_name, "sam");
    assert_eq!(product.amount, 4);
    assert_eq!(product.price, 3500);
}

#[tokio::test]
async fn fetch_missing_product_returns_none() {
    let ledger = get_test_ledger().await;
    assert!(ledger.get_product(ProductId::new(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn locked_decrement_commits() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 2).await;

    let mut tx = ledger.begin().await.unwrap();
    assert_eq!(tx.lock_and_read_stock(id).await.unwrap(), 2);
    tx.decrement_stock(id, 1).await.unwrap();
    tx.commit().await.unwrap();

    let product = ledger.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.amount, 1);
}

#[tokio::test]
async fn rollback_restores_stock() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 2).await;

    let mut tx = ledger.begin().await.unwrap();
    tx.lock_and_read_stock(id).await.unwrap();
    tx.decrement_stock(id, 1).await.unwrap();
    tx.rollback().await.unwrap();

    let product = ledger.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.amount, 2);
}

#[tokio::test]
async fn lock_missing_product_is_not_found() {
    let ledger = get_test_ledger().await;
    let mut tx = ledger.begin().await.unwrap();
    let result = tx.lock_and_read_stock(ProductId::new(77)).await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
}

#[tokio::test]
async fn row_lock_serializes_transactions() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 1).await;

    let mut first = ledger.begin().await.unwrap();
    first.lock_and_read_stock(id).await.unwrap();

    let contender = ledger.clone();
    let waiter = tokio::spawn(async move {
        let mut second = contender.begin().await.unwrap();
        let stock = second.lock_and_read_stock(id).await.unwrap();
        second.rollback().await.unwrap();
        stock
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!waiter.is_finished());

    first.decrement_stock(id, 1).await.unwrap();
    first.commit().await.unwrap();

    // The second transaction observes the committed decrement.
    assert_eq!(waiter.await.unwrap(), 0);
}

#[tokio::test]
async fn check_constraint_rejects_negative_stock() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 1).await;

    let mut tx = ledger.begin().await.unwrap();
    tx.lock_and_read_stock(id).await.unwrap();
    let result = tx.decrement_stock(id, 2).await;
    assert!(matches!(result, Err(LedgerError::Database(_))));
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 5).await;

    let statement = build_update(&ProductPatch::new().price(4200).title("Steel kettle"), id).unwrap();
    assert_eq!(ledger.apply_partial_update(&statement).await.unwrap(), id);

    let product = ledger.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.title, "Steel kettle");
    assert_eq!(product.price, 4200);
    assert_eq!(product.description, "Electric");
    assert_eq!(product.amount, 5);
    assert!(product.updated_at >= product.created_at);
}

#[tokio::test]
async fn partial_update_can_zero_stock() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 5).await;

    let statement = build_update(&ProductPatch::new().amount(0), id).unwrap();
    ledger.apply_partial_update(&statement).await.unwrap();

    assert_eq!(ledger.get_product(id).await.unwrap().unwrap().amount, 0);
}

#[tokio::test]
async fn partial_update_of_missing_row_is_not_found() {
    let ledger = get_test_ledger().await;
    let statement = build_update(&ProductPatch::new().title("x"), ProductId::new(999)).unwrap();
    assert!(matches!(
        ledger.apply_partial_update(&statement).await,
        Err(LedgerError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_removes_row() {
    let ledger = get_test_ledger().await;
    let id = seed(&ledger, 1).await;

    ledger.delete_product(id).await.unwrap();
    assert!(ledger.get_product(id).await.unwrap().is_none());
    assert!(matches!(
        ledger.delete_product(id).await,
        Err(LedgerError::NotFound(_))
    ));
}
