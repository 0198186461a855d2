//! PostgreSQL read-store integration tests
//!
//! Run with:
//!
//! ```bash
//! cargo test -p projections --test postgres_repository
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::AggregateId;
use event_store::EventId;
use projections::{BankAccount, BankAccountRepository, PostgresBankAccountRepository};
use rust_decimal_macros::dec;
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
                "../../../migrations/002_create_read_model_tables.sql"
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

async fn get_test_repository() -> PostgresBankAccountRepository {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bank_accounts, projection_processed_events")
        .execute(&pool)
        .await
        .unwrap();

    PostgresBankAccountRepository::new(pool)
}

fn row(identifier: &AggregateId) -> BankAccount {
    BankAccount {
        identifier: identifier.clone(),
        account_holder: "Jane".to_string(),
        account_type: "Savings".to_string(),
        balance: dec!(100),
        creation_date: Utc::now(),
    }
}

#[tokio::test]
#[serial]
async fn insert_find_and_delete() {
    let repo = get_test_repository().await;
    let id = AggregateId::new();

    repo.insert_account(row(&id), &EventId::new()).await.unwrap();

    let found = repo.find_by_identifier(&id).await.unwrap().unwrap();
    assert_eq!(found.identifier, id);
    assert_eq!(found.account_holder, "Jane");
    assert_eq!(found.balance, dec!(100));
    assert_eq!(repo.find_all().await.unwrap().len(), 1);

    repo.delete_by_identifier(&id, &EventId::new())
        .await
        .unwrap();
    assert!(repo.find_by_identifier(&id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn balance_delta_accumulates() {
    let repo = get_test_repository().await;
    let id = AggregateId::new();

    repo.insert_account(row(&id), &EventId::new()).await.unwrap();
    repo.apply_balance_delta(&id, dec!(45.50), &EventId::new())
        .await
        .unwrap();
    repo.apply_balance_delta(&id, dec!(-20), &EventId::new())
        .await
        .unwrap();

    let found = repo.find_by_identifier(&id).await.unwrap().unwrap();
    assert_eq!(found.balance, dec!(125.50));
}

#[tokio::test]
#[serial]
async fn redelivered_event_id_is_skipped() {
    let repo = get_test_repository().await;
    let id = AggregateId::new();

    repo.insert_account(row(&id), &EventId::new()).await.unwrap();

    let event_id = EventId::new();
    repo.apply_balance_delta(&id, dec!(25), &event_id)
        .await
        .unwrap();
    repo.apply_balance_delta(&id, dec!(25), &event_id)
        .await
        .unwrap();

    let found = repo.find_by_identifier(&id).await.unwrap().unwrap();
    assert_eq!(found.balance, dec!(125));
}

#[tokio::test]
#[serial]
async fn unknown_identifier_delta_is_a_no_op() {
    let repo = get_test_repository().await;

    repo.apply_balance_delta(&AggregateId::new(), dec!(25), &EventId::new())
        .await
        .unwrap();

    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn find_all_orders_by_creation_date() {
    let repo = get_test_repository().await;

    for n in 0..3 {
        let id = AggregateId::new();
        let mut account = row(&id);
        account.account_holder = format!("Holder {n}");
        account.creation_date = Utc::now() + chrono::Duration::seconds(n);
        repo.insert_account(account, &EventId::new()).await.unwrap();
    }

    let rows = repo.find_all().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].account_holder, "Holder 0");
    assert_eq!(rows[2].account_holder, "Holder 2");
}
