//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, PostgresEventStore,
    Version,
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

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_events_table.sql"
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

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE events")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(
    aggregate_id: &AggregateId,
    version: Version,
    event_type: &str,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id.clone())
        .aggregate_type("BankAccount")
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"test": true}))
        .build()
}

#[tokio::test]
#[serial]
async fn append_and_read_stream() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        create_test_event(&aggregate_id, Version::new(1), "AccountOpened"),
        create_test_event(&aggregate_id, Version::new(2), "FundsDeposited"),
    ];

    let new_version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(new_version, Version::new(2));

    let stream = store.read_stream(&aggregate_id).await.unwrap();
    assert_eq!(stream.len(), 2);
    assert_eq!(stream[0].event_type, "AccountOpened");
    assert_eq!(stream[1].event_type, "FundsDeposited");
    assert_eq!(stream[1].version, Version::new(2));
}

#[tokio::test]
#[serial]
async fn read_stream_of_unknown_aggregate_is_empty() {
    let store = get_test_store().await;
    let stream = store.read_stream(&AggregateId::new()).await.unwrap();
    assert!(stream.is_empty());
}

#[tokio::test]
#[serial]
async fn expected_version_mismatch_is_a_conflict() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(
                &aggregate_id,
                Version::first(),
                "AccountOpened",
            )],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    // A second writer that still believes the stream is empty
    let result = store
        .append(
            vec![create_test_event(
                &aggregate_id,
                Version::first(),
                "FundsDeposited",
            )],
            AppendOptions::expect_new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));

    // The losing append left nothing behind
    let stream = store.read_stream(&aggregate_id).await.unwrap();
    assert_eq!(stream.len(), 1);
}

#[tokio::test]
#[serial]
async fn unique_constraint_backstops_unchecked_appends() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(
                &aggregate_id,
                Version::first(),
                "AccountOpened",
            )],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    // Same version again, no expected-version check: the unique
    // (aggregate_id, version) constraint still rejects it.
    let result = store
        .append(
            vec![create_test_event(
                &aggregate_id,
                Version::first(),
                "FundsDeposited",
            )],
            AppendOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn current_version_tracks_appends() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    assert_eq!(store.current_version(&aggregate_id).await.unwrap(), None);

    store
        .append(
            vec![
                create_test_event(&aggregate_id, Version::new(1), "AccountOpened"),
                create_test_event(&aggregate_id, Version::new(2), "FundsDeposited"),
                create_test_event(&aggregate_id, Version::new(3), "FundsWithdrawn"),
            ],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    assert_eq!(
        store.current_version(&aggregate_id).await.unwrap(),
        Some(Version::new(3))
    );
}

#[tokio::test]
#[serial]
async fn append_is_atomic_per_batch() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    // Batch with a version gap fails validation before touching the database
    let events = vec![
        create_test_event(&aggregate_id, Version::new(1), "AccountOpened"),
        create_test_event(&aggregate_id, Version::new(3), "FundsDeposited"),
    ];

    let result = store.append(events, AppendOptions::expect_new()).await;
    assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));

    let stream = store.read_stream(&aggregate_id).await.unwrap();
    assert!(stream.is_empty());
}
