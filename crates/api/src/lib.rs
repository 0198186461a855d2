//! HTTP API server with observability for the banking system.
//!
//! Exposes the account command surface and the read-store query surface,
//! with structured logging (tracing) and Prometheus metrics. Queries never
//! touch the event store: they are served from the projection-owned read
//! model and are eventually consistent with the write side.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use event_bus::{BusEventPublisher, EventPublisher, InMemoryEventBus};
use event_store::{EventStore, InMemoryEventStore};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{
    BankAccountRepository, InMemoryBankAccountRepository, InMemoryDeadLetterSink,
    ProjectionConsumer,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::accounts::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P, R>(state: Arc<AppState<S, P, R>>, metrics_handle: PrometheusHandle) -> Router
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/accounts", post(routes::accounts::open::<S, P, R>))
        .route("/api/v1/accounts", get(routes::accounts::list::<S, P, R>))
        .route(
            "/api/v1/accounts/{id}",
            get(routes::accounts::get::<S, P, R>),
        )
        .route(
            "/api/v1/accounts/{id}",
            delete(routes::accounts::close::<S, P, R>),
        )
        .route(
            "/api/v1/accounts/{id}/deposit",
            put(routes::accounts::deposit::<S, P, R>),
        )
        .route(
            "/api/v1/accounts/{id}/withdraw",
            put(routes::accounts::withdraw::<S, P, R>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// The in-memory wiring used by the default binary and the tests.
pub type DefaultAppState =
    AppState<InMemoryEventStore, BusEventPublisher<InMemoryEventBus>, InMemoryBankAccountRepository>;

/// Creates the default application state: in-memory store, bus, and read
/// repository, plus the projection consumer ready to be spawned.
pub fn create_default_state() -> (
    Arc<DefaultAppState>,
    InMemoryEventBus,
    ProjectionConsumer<InMemoryBankAccountRepository, InMemoryDeadLetterSink>,
) {
    use domain::AccountService;

    let store = InMemoryEventStore::new();
    let bus = InMemoryEventBus::new();
    let repository = InMemoryBankAccountRepository::new();
    let dead_letters = InMemoryDeadLetterSink::new();

    let account_service = AccountService::new(store, BusEventPublisher::new(bus.clone()));
    let consumer = ProjectionConsumer::new(repository.clone(), dead_letters);

    let state = Arc::new(AppState {
        account_service,
        repository,
    });

    (state, bus, consumer)
}
