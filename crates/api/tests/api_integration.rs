//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::watch;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// App plus the running consumer's shutdown handle.
struct TestApp {
    app: axum::Router,
    state: Arc<api::DefaultAppState>,
    shutdown_tx: watch::Sender<bool>,
}

fn setup() -> TestApp {
    let (state, bus, consumer) = api::create_default_state();
    let app = api::create_app(state.clone(), get_metrics_handle());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        consumer
            .run(&bus, "bank-account-consumer", shutdown_rx)
            .await
    });

    TestApp {
        app,
        state,
        shutdown_tx,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn open_account(app: &axum::Router, holder: &str, balance: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/v1/accounts",
            serde_json::json!({
                "account_holder": holder,
                "account_type": "Savings",
                "opening_balance": balance
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["account_id"].as_str().unwrap().to_string()
}

/// Polls a GET endpoint until the expected status arrives (the read store
/// is eventually consistent).
async fn wait_for_status(app: &axum::Router, uri: &str, expected: StatusCode) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (status, body) = send(app, get_request(uri)).await;
        if status == expected {
            return body;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "read model did not converge: {uri} still {status}, wanted {expected}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_health_check() {
    let test = setup();

    let (status, body) = send(&test.app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_open_account_returns_created_with_id() {
    let test = setup();

    let account_id = open_account(&test.app, "Jane", "100.0").await;
    assert!(!account_id.is_empty());

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_open_then_query_read_model() {
    let test = setup();

    let account_id = open_account(&test.app, "Jane", "100.0").await;

    let body = wait_for_status(
        &test.app,
        &format!("/api/v1/accounts/{account_id}"),
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["identifier"], account_id.as_str());
    assert_eq!(body["account_holder"], "Jane");
    assert_eq!(body["account_type"], "Savings");
    assert_eq!(body["balance"], "100.0");

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_deposit_and_withdraw_move_the_read_balance() {
    let test = setup();

    let account_id = open_account(&test.app, "Jane", "100").await;
    let uri = format!("/api/v1/accounts/{account_id}");

    let (status, _) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("{uri}/deposit"),
            serde_json::json!({"amount": "45.5"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("{uri}/withdraw"),
            serde_json::json!({"amount": "20"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_version"], 3);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (status, body) = send(&test.app, get_request(&uri)).await;
        if status == StatusCode::OK && body["balance"] == "125.5" {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "balance did not converge, last body: {body}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_close_account_removes_the_read_row() {
    let test = setup();

    let account_id = open_account(&test.app, "Jane", "100").await;
    let uri = format!("/api/v1/accounts/{account_id}");
    wait_for_status(&test.app, &uri, StatusCode::OK).await;

    let (status, _) = send(
        &test.app,
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_for_status(&test.app, &uri, StatusCode::NOT_FOUND).await;

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_negative_deposit_is_a_bad_request() {
    let test = setup();

    let account_id = open_account(&test.app, "Jane", "100").await;

    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("/api/v1/accounts/{account_id}/deposit"),
            serde_json::json!({"amount": "-1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("negative"));

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_operations_on_unknown_account_conflict() {
    let test = setup();

    let (status, _) = send(
        &test.app,
        json_request(
            "PUT",
            "/api/v1/accounts/no-such-account/deposit",
            serde_json::json!({"amount": "10"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &test.app,
        Request::builder()
            .method("DELETE")
            .uri("/api/v1/accounts/no-such-account")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_get_unknown_account_is_not_found() {
    let test = setup();

    let (status, _) = send(&test.app, get_request("/api/v1/accounts/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_list_accounts() {
    let test = setup();

    let (status, body) = send(&test.app, get_request("/api/v1/accounts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    open_account(&test.app, "Jane", "100").await;
    open_account(&test.app, "John", "50").await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let (_, body) = send(&test.app, get_request("/api/v1/accounts")).await;
        if body.as_array().unwrap().len() == 2 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "list did not converge to 2 rows"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Queries hit the read store, not the event store
    assert_eq!(test.state.repository.account_count().await, 2);

    test.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup();

    let response = test
        .app
        .clone()
        .oneshot(get_request("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    test.shutdown_tx.send(true).unwrap();
}
