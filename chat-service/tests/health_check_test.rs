//! Health, metrics and root endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn test_health_check_returns_200() {
    let app = TestApp::new();

    let (status, body) = app.get_json("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "chat-service-test");
    assert_eq!(body["checks"]["store"], "up");
}

#[tokio::test]
async fn test_root_greets() {
    let app = TestApp::new();

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Hey, welcome to the API!");
}

#[tokio::test]
async fn test_metrics_endpoint_responds() {
    let app = TestApp::new();

    let (status, _) = app.get("/metrics").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
