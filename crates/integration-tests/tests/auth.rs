//! Bearer-token checks, health endpoints and request IDs.

use reqwest::StatusCode;
use stride_integration_tests::TestApp;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "ok");

    let response = app
        .client
        .get(app.url("/health/ready"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let (status, body) = app.send(app.client.get(app.url("/orders/orders"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_tampered_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    let token = app.customer(7).replacen("7.customer", "7.admin", 1);

    let (status, _) = app
        .send(app.client.get(app.url("/orders/orders/all")).bearer_auth(token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .expect("Request failed");
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-abc-123")
    );
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Request failed");
    let id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert!(!id.is_empty());
}
