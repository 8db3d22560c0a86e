//! Admin order dashboard over HTTP.

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use stride_integration_tests::TestApp;

/// An app with one pending order; returns the app, the admin token, the
/// shopper token and the order ID.
async fn with_order() -> (TestApp, String, String, i64) {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;
    let order = app.place_order(&shopper).await;
    (app, admin, shopper, order)
}

async fn advance(app: &TestApp, admin: &str, page: &str, order: i64, comment: &str) -> (StatusCode, Value) {
    app.send(
        app.request(Method::POST, &format!("/orders/dashboard/{page}/{order}"), admin)
            .json(&json!({ "comment": comment })),
    )
    .await
}

fn ids(listing: &Value) -> Vec<i64> {
    listing["orders"]
        .as_array()
        .expect("orders")
        .iter()
        .filter_map(|order| order["id"].as_i64())
        .collect()
}

#[tokio::test]
async fn test_board_counts_every_stage() {
    let (app, admin, _, order) = with_order().await;

    let (status, body) = app
        .send(app.request(Method::GET, "/orders/dashboard", &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let stages = body["data"]["stages"].as_array().expect("stages");
    assert_eq!(stages.len(), 8);
    let pending = stages
        .iter()
        .find(|bucket| bucket["stage"] == "pending")
        .expect("pending bucket");
    assert_eq!(pending["count"], 1);
    assert_eq!(pending["orders"][0]["id"], order);
    let others: i64 = stages
        .iter()
        .filter(|bucket| bucket["stage"] != "pending")
        .filter_map(|bucket| bucket["count"].as_i64())
        .sum();
    assert_eq!(others, 0);
}

#[tokio::test]
async fn test_walk_order_through_every_page() {
    let (app, admin, _, order) = with_order().await;

    let steps = [
        ("pending", "accepted", "processing"),
        ("processing", "processing", "packing"),
        ("packing", "in_transit", "shipping"),
        ("shipping", "shipped", "delivery"),
        ("delivery", "delivered", "completed"),
    ];
    for (page, status, next_page) in steps {
        let (code, body) = advance(&app, &admin, page, order, &format!("{page} done")).await;
        assert_eq!(code, StatusCode::OK, "{page}: {body}");
        assert_eq!(body["data"]["status"], status);

        let (_, listing) = app
            .send(app.request(Method::GET, &format!("/orders/dashboard/{next_page}"), &admin))
            .await;
        assert_eq!(ids(&listing["data"]), vec![order], "{next_page}");
    }

    let (_, body) = app
        .send(app.request(Method::GET, "/orders/dashboard/completed", &admin))
        .await;
    let listed = &body["data"]["orders"][0];
    assert_eq!(listed["isDelivered"], true);
    assert_eq!(listed["orderAcceptanceComment"], "pending done");
    assert_eq!(listed["deliveredComment"], "delivery done");
    assert!(body["data"]["action"].is_null());
}

#[tokio::test]
async fn test_page_listing_describes_action() {
    let (app, admin, _, _) = with_order().await;

    let (status, body) = app
        .send(app.request(Method::GET, "/orders/dashboard/pending", &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Pending Orders");
    assert_eq!(body["data"]["action"]["buttonText"], "Accept Order");
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn test_advance_from_wrong_page_is_rejected() {
    let (app, admin, _, order) = with_order().await;

    let (status, body) = advance(&app, &admin, "shipping", order, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");

    let (_, body) = app
        .send(app.request(Method::GET, "/orders/dashboard/pending", &admin))
        .await;
    assert_eq!(ids(&body["data"]), vec![order]);
}

#[tokio::test]
async fn test_view_only_page_has_no_action() {
    let (app, admin, shopper, order) = with_order().await;
    let (status, _) = app
        .send(
            app.request(Method::POST, "/orders/order/cancel", &shopper)
                .json(&json!({ "orderId": order, "reason": "No longer needed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = advance(&app, &admin, "cancelled", order, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_returns_page_processes_refund() {
    let (app, admin, shopper, order) = with_order().await;
    for page in ["pending", "processing", "packing", "shipping", "delivery"] {
        let (status, _) = advance(&app, &admin, page, order, "").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = app
        .send(
            app.request(Method::POST, "/orders/order/return", &shopper)
                .json(&json!({ "orderId": order, "reason": "Too narrow" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = advance(&app, &admin, "returns", order, "Courier collected").await;
    assert_eq!(body["data"]["status"], "return_picked");
    let (_, body) = advance(&app, &admin, "returns", order, "Refund sent").await;
    assert_eq!(body["data"]["status"], "refund_initiated");
    assert_eq!(body["data"]["isRefundInitiate"], true);
    assert_eq!(body["data"]["stage"], "return_exchange");

    let (status, _) = advance(&app, &admin, "returns", order, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (app, admin, _, _) = with_order().await;

    let (status, body) = advance(&app, &admin, "pending", 999, "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let (app, _, shopper, _) = with_order().await;

    let (status, _) = app
        .send(app.request(Method::GET, "/orders/dashboard", &shopper))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
