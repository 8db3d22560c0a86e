//! Checkout and customer order actions over HTTP.

use reqwest::{Method, StatusCode};
use serde_json::json;
use stride_integration_tests::{TestApp, place_order_body};

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_place_order_snapshots_cart() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let runner = app.add_product(&admin, "Trail Runner", 10.0).await;
    let loafer = app.add_product(&admin, "City Loafer", 2.5).await;
    app.add_to_cart(&shopper, runner, 2).await;
    app.add_to_cart(&shopper, loafer, 2).await;

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/place", &shopper)
                .json(&place_order_body()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &body["data"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["stage"], "pending");
    assert_eq!(order["user"], 7);
    assert_eq!(order["items"].as_array().expect("items").len(), 2);
    assert!((order["totalAmount"].as_f64().expect("total") - 25.0).abs() < 1e-9);

    // Cart is consumed by checkout
    let (_, body) = app
        .send(app.request(Method::GET, "/orders/cart", &shopper))
        .await;
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
async fn test_place_order_with_empty_cart() {
    let app = TestApp::spawn().await;
    let shopper = app.customer(7);

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/place", &shopper)
                .json(&place_order_body()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_cart");
}

#[tokio::test]
async fn test_total_above_money_column_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Gold Sneaker", 9_999_999_999.99).await;
    app.add_to_cart(&shopper, product, 2).await;

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/place", &shopper)
                .json(&place_order_body()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_cart_line_quantity_is_capped() {
    let app = TestApp::spawn().await;
    let product = app.add_product(&app.admin(1), "Trail Runner", 10.0).await;

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/cart/add", &app.customer(7))
                .json(&json!({ "productId": product, "quantity": 4_000_000_000_u32, "size": "8" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity must be at most 100");
}

#[tokio::test]
async fn test_place_order_requires_address() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/place", &shopper)
                .json(&json!({ "paymentMode": "cod" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_order_keeps_price_paid() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;
    app.place_order(&shopper).await;

    let (status, _) = app
        .send(
            app.request(Method::PUT, &format!("/products/{product}"), &admin)
                .json(&json!({ "price": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(app.request(Method::GET, "/orders/orders", &shopper))
        .await;
    let total = body["data"][0]["totalAmount"].as_f64().expect("total");
    assert!((total - 10.0).abs() < 1e-9);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_my_orders_only_lists_own_orders() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    for user in [7, 8] {
        let token = app.customer(user);
        app.add_to_cart(&token, product, 1).await;
        app.place_order(&token).await;
    }

    let (_, body) = app
        .send(app.request(Method::GET, "/orders/orders", &app.customer(7)))
        .await;
    let orders = body["data"].as_array().expect("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["user"], 7);

    let (status, body) = app
        .send(app.request(Method::GET, "/orders/orders/all", &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("orders").len(), 2);
}

// ============================================================================
// Customer actions
// ============================================================================

#[tokio::test]
async fn test_cancel_pending_order() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;
    let order = app.place_order(&shopper).await;

    let cancel = json!({ "orderId": order, "reason": "Ordered the wrong size" });
    let (status, body) = app
        .send(app.request(Method::POST, "/orders/order/cancel", &shopper).json(&cancel))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["isCancelled"], true);
    assert_eq!(body["data"]["cancelledComment"], "Ordered the wrong size");

    let (status, body) = app
        .send(app.request(Method::POST, "/orders/order/cancel", &shopper).json(&cancel))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_cancel_requires_order_id() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/cancel", &app.customer(7))
                .json(&json!({ "reason": "changed my mind" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "orderId is required");
}

#[tokio::test]
async fn test_cannot_cancel_someone_elses_order() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let owner = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&owner, product, 1).await;
    let order = app.place_order(&owner).await;

    let (status, _) = app
        .send(
            app.request(Method::POST, "/orders/order/cancel", &app.customer(8))
                .json(&json!({ "orderId": order })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_return_requires_delivery() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;
    let order = app.place_order(&shopper).await;

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/return", &shopper)
                .json(&json!({ "orderId": order, "reason": "Too small" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_exchange_after_delivery() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;
    let order = app.place_order(&shopper).await;

    // Legacy flag update can move several stages at once
    let (status, body) = app
        .send(
            app.request(Method::PATCH, &format!("/orders/{order}"), &admin)
                .json(&json!({
                    "isOrderAccepted": true,
                    "isInProcess": true,
                    "isInTransit": true,
                    "isShipped": true,
                    "isDelivered": true,
                    "deliveredComment": "Left with neighbour"
                })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["stage"], "delivered");

    let (status, body) = app
        .send(
            app.request(Method::POST, "/orders/order/exchange", &shopper)
                .json(&json!({ "orderId": order, "reason": "Need a size up" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "exchange_requested");
    assert_eq!(body["data"]["stage"], "return_exchange");
    assert_eq!(body["data"]["isExchangeRequest"], true);
}

#[tokio::test]
async fn test_patch_rejects_unknown_fields() {
    let app = TestApp::spawn().await;
    let admin = app.admin(1);
    let shopper = app.customer(7);
    let product = app.add_product(&admin, "Trail Runner", 10.0).await;
    app.add_to_cart(&shopper, product, 1).await;
    let order = app.place_order(&shopper).await;

    let (status, _) = app
        .send(
            app.request(Method::PATCH, &format!("/orders/{order}"), &admin)
                .json(&json!({ "totalAmount": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
