//! End-to-end tests for the Stride API.
//!
//! Each test spawns the full router (the same [`stride_api::app`] the binary
//! serves) on an ephemeral port over the in-memory store and talks to it
//! with `reqwest`. No database or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stride-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use secrecy::SecretString;
use serde_json::{Value, json};
use stride_api::config::ApiConfig;
use stride_api::db::MemoryStore;
use stride_api::middleware::TokenKey;
use stride_api::state::AppState;
use stride_core::{Role, UserId};

/// Signing key shared by the spawned server and the test client.
const TOKEN_SECRET: &str = "Fz8!kQ2#wL9@rT4$yH7^uB3&nM6*pD1x";

/// A running API and a client pointed at it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    tokens: TokenKey,
}

impl TestApp {
    /// Bind to `127.0.0.1:0` and serve the app in the background.
    pub async fn spawn() -> Self {
        let secret = SecretString::from(TOKEN_SECRET);
        let state = AppState::new(ApiConfig::local(secret.clone()), Arc::new(MemoryStore::new()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, stride_api::app(state))
                .await
                .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            tokens: TokenKey::new(secret),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Token for a shopper.
    pub fn customer(&self, id: i32) -> String {
        self.tokens
            .mint(UserId::new(id), Role::Customer)
            .expect("Failed to mint token")
    }

    /// Token for staff.
    pub fn admin(&self, id: i32) -> String {
        self.tokens
            .mint(UserId::new(id), Role::Admin)
            .expect("Failed to mint token")
    }

    /// Request with a bearer token.
    pub fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client.request(method, self.url(path)).bearer_auth(token)
    }

    /// Send and decode the JSON body, returning the status alongside it.
    pub async fn send(&self, request: RequestBuilder) -> (reqwest::StatusCode, Value) {
        let response = request.send().await.expect("Request failed");
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Create a product as `admin` and return its ID.
    pub async fn add_product(&self, admin: &str, name: &str, price: f64) -> i64 {
        let (status, body) = self
            .send(
                self.request(Method::POST, "/products", admin)
                    .json(&json!({ "name": name, "price": price, "sizes": ["8", "9"], "stock": 10 })),
            )
            .await;
        assert_eq!(status, 201, "add product failed: {body}");
        body["data"]["productId"]
            .as_i64()
            .expect("productId missing")
    }

    /// Put `quantity` of `product` in size 9 into the caller's cart.
    pub async fn add_to_cart(&self, token: &str, product: i64, quantity: u32) {
        let (status, body) = self
            .send(
                self.request(Method::POST, "/orders/cart/add", token)
                    .json(&json!({ "productId": product, "quantity": quantity, "size": "9" })),
            )
            .await;
        assert_eq!(status, 200, "add to cart failed: {body}");
    }

    /// Check out the caller's cart and return the order ID.
    pub async fn place_order(&self, token: &str) -> i64 {
        let (status, body) = self
            .send(
                self.request(Method::POST, "/orders/order/place", token)
                    .json(&place_order_body()),
            )
            .await;
        assert_eq!(status, 201, "place order failed: {body}");
        body["data"]["id"].as_i64().expect("order id missing")
    }
}

/// A complete checkout body.
#[must_use]
pub fn place_order_body() -> Value {
    json!({
        "address": {
            "fullName": "Ada Walker",
            "street": "12 Harbour Road",
            "city": "Portsmouth",
            "state": "Hampshire",
            "postalCode": "PO1 3AX",
            "country": "UK"
        },
        "paymentMode": "cod"
    })
}
