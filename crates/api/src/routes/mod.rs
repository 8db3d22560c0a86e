//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Cart and checkout (any signed-in user)
//! POST   /orders/cart/add                       - Add {productId, quantity, size}
//! DELETE /orders/cart/remove/{productId}        - Remove a product
//! GET    /orders/cart                           - Fetch cart
//! POST   /orders/order/place                    - Checkout {address, paymentMode}
//! GET    /orders/orders                         - Caller's orders
//! POST   /orders/order/cancel                   - Cancel {orderId, reason}
//! POST   /orders/order/return                   - Request return {orderId, reason}
//! POST   /orders/order/exchange                 - Request exchange {orderId, reason}
//!
//! # Order administration (admin)
//! GET    /orders/orders/all                     - All orders
//! PATCH  /orders/{orderId}                      - Partial update
//! GET    /orders/dashboard                      - Stage board
//! GET    /orders/dashboard/{page}               - Workflow page listing
//! POST   /orders/dashboard/{page}/{orderId}     - Page action {comment}
//!
//! # Catalog
//! POST   /products                              - Add (admin)
//! GET    /products/all                          - List (page, limit)
//! GET    /products/filter                       - Filter and sort
//! GET    /products/popular                      - Popular products
//! GET    /products/newArrivals                  - New arrivals
//! POST   /products/bulk-upload                  - Bulk upload (admin)
//! GET    /products/{id}                         - Details
//! PUT    /products/{id}                         - Update (admin)
//! DELETE /products/{id}                         - Remove (admin)
//! ```
//!
//! Successful responses use the envelope `{"message": ..., "data": ...}`.

pub mod cart;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use crate::state::AppState;

/// Success body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

/// 200 with an envelope.
pub fn ok<T: Serialize>(message: &'static str, data: T) -> Response {
    Json(Envelope { message, data }).into_response()
}

/// 201 with an envelope.
pub fn created<T: Serialize>(message: &'static str, data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope { message, data })).into_response()
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/add", post(cart::add))
        .route("/cart/remove/{product_id}", delete(cart::remove))
        .route("/cart", get(cart::show))
        .route("/order/place", post(orders::place))
        .route("/orders", get(orders::mine))
        .route("/order/cancel", post(orders::cancel))
        .route("/order/return", post(orders::request_return))
        .route("/order/exchange", post(orders::request_exchange))
        .route("/orders/all", get(orders::all))
        .route("/dashboard", get(dashboard::board))
        .route("/dashboard/{page}", get(dashboard::page))
        .route("/dashboard/{page}/{order_id}", post(dashboard::advance))
        .route("/{order_id}", patch(orders::update))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::add))
        .route("/all", get(products::list))
        .route("/filter", get(products::filter))
        .route("/popular", get(products::popular))
        .route("/newArrivals", get(products::new_arrivals))
        .route("/bulk-upload", post(products::bulk_upload))
        .route(
            "/{id}",
            get(products::details)
                .put(products::update)
                .delete(products::remove),
        )
}

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", order_routes())
        .nest("/products", product_routes())
}
