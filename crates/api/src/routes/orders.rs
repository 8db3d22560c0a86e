//! Checkout, customer order actions and admin order updates.

use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    response::Response,
};
use serde::Deserialize;
use stride_core::checkout::PlaceOrder;
use stride_core::order::{Order, OrderPatch, OrderView};
use stride_core::{DomainError, OrderId};
use tracing::instrument;

use super::{created, ok};
use crate::error::AppError;
use crate::extract;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Body of cancel, return and exchange requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAction {
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub reason: String,
}

impl OrderAction {
    fn order_id(&self) -> Result<OrderId, AppError> {
        self.order_id
            .ok_or_else(|| DomainError::validation("orderId is required").into())
    }
}

fn views(orders: &[Order]) -> Vec<OrderView<'_>> {
    orders.iter().map(Order::view).collect()
}

/// Check out the caller's cart.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn place(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    body: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = extract::json(body)?;
    let order = OrderService::new(state.store())
        .place(caller.user_id, &request)
        .await?;
    Ok(created("Order placed successfully", order.view()))
}

/// The caller's orders, newest first.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> Result<Response, AppError> {
    let orders = OrderService::new(state.store()).mine(caller.user_id).await?;
    Ok(ok("Orders retrieved successfully", views(&orders)))
}

/// Every order, newest first.
#[instrument(skip_all)]
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response, AppError> {
    let orders = OrderService::new(state.store()).all().await?;
    Ok(ok("All orders retrieved", views(&orders)))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    body: Result<Json<OrderAction>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = extract::json(body)?;
    let order = OrderService::new(state.store())
        .cancel(caller.user_id, request.order_id()?, &request.reason)
        .await?;
    Ok(ok("Order cancelled successfully", order.view()))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn request_return(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    body: Result<Json<OrderAction>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = extract::json(body)?;
    let order = OrderService::new(state.store())
        .request_return(caller.user_id, request.order_id()?, &request.reason)
        .await?;
    Ok(ok("Return requested successfully", order.view()))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn request_exchange(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    body: Result<Json<OrderAction>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = extract::json(body)?;
    let order = OrderService::new(state.store())
        .request_exchange(caller.user_id, request.order_id()?, &request.reason)
        .await?;
    Ok(ok("Exchange requested successfully", order.view()))
}

/// Admin partial update in the legacy flag vocabulary.
#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    order_id: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<OrderPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    let order_id = extract::path(order_id, "Invalid order ID")?;
    let patch = extract::json(body)?;
    let order = OrderService::new(state.store())
        .update(order_id, &patch)
        .await?;
    Ok(ok("Order updated successfully", order.view()))
}
