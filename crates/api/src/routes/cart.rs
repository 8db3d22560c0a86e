//! Cart handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    response::Response,
};
use serde::Serialize;
use stride_core::ProductId;
use stride_core::cart::AddToCart;
use tracing::instrument;

use super::ok;
use crate::error::AppError;
use crate::extract;
use crate::middleware::RequireUser;
use crate::services::cart::{CartItemView, CartService, CartView};
use crate::state::AppState;

/// A cart, or an empty list when there is nothing in it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CartReply {
    Cart(CartView),
    Empty(Vec<CartItemView>),
}

/// Add a product line to the caller's cart.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    body: Result<Json<AddToCart>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = extract::json(body)?;
    let cart = CartService::new(state.store())
        .add(caller.user_id, &request)
        .await?;
    Ok(ok("Product added to cart", cart))
}

/// Remove every line of a product from the caller's cart.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    product_id: Result<Path<ProductId>, PathRejection>,
) -> Result<Response, AppError> {
    let product_id = extract::path(product_id, "Invalid product ID")?;
    let cart = CartService::new(state.store())
        .remove(caller.user_id, product_id)
        .await?;
    Ok(ok("Product removed from cart", cart))
}

/// The caller's cart with product summaries.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
) -> Result<Response, AppError> {
    let reply = match CartService::new(state.store()).view(caller.user_id).await? {
        Some(cart) if !cart.items.is_empty() => {
            return Ok(ok("Cart retrieved successfully", CartReply::Cart(cart)));
        }
        _ => CartReply::Empty(Vec::new()),
    };
    Ok(ok("Cart is empty", reply))
}
