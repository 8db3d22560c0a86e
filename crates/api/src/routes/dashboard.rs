//! Admin order dashboard: the stage board, the workflow pages and their
//! action buttons.

use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    response::Response,
};
use serde::Deserialize;
use stride_core::OrderId;
use stride_core::workflow::{Board, Page, PageListing};
use tracing::instrument;

use super::ok;
use crate::error::AppError;
use crate::extract;
use crate::middleware::RequireAdmin;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Body of a page action.
#[derive(Debug, Default, Deserialize)]
pub struct AdvanceRequest {
    #[serde(default)]
    pub comment: String,
}

/// Orders grouped by stage, with counts.
#[instrument(skip_all)]
pub async fn board(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response, AppError> {
    let orders = OrderService::new(state.store()).all().await?;
    Ok(ok("Order board retrieved", Board::build(&orders)))
}

/// Orders listed on one workflow page plus its action.
#[instrument(skip_all)]
pub async fn page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let page = slug.parse::<Page>()?;
    let orders = OrderService::new(state.store()).all().await?;
    Ok(ok("Page orders retrieved", PageListing::build(page, &orders)))
}

/// Apply a page's action to one order.
#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn advance(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    params: Result<Path<(String, OrderId)>, PathRejection>,
    body: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let (slug, order_id) = extract::path(params, "Invalid order ID")?;
    let page = slug.parse::<Page>()?;
    let request = extract::json(body)?;
    let order = OrderService::new(state.store())
        .advance(page, order_id, &request.comment)
        .await?;
    Ok(ok("Order advanced successfully", order.view()))
}
