//! Catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stride_core::ProductId;
use stride_core::product::{Pagination, ProductFilter, ProductInput};
use tracing::instrument;

use super::{created, ok};
use crate::error::AppError;
use crate::extract;
use crate::middleware::RequireAdmin;
use crate::services::products::CatalogService;
use crate::state::AppState;

const INVALID_ID: &str = "Invalid product ID";

/// Body of a bulk upload.
#[derive(Debug, Default, Deserialize)]
pub struct BulkUpload {
    #[serde(default)]
    pub products: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductRef {
    product_id: ProductId,
}

#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let input = extract::json(body)?;
    let product = CatalogService::new(state.store())
        .add(admin.user_id, input)
        .await?;
    Ok(created(
        "Product added successfully",
        ProductRef {
            product_id: product.id,
        },
    ))
}

#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    id: Result<Path<ProductId>, PathRejection>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = extract::path(id, INVALID_ID)?;
    let input = extract::json(body)?;
    let product = CatalogService::new(state.store()).update(id, &input).await?;
    Ok(ok("Product updated successfully", product))
}

#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Response, AppError> {
    let id = extract::path(id, INVALID_ID)?;
    CatalogService::new(state.store()).remove(id).await?;
    Ok(ok("Product removed successfully", ProductRef { product_id: id }))
}

#[instrument(skip_all)]
pub async fn details(
    State(state): State<AppState>,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Response, AppError> {
    let id = extract::path(id, INVALID_ID)?;
    let product = CatalogService::new(state.store()).details(id).await?;
    Ok(ok("Product details retrieved successfully", product))
}

/// One page of the catalog (`page`, `limit`).
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> Result<Response, AppError> {
    let page = extract::query(page)?;
    let products = CatalogService::new(state.store()).list(page).await?;
    Ok(ok("Product list retrieved successfully", products))
}

#[instrument(skip_all)]
pub async fn filter(
    State(state): State<AppState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let filter = extract::query(filter)?;
    let products = CatalogService::new(state.store()).filter(&filter).await?;
    Ok(ok("Filtered and sorted products retrieved successfully", products))
}

#[instrument(skip_all)]
pub async fn popular(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = CatalogService::new(state.store()).popular().await?;
    Ok(ok("Popular products retrieved successfully", products))
}

#[instrument(skip_all)]
pub async fn new_arrivals(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = CatalogService::new(state.store()).new_arrivals().await?;
    Ok(ok("New arrival products retrieved successfully", products))
}

/// Insert many loosely typed rows; invalid rows are reported, not fatal.
#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn bulk_upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Result<Json<BulkUpload>, JsonRejection>,
) -> Result<Response, AppError> {
    let upload = extract::json(body)?;
    let report = CatalogService::new(state.store())
        .bulk_upload(&upload.products)
        .await?;
    if report.successful > 0 {
        Ok(created("Bulk upload completed", report))
    } else {
        Ok(ok("Bulk upload completed", report))
    }
}
