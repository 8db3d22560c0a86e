//! Catalog management and browsing.

use chrono::Utc;
use serde_json::Value;
use stride_core::product::{
    BulkReport, Pagination, Product, ProductFilter, ProductInput, prepare_bulk,
};
use stride_core::{DomainError, ProductId, UserId};
use tracing::{info, instrument, warn};

use crate::db::Store;
use crate::error::AppError;

fn not_found(id: ProductId) -> AppError {
    DomainError::NotFound(format!("Product {id}")).into()
}

/// Catalog service over a store.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a product. `createdBy` defaults to the calling admin.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` or `price` is missing or a value
    /// is out of range.
    #[instrument(skip_all, fields(admin = %admin))]
    pub async fn add(&self, admin: UserId, input: ProductInput) -> Result<Product, AppError> {
        let product = input.into_new(&admin.to_string())?;
        let product = self.store.insert_product(product).await?;
        info!(product_id = %product.id, name = %product.name, "Product added");
        Ok(product)
    }

    /// Merge `input` into an existing product.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown product; validation errors leave it unchanged.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, AppError> {
        let at = Utc::now();
        self.store
            .update_product(id, &|product: &mut Product| input.clone().apply_to(product, at))
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// # Errors
    ///
    /// Not-found for an unknown product.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn remove(&self, id: ProductId) -> Result<(), AppError> {
        if self.store.delete_product(id).await? {
            info!("Product removed");
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// # Errors
    ///
    /// Not-found for an unknown product.
    pub async fn details(&self, id: ProductId) -> Result<Product, AppError> {
        self.store.product(id).await?.ok_or_else(|| not_found(id))
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self, page: Pagination) -> Result<Vec<Product>, AppError> {
        Ok(self.store.list_products(page).await?)
    }

    /// # Errors
    ///
    /// Returns a validation error for an inverted price range.
    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
            && min > max
        {
            return Err(DomainError::validation("minPrice cannot exceed maxPrice").into());
        }
        Ok(self.store.filter_products(filter).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn popular(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.store.popular_products().await?)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn new_arrivals(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.store.new_products().await?)
    }

    /// Normalize, validate and insert a batch of loosely typed rows.
    ///
    /// Invalid rows are reported and skipped; valid rows are inserted
    /// together.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty batch.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub async fn bulk_upload(&self, rows: &[Value]) -> Result<BulkReport, AppError> {
        if rows.is_empty() {
            return Err(DomainError::validation("Products array is required").into());
        }

        let (valid, report) = prepare_bulk(rows);
        if !valid.is_empty() {
            self.store.insert_products(valid).await?;
        }
        if report.failed > 0 {
            warn!(failed = report.failed, "Bulk upload skipped invalid rows");
        }
        info!(
            successful = report.successful,
            total = report.total,
            "Bulk upload completed"
        );
        Ok(report)
    }
}
