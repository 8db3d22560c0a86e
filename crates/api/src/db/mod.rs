//! Persistence for products, carts and orders.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` through sqlx, used when a database URL is configured
//! - [`MemoryStore`] - process-local maps, used for development and tests
//!
//! ## Tables
//!
//! - `products` - Catalog (prices as `NUMERIC`, sizes/images as `TEXT[]`)
//! - `carts` - One row per user, lines as JSONB
//! - `orders` - Items, address and status history as JSONB, status as text
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stride-cli -- migrate
//! ```
//!
//! # Edits
//!
//! Updates take a closure that mutates the loaded record. Both backends run
//! the read, the closure and the write while holding the record (row lock or
//! collection write lock), so a rule checked inside the closure still holds
//! when the result is written. A closure error aborts the write and comes
//! back as [`RepositoryError::Rejected`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use stride_core::cart::Cart;
use stride_core::order::{Address, Order};
use stride_core::product::{NewProduct, Pagination, Product, ProductFilter};
use stride_core::{DomainError, OrderId, PaymentMode, ProductId, UserId};
use thiserror::Error;

use crate::config::ApiConfig;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// An edit closure or checkout rule refused the change.
    #[error(transparent)]
    Rejected(#[from] DomainError),
}

/// Mutation applied to a stored product.
pub type ProductEdit<'a> = dyn Fn(&mut Product) -> Result<(), DomainError> + Send + Sync + 'a;
/// Mutation applied to a stored cart.
pub type CartEdit<'a> = dyn Fn(&mut Cart) -> Result<(), DomainError> + Send + Sync + 'a;
/// Mutation applied to a stored order.
pub type OrderEdit<'a> = dyn Fn(&mut Order) -> Result<(), DomainError> + Send + Sync + 'a;

/// Storage operations used by the services.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Insert every product or none. Returns the number inserted.
    async fn insert_products(&self, products: Vec<NewProduct>) -> Result<usize, RepositoryError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products among `ids` that still exist.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// One page of the catalog, by id.
    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, RepositoryError>;

    /// Products passing `filter`, ordered by its `sortBy`.
    async fn filter_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    async fn popular_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn new_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Apply `edit` to a product. `None` if it does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        edit: &ProductEdit<'_>,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Returns whether a product was deleted.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;

    async fn cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Apply `edit` to the user's cart, creating an empty one first when
    /// `create` is set. `None` if there is no cart and `create` is not set.
    async fn update_cart(
        &self,
        user: UserId,
        create: bool,
        edit: &CartEdit<'_>,
    ) -> Result<Option<Cart>, RepositoryError>;

    /// Snapshot the user's cart into a pending order and delete the cart,
    /// atomically.
    async fn place_order(
        &self,
        user: UserId,
        address: Address,
        payment_mode: PaymentMode,
    ) -> Result<Order, RepositoryError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Every order, or only `user`'s, newest first.
    async fn orders(&self, user: Option<UserId>) -> Result<Vec<Order>, RepositoryError>;

    /// Apply `edit` to an order. `None` if it does not exist.
    async fn update_order(
        &self,
        id: OrderId,
        edit: &OrderEdit<'_>,
    ) -> Result<Option<Order>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Pick the backend for `config`: `PostgreSQL` when a URL is set, memory otherwise.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database is configured but unreachable.
pub async fn init_store(config: &ApiConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    if let Some(url) = &config.database_url {
        let pool = create_pool(url).await?;
        tracing::info!("Connected to PostgreSQL");
        Ok(Arc::new(PgStore::new(pool)))
    } else {
        tracing::warn!("No database URL configured, using the in-memory store (data is lost on exit)");
        Ok(Arc::new(MemoryStore::new()))
    }
}
