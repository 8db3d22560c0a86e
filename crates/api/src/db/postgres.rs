//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (`query_as::<_, Row>`) so the crate builds
//! without a live database. Edits run inside a transaction holding the row
//! with `SELECT ... FOR UPDATE`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use stride_core::cart::{Cart, CartLine};
use stride_core::checkout;
use stride_core::order::{Address, Order, OrderItem, StatusChange};
use stride_core::product::{NewProduct, Pagination, Product, ProductFilter, SortBy};
use stride_core::{
    DomainError, OrderId, OrderStatus, PaymentMode, Price, ProductId, UserId,
};

use super::{CartEdit, OrderEdit, ProductEdit, RepositoryError, Store};

/// Rows per multi-row insert; keeps bind parameters under the protocol limit.
const BULK_CHUNK: usize = 1000;

const PRODUCT_SELECT: &str = r"
    SELECT id, name, description, brandname, price, images, sizes, color,
           category, stock, ratings, discount, is_featured, is_active,
           is_popular, is_new, created_by, created_at, updated_at
    FROM products";

const CART_SELECT: &str = r"
    SELECT user_id, lines, created_at, updated_at
    FROM carts";

const ORDER_SELECT: &str = r"
    SELECT id, user_id, items, total_amount, address, payment_mode, status,
           status_label, history, created_at, updated_at
    FROM orders";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
#[allow(clippy::struct_excessive_bools)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    brandname: String,
    price: Decimal,
    images: Vec<String>,
    sizes: Vec<String>,
    color: String,
    category: String,
    stock: i32,
    ratings: Decimal,
    discount: Decimal,
    is_featured: bool,
    is_active: bool,
    is_popular: bool,
    is_new: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative stock for product {}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            brandname: row.brandname,
            price: Price::new(row.price),
            images: row.images,
            sizes: row.sizes,
            color: row.color,
            category: row.category,
            stock,
            ratings: row.ratings,
            discount: row.discount,
            is_featured: row.is_featured,
            is_active: row.is_active,
            is_popular: row.is_popular,
            is_new: row.is_new,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: i32,
    lines: Json<Vec<CartLine>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            lines: row.lines.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    address: Json<Address>,
    payment_mode: String,
    status: String,
    status_label: String,
    history: Json<Vec<StatusChange>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {} in database: {e}", row.id))
        })?;
        let payment_mode = row.payment_mode.parse::<PaymentMode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {} in database: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.0,
            total_amount: Price::new(row.total_amount),
            address: row.address.0,
            payment_mode,
            status,
            status_label: row.status_label,
            history: row.history.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `stock` column value; the column is a signed `INTEGER`.
fn stock_column(stock: u32) -> Result<i32, RepositoryError> {
    i32::try_from(stock).map_err(|_| DomainError::validation("Stock is out of range").into())
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let stock = stock_column(product.stock)?;
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, description, brandname, price, images, sizes,
                                  color, category, stock, ratings, discount, is_featured,
                                  is_active, is_popular, is_new, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, name, description, brandname, price, images, sizes, color,
                      category, stock, ratings, discount, is_featured, is_active,
                      is_popular, is_new, created_by, created_at, updated_at
            ",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(product.brandname)
        .bind(product.price.amount())
        .bind(product.images)
        .bind(product.sizes)
        .bind(product.color)
        .bind(product.category)
        .bind(stock)
        .bind(product.ratings)
        .bind(product.discount)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.is_popular)
        .bind(product.is_new)
        .bind(product.created_by)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn insert_products(&self, products: Vec<NewProduct>) -> Result<usize, RepositoryError> {
        if products.is_empty() {
            return Ok(0);
        }
        let stocks = products
            .iter()
            .map(|p| stock_column(p.stock))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;
        let rows: Vec<(NewProduct, i32)> = products.into_iter().zip(stocks).collect();
        for chunk in rows.chunks(BULK_CHUNK) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO products (name, description, brandname, price, images, sizes, \
                 color, category, stock, ratings, discount, is_featured, is_active, \
                 is_popular, is_new, created_by) ",
            );
            builder.push_values(chunk, |mut b, (p, stock)| {
                b.push_bind(p.name.clone())
                    .push_bind(p.description.clone())
                    .push_bind(p.brandname.clone())
                    .push_bind(p.price.amount())
                    .push_bind(p.images.clone())
                    .push_bind(p.sizes.clone())
                    .push_bind(p.color.clone())
                    .push_bind(p.category.clone())
                    .push_bind(*stock)
                    .push_bind(p.ratings)
                    .push_bind(p.discount)
                    .push_bind(p.is_featured)
                    .push_bind(p.is_active)
                    .push_bind(p.is_popular)
                    .push_bind(p.is_new)
                    .push_bind(p.created_by.clone());
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(rows.len())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, RepositoryError> {
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn filter_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        query.push(" WHERE TRUE");
        if let Some(brandname) = filter.brandname() {
            query.push(" AND brandname = ").push_bind(brandname.to_owned());
        }
        if let Some(size) = filter.size() {
            query.push(" AND ").push_bind(size.to_owned()).push(" = ANY(sizes)");
        }
        if let Some(color) = filter.color() {
            query.push(" AND color = ").push_bind(color.to_owned());
        }
        if let Some(category) = filter.category() {
            query.push(" AND category = ").push_bind(category.to_owned());
        }
        if let Some(min) = filter.min_price {
            query.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND price <= ").push_bind(max);
        }
        if let Some(search) = filter.search() {
            query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(search)));
        }
        query.push(match filter.sort_by {
            SortBy::PriceAsc => " ORDER BY price ASC, id",
            SortBy::PriceDesc => " ORDER BY price DESC, id",
            SortBy::Unsorted => " ORDER BY id",
        });

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn popular_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE is_popular ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn new_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE is_new ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_product(
        &self,
        id: ProductId,
        edit: &ProductEdit<'_>,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut product = Product::try_from(row)?;
        edit(&mut product)?;
        let stock = stock_column(product.stock)?;

        sqlx::query(
            r"
            UPDATE products
            SET name = $2, description = $3, brandname = $4, price = $5, images = $6,
                sizes = $7, color = $8, category = $9, stock = $10, ratings = $11,
                discount = $12, is_featured = $13, is_active = $14, is_popular = $15,
                is_new = $16, created_by = $17, updated_at = $18
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.brandname)
        .bind(product.price.amount())
        .bind(&product.images)
        .bind(&product.sizes)
        .bind(&product.color)
        .bind(&product.category)
        .bind(stock)
        .bind(product.ratings)
        .bind(product.discount)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.is_popular)
        .bind(product.is_new)
        .bind(&product.created_by)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(product))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!("{CART_SELECT} WHERE user_id = $1"))
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Cart::from))
    }

    async fn update_cart(
        &self,
        user: UserId,
        create: bool,
        edit: &CartEdit<'_>,
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if create {
            sqlx::query(
                r"
                INSERT INTO carts (user_id, lines)
                VALUES ($1, '[]'::jsonb)
                ON CONFLICT (user_id) DO NOTHING
                ",
            )
            .bind(user)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, CartRow>(&format!(
            "{CART_SELECT} WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut cart = Cart::from(row);
        edit(&mut cart)?;

        sqlx::query("UPDATE carts SET lines = $2, updated_at = $3 WHERE user_id = $1")
            .bind(user)
            .bind(Json(&cart.lines))
            .bind(cart.updated_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(cart))
    }

    async fn place_order(
        &self,
        user: UserId,
        address: Address,
        payment_mode: PaymentMode,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CartRow>(&format!(
            "{CART_SELECT} WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(DomainError::EmptyCart.into());
        };
        let cart = Cart::from(row);

        let ids: Vec<i32> = cart.product_ids().iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE id = ANY($1) FOR SHARE"
        ))
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;
        let catalog = rows
            .into_iter()
            .map(|row| Product::try_from(row).map(|p| (p.id, p)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        let new = checkout::snapshot(&cart, &catalog, address, payment_mode)?;
        let order = Order::from_new(OrderId::new(0), new, Utc::now());

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO orders (user_id, items, total_amount, address, payment_mode, status,
                                status_label, history, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.total_amount.amount())
        .bind(Json(&order.address))
        .bind(order.payment_mode.to_string())
        .bind(order.status.as_str())
        .bind(&order.status_label)
        .bind(Json(&order.history))
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Order {
            id: OrderId::new(id),
            ..order
        })
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn orders(&self, user: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let rows = match user {
            Some(user) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{ORDER_SELECT} WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
                ))
                .bind(user)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{ORDER_SELECT} ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_order(
        &self,
        id: OrderId,
        edit: &OrderEdit<'_>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = Order::try_from(row)?;
        edit(&mut order)?;

        sqlx::query(
            r"
            UPDATE orders
            SET status = $2, status_label = $3, history = $4, updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(order.status.as_str())
        .bind(&order.status_label)
        .bind(Json(&order.history))
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("runner"), "runner");
    }

    #[test]
    fn test_stock_column_range() {
        assert_eq!(stock_column(12).ok(), Some(12));
        assert!(matches!(
            stock_column(u32::MAX),
            Err(RepositoryError::Rejected(DomainError::Validation(_)))
        ));
    }

    #[test]
    fn test_unknown_status_is_data_corruption() {
        let row = OrderRow {
            id: 1,
            user_id: 2,
            items: Json(Vec::new()),
            total_amount: Decimal::ZERO,
            address: Json(Address::default()),
            payment_mode: "cod".to_string(),
            status: "teleported".to_string(),
            status_label: String::new(),
            history: Json(Vec::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            Order::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
