//! In-memory store.
//!
//! Each collection sits behind its own `tokio::sync::RwLock`. Operations that
//! touch several collections take the locks in the order carts, products,
//! orders.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use stride_core::cart::Cart;
use stride_core::checkout;
use stride_core::order::{self, Address, Order};
use stride_core::product::{NewProduct, Pagination, Product, ProductFilter};
use stride_core::{DomainError, OrderId, PaymentMode, ProductId, UserId};
use tokio::sync::RwLock;

use super::{CartEdit, OrderEdit, ProductEdit, RepositoryError, Store};

/// Process-local store. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    carts: RwLock<HashMap<UserId, Cart>>,
    products: RwLock<BTreeMap<ProductId, Product>>,
    orders: RwLock<BTreeMap<OrderId, Order>>,
    last_product_id: AtomicI32,
    last_order_id: AtomicI32,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_product_id(&self) -> ProductId {
        ProductId::new(self.last_product_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn next_order_id(&self) -> OrderId {
        OrderId::new(self.last_order_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        let product = Product::from_new(self.next_product_id(), product, Utc::now());
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn insert_products(&self, new: Vec<NewProduct>) -> Result<usize, RepositoryError> {
        let mut products = self.products.write().await;
        let at = Utc::now();
        let count = new.len();
        for product in new {
            let product = Product::from_new(self.next_product_id(), product, at);
            products.insert(product.id, product);
        }
        Ok(count)
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn list_products(&self, page: Pagination) -> Result<Vec<Product>, RepositoryError> {
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(self
            .products
            .read()
            .await
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn filter_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut matching: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect();
        filter.sort(&mut matching);
        Ok(matching)
    }

    async fn popular_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.is_popular).cloned().collect())
    }

    async fn new_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.is_new).cloned().collect())
    }

    async fn update_product(
        &self,
        id: ProductId,
        edit: &ProductEdit<'_>,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        let Some(current) = products.get_mut(&id) else {
            return Ok(None);
        };
        let mut next = current.clone();
        edit(&mut next)?;
        current.clone_from(&next);
        Ok(Some(next))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.read().await.get(&user).cloned())
    }

    async fn update_cart(
        &self,
        user: UserId,
        create: bool,
        edit: &CartEdit<'_>,
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut carts = self.carts.write().await;
        let mut next = match carts.get(&user) {
            Some(cart) => cart.clone(),
            None if create => Cart::new(user, Utc::now()),
            None => return Ok(None),
        };
        edit(&mut next)?;
        carts.insert(user, next.clone());
        Ok(Some(next))
    }

    async fn place_order(
        &self,
        user: UserId,
        address: Address,
        payment_mode: PaymentMode,
    ) -> Result<Order, RepositoryError> {
        let mut carts = self.carts.write().await;
        let Some(cart) = carts.get(&user) else {
            return Err(DomainError::EmptyCart.into());
        };

        let products = self.products.read().await;
        let catalog: HashMap<ProductId, Product> = cart
            .product_ids()
            .into_iter()
            .filter_map(|id| products.get(&id).map(|p| (id, p.clone())))
            .collect();
        drop(products);

        let new = checkout::snapshot(cart, &catalog, address, payment_mode)?;

        let mut orders = self.orders.write().await;
        let order = Order::from_new(self.next_order_id(), new, Utc::now());
        orders.insert(order.id, order.clone());
        carts.remove(&user);
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn orders(&self, user: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| user.is_none_or(|u| o.user_id == u))
            .cloned()
            .collect();
        orders.sort_by(order::newest_first);
        Ok(orders)
    }

    async fn update_order(
        &self,
        id: OrderId,
        edit: &OrderEdit<'_>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut orders = self.orders.write().await;
        let Some(current) = orders.get_mut(&id) else {
            return Ok(None);
        };
        let mut next = current.clone();
        edit(&mut next)?;
        current.clone_from(&next);
        Ok(Some(next))
    }
}
