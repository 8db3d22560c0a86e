//! Cart operations for the signed-in shopper.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stride_core::cart::{AddToCart, Cart};
use stride_core::product::ProductSummary;
use stride_core::{DomainError, ProductId, UserId};
use tracing::instrument;

use crate::db::Store;
use crate::error::AppError;

/// A cart line with its product summary. `product` is `None` when the
/// product has been deleted since it was added.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: ProductId,
    pub product: Option<ProductSummary>,
    pub size: String,
    pub quantity: u32,
}

/// A cart as returned to the shopper.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub user: UserId,
    pub items: Vec<CartItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart service over a store.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add a product line, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing fields, a quantity outside
    /// `1..=MAX_LINE_QUANTITY` (after merging) or an unknown product.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn add(&self, user: UserId, request: &AddToCart) -> Result<Cart, AppError> {
        let (product, quantity, size) = request.validate()?;
        if self.store.product(product).await?.is_none() {
            return Err(DomainError::validation("Invalid product ID").into());
        }

        let at = Utc::now();
        let cart = self
            .store
            .update_cart(user, true, &|cart: &mut Cart| cart.add(product, &size, quantity, at))
            .await?
            .ok_or_else(|| AppError::Internal(format!("cart for user {user} was not created")))?;

        tracing::info!(%product, quantity, "Added to cart");
        Ok(cart)
    }

    /// Remove every line of `product`.
    ///
    /// # Errors
    ///
    /// Returns not-found if the user has no cart.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<Cart, AppError> {
        let at = Utc::now();
        self.store
            .update_cart(user, false, &|cart: &mut Cart| {
                cart.remove_product(product, at);
                Ok(())
            })
            .await?
            .ok_or_else(|| DomainError::NotFound("Cart".to_string()).into())
    }

    /// The user's cart with product summaries, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn view(&self, user: UserId) -> Result<Option<CartView>, AppError> {
        let Some(cart) = self.store.cart(user).await? else {
            return Ok(None);
        };

        let products: HashMap<ProductId, ProductSummary> = self
            .store
            .products_by_ids(&cart.product_ids())
            .await?
            .iter()
            .map(|p| (p.id, p.summary()))
            .collect();

        let items = cart
            .lines
            .into_iter()
            .map(|line| CartItemView {
                product_id: line.product,
                product: products.get(&line.product).cloned(),
                size: line.size,
                quantity: line.quantity,
            })
            .collect();

        Ok(Some(CartView {
            user: cart.user_id,
            items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::db::memory::tests::new_product;

    fn add(product: ProductId, quantity: u32, size: &str) -> AddToCart {
        AddToCart {
            product_id: Some(product),
            quantity: Some(quantity),
            size: Some(size.to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_merges_and_view_populates() {
        let store = MemoryStore::new();
        let shoe = store.insert_product(new_product("Runner", 1000)).await.unwrap();
        let service = CartService::new(&store);
        let user = UserId::new(3);

        service.add(user, &add(shoe.id, 1, "42")).await.unwrap();
        let cart = service.add(user, &add(shoe.id, 2, "42")).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);

        let view = service.view(user).await.unwrap().unwrap();
        let summary = view.items[0].product.as_ref().unwrap();
        assert_eq!(summary.name, "Runner");
    }

    #[tokio::test]
    async fn test_merge_past_line_limit_keeps_cart() {
        let store = MemoryStore::new();
        let shoe = store.insert_product(new_product("Runner", 1000)).await.unwrap();
        let service = CartService::new(&store);
        let user = UserId::new(3);

        service.add(user, &add(shoe.id, 60, "42")).await.unwrap();
        let err = service.add(user, &add(shoe.id, 60, "42")).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let cart = store.cart(user).await.unwrap().unwrap();
        assert_eq!(cart.lines[0].quantity, 60);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_validation() {
        let store = MemoryStore::new();
        let err = CartService::new(&store)
            .add(UserId::new(3), &add(ProductId::new(404), 1, "42"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Validation(_))));
        assert!(store.cart(UserId::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_without_cart_is_not_found() {
        let store = MemoryStore::new();
        let err = CartService::new(&store)
            .remove(UserId::new(3), ProductId::new(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cart not found");
    }

    #[tokio::test]
    async fn test_view_keeps_lines_of_deleted_products() {
        let store = MemoryStore::new();
        let shoe = store.insert_product(new_product("Runner", 1000)).await.unwrap();
        let service = CartService::new(&store);
        let user = UserId::new(3);
        service.add(user, &add(shoe.id, 1, "42")).await.unwrap();
        store.delete_product(shoe.id).await.unwrap();

        let view = service.view(user).await.unwrap().unwrap();
        assert_eq!(view.items.len(), 1);
        assert!(view.items[0].product.is_none());
        assert!(service.view(UserId::new(4)).await.unwrap().is_none());
    }
}
