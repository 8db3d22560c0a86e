//! Checkout, customer order actions and the admin workflow.
//!
//! Every state change goes through the store's `update_order`, so the
//! transition check runs against the locked, current order.

use chrono::{DateTime, Utc};
use stride_core::checkout::PlaceOrder;
use stride_core::order::{Order, OrderPatch};
use stride_core::workflow::Page;
use stride_core::{DomainError, OrderId, OrderStatus, UserId};
use tracing::{info, instrument};

use crate::db::{OrderEdit, Store};
use crate::error::AppError;

/// A customer-initiated change on one of their own orders.
type CustomerAction = fn(&mut Order, &str, DateTime<Utc>) -> Result<(), DomainError>;

fn not_found(id: OrderId) -> AppError {
    DomainError::NotFound(format!("Order {id}")).into()
}

/// Order service over a store.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Check out the user's cart.
    ///
    /// # Errors
    ///
    /// - validation error for a missing or incomplete address or payment mode
    /// - empty-cart error when nothing orderable is in the cart
    #[instrument(skip_all, fields(user = %user))]
    pub async fn place(&self, user: UserId, request: &PlaceOrder) -> Result<Order, AppError> {
        let (address, payment_mode) = request.validate()?;
        let order = self.store.place_order(user, address, payment_mode).await?;
        info!(
            order_id = %order.id,
            total = %order.total_amount,
            items = order.items.len(),
            "Order placed"
        );
        Ok(order)
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn mine(&self, user: UserId) -> Result<Vec<Order>, AppError> {
        Ok(self.store.orders(Some(user)).await?)
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn all(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.store.orders(None).await?)
    }

    /// # Errors
    ///
    /// Not-found unless the order exists and belongs to `user`; invalid-state
    /// if it is already cancelled or completed.
    pub async fn cancel(&self, user: UserId, id: OrderId, reason: &str) -> Result<Order, AppError> {
        self.customer_action(user, id, reason, "cancel", Order::cancel).await
    }

    /// # Errors
    ///
    /// Not-found as for [`Self::cancel`]; invalid-state unless delivered.
    pub async fn request_return(
        &self,
        user: UserId,
        id: OrderId,
        reason: &str,
    ) -> Result<Order, AppError> {
        self.customer_action(user, id, reason, "return", Order::request_return)
            .await
    }

    /// # Errors
    ///
    /// Not-found as for [`Self::cancel`]; invalid-state unless delivered.
    pub async fn request_exchange(
        &self,
        user: UserId,
        id: OrderId,
        reason: &str,
    ) -> Result<Order, AppError> {
        self.customer_action(user, id, reason, "exchange", Order::request_exchange)
            .await
    }

    #[instrument(skip_all, fields(user = %user, order_id = %id, kind = kind))]
    async fn customer_action(
        &self,
        user: UserId,
        id: OrderId,
        reason: &str,
        kind: &'static str,
        action: CustomerAction,
    ) -> Result<Order, AppError> {
        let at = Utc::now();
        let edit = |order: &mut Order| {
            // Someone else's order is reported exactly like a missing one.
            if order.user_id != user {
                return Err(DomainError::NotFound(format!("Order {id}")));
            }
            action(order, reason, at)
        };
        let order = self
            .store
            .update_order(id, &edit)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(status = %order.status, "Customer {kind} applied");
        Ok(order)
    }

    /// Apply an admin partial update.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown order; invalid-state or validation errors
    /// from the workflow leave the order untouched.
    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn update(&self, id: OrderId, patch: &OrderPatch) -> Result<Order, AppError> {
        let at = Utc::now();
        let edit: &OrderEdit<'_> = &|order: &mut Order| order.apply_patch(patch, at);
        let order = self
            .store
            .update_order(id, edit)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(status = %order.status, "Order updated");
        Ok(order)
    }

    /// Press a dashboard page's action button for one order.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown order; invalid-state if the order is not on
    /// `page` or the page is view-only.
    #[instrument(skip_all, fields(page = %page, order_id = %id))]
    pub async fn advance(&self, page: Page, id: OrderId, comment: &str) -> Result<Order, AppError> {
        let at = Utc::now();
        let edit = |order: &mut Order| page.advance(order, comment, at).map(|_: OrderStatus| ());
        let order = self
            .store
            .update_order(id, &edit)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(status = %order.status, "Order advanced from dashboard");
        Ok(order)
    }
}
