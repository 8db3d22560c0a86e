//! Shopping carts.
//!
//! A user has at most one cart. Lines are keyed by `(product, size)`: adding
//! the same pair again increments the quantity instead of adding a line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::types::{ProductId, UserId};

/// Most units of one `(product, size)` a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 100;

fn too_many() -> DomainError {
    DomainError::Validation(format!("Quantity must be at most {MAX_LINE_QUANTITY}"))
}

/// One `(product, size)` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: ProductId,
    pub size: String,
    pub quantity: u32,
}

/// A user's active cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of an add-to-cart request. Everything is optional so missing fields
/// produce a domain validation error rather than a deserializer rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: Option<ProductId>,
    pub quantity: Option<u32>,
    pub size: Option<String>,
}

impl AddToCart {
    /// Check presence of every field and a quantity in `1..=MAX_LINE_QUANTITY`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] when anything is missing.
    pub fn validate(&self) -> Result<(ProductId, u32, String), DomainError> {
        let size = self.size.as_deref().map(str::trim).unwrap_or_default();
        let (Some(product), Some(quantity)) = (self.product_id, self.quantity) else {
            return Err(DomainError::validation("productId, quantity and size are required"));
        };
        if size.is_empty() {
            return Err(DomainError::validation("productId, quantity and size are required"));
        }
        if quantity == 0 {
            return Err(DomainError::validation("Quantity must be at least 1"));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(too_many());
        }
        Ok((product, quantity, size.to_owned()))
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new(user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Add `quantity` of `product` in `size`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the line would hold more than
    /// [`MAX_LINE_QUANTITY`]; the cart is left as it was.
    pub fn add(
        &mut self,
        product: ProductId,
        size: &str,
        quantity: u32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product == product && line.size == size);
        let merged = line
            .as_ref()
            .map_or(Some(quantity), |line| line.quantity.checked_add(quantity))
            .filter(|merged| *merged <= MAX_LINE_QUANTITY)
            .ok_or_else(too_many)?;

        match line {
            Some(line) => line.quantity = merged,
            None => self.lines.push(CartLine {
                product,
                size: size.to_owned(),
                quantity,
            }),
        }
        self.updated_at = at;
        Ok(())
    }

    /// Drop every line of `product`, whatever the size. Returns the number removed.
    pub fn remove_product(&mut self, product: ProductId, at: DateTime<Utc>) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line| line.product != product);
        self.updated_at = at;
        before - self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct products referenced by the cart, in first-seen order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product) {
                ids.push(line.product);
            }
        }
        ids
    }
}
