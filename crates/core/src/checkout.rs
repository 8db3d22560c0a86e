//! Turning a cart into an order.
//!
//! The snapshot copies each line with the product's current price. Lines
//! whose product has since been deleted are dropped; if nothing remains the
//! checkout fails with [`DomainError::EmptyCart`].

use std::collections::HashMap;

use serde::Deserialize;

use crate::cart::Cart;
use crate::error::DomainError;
use crate::order::{Address, OrderItem};
use crate::product::Product;
use crate::types::{PaymentMode, Price, ProductId, UserId};

/// Body of a place-order request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub address: Option<Address>,
    pub payment_mode: Option<PaymentMode>,
}

impl PlaceOrder {
    /// Require an address with every line filled in and a payment mode.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for anything missing.
    pub fn validate(&self) -> Result<(Address, PaymentMode), DomainError> {
        let (Some(address), Some(payment_mode)) = (&self.address, self.payment_mode) else {
            return Err(DomainError::validation(
                "Address and payment mode are required",
            ));
        };
        address.validate()?;
        Ok((address.clone(), payment_mode))
    }
}

/// An order ready to be persisted; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub address: Address,
    pub payment_mode: PaymentMode,
}

/// Snapshot `cart` against the current `catalog` prices.
///
/// # Errors
///
/// Returns [`DomainError::EmptyCart`] if no line references an existing product
/// and [`DomainError::Validation`] if the total exceeds [`Price::MAX`].
pub fn snapshot(
    cart: &Cart,
    catalog: &HashMap<ProductId, Product>,
    address: Address,
    payment_mode: PaymentMode,
) -> Result<NewOrder, DomainError> {
    let items: Vec<OrderItem> = cart
        .lines
        .iter()
        .filter_map(|line| {
            catalog.get(&line.product).map(|product| OrderItem {
                product: line.product,
                size: line.size.clone(),
                quantity: line.quantity,
                price: product.price,
            })
        })
        .collect();

    if items.is_empty() {
        return Err(DomainError::EmptyCart);
    }

    let total_amount = items
        .iter()
        .try_fold(Price::ZERO, |total, item| {
            item.line_total().and_then(|line| total.checked_add(line))
        })
        .ok_or_else(|| {
            DomainError::Validation(format!("Order total must not exceed {}", Price::MAX))
        })?;
    Ok(NewOrder {
        user_id: cart.user_id,
        items,
        total_amount,
        address,
        payment_mode,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::order::tests::{address, at};
    use crate::product::tests::product;

    fn catalog(products: &[Product]) -> HashMap<ProductId, Product> {
        products.iter().map(|p| (p.id, p.clone())).collect()
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let a = product(1, "Runner", 1000);
        let b = product(2, "Loafer", 500);
        let mut cart = Cart::new(UserId::new(7), at(0));
        cart.add(a.id, "42", 2, at(0)).unwrap();
        cart.add(b.id, "40", 1, at(0)).unwrap();

        let order = snapshot(&cart, &catalog(&[a, b]), address(), PaymentMode::Card).unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_amount, Price::from_cents(2500));
        assert_eq!(order.user_id, UserId::new(7));
    }

    #[test]
    fn test_deleted_products_are_dropped() {
        let a = product(1, "Runner", 1000);
        let mut cart = Cart::new(UserId::new(7), at(0));
        cart.add(a.id, "42", 1, at(0)).unwrap();
        cart.add(ProductId::new(99), "42", 5, at(0)).unwrap();

        let order = snapshot(&cart, &catalog(&[a]), address(), PaymentMode::Cod).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_amount, Price::from_cents(1000));
    }

    #[test]
    fn test_total_above_column_limit_is_rejected() {
        let mut yacht = product(1, "Gold Sneaker", 0);
        yacht.price = Price::MAX;
        let mut cart = Cart::new(UserId::new(7), at(0));
        cart.add(yacht.id, "42", 2, at(0)).unwrap();

        let err = snapshot(&cart, &catalog(&[yacht]), address(), PaymentMode::Card).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Order total must not exceed 9999999999.99")
        );
    }

    #[test]
    fn test_decimal_overflow_is_a_validation_error() {
        // Stored rows bypass product validation, so the catalog may hold anything
        let mut a = product(1, "Runner", 0);
        a.price = Price::new(rust_decimal::Decimal::MAX);
        let mut b = a.clone();
        b.id = ProductId::new(2);
        let mut cart = Cart::new(UserId::new(7), at(0));
        cart.add(a.id, "42", 100, at(0)).unwrap();
        cart.add(b.id, "42", 1, at(0)).unwrap();

        let err = snapshot(&cart, &catalog(&[a, b]), address(), PaymentMode::Cod).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::new(UserId::new(7), at(0));
        assert_eq!(
            snapshot(&cart, &HashMap::new(), address(), PaymentMode::Cod).unwrap_err(),
            DomainError::EmptyCart
        );

        let mut gone = cart;
        gone.add(ProductId::new(99), "42", 1, at(0)).unwrap();
        assert_eq!(
            snapshot(&gone, &HashMap::new(), address(), PaymentMode::Cod).unwrap_err(),
            DomainError::EmptyCart
        );
    }

    #[test]
    fn test_place_order_requires_address_and_payment() {
        let req: PlaceOrder =
            serde_json::from_value(serde_json::json!({"paymentMode": "cod"})).unwrap();
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));

        let req = PlaceOrder {
            address: Some(Address::default()),
            payment_mode: Some(PaymentMode::Cod),
        };
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));

        let req = PlaceOrder {
            address: Some(address()),
            payment_mode: Some(PaymentMode::Upi),
        };
        assert_eq!(req.validate().unwrap().1, PaymentMode::Upi);
    }
}
