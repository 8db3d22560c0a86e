//! Entity identifiers.
//!
//! Users, products and orders all live in `SERIAL` columns, so each ID is an
//! `i32` underneath. Wrapping them keeps a product ID from being passed where
//! an order ID is expected:
//!
//! ```compile_fail
//! use stride_core::{OrderId, ProductId};
//!
//! fn cancel(_order: OrderId) {}
//!
//! cancel(ProductId::new(7));
//! ```
//!
//! On the wire and in route paths they stay plain numbers:
//!
//! ```
//! use stride_core::OrderId;
//!
//! let id: OrderId = serde_json::from_str("42").unwrap();
//! assert_eq!(id.to_string(), "42");
//! assert_eq!(id.as_i32(), 42);
//! ```

macro_rules! entity_ids {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            /// The column value, for binding arrays of IDs.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    )+};
}

entity_ids! {
    /// A shopper or admin account, as carried in bearer tokens.
    UserId,
    /// A catalog product.
    ProductId,
    /// A placed order.
    OrderId,
}
