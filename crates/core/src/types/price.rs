//! Decimal money amounts.
//!
//! The shop trades in a single currency, so a price is just a non-negative
//! [`Decimal`]. On the wire it is a plain JSON number (`19.99`), which is what
//! the storefront and dashboard clients send and compare against.
//!
//! Amounts are stored as `NUMERIC(12, 2)`, so anything with fractional cents
//! or above [`Price::MAX`] is rejected before it reaches a backend rather
//! than being rounded or overflowing there.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// A unit price or an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero, the total of nothing.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// `9999999999.99`, the largest amount a money column holds.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Decimal places kept by a money column.
    pub const SCALE: u32 = 2;

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Convert a float read from loosely typed input (bulk uploads, YAML).
    ///
    /// Returns `None` for NaN and infinities.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).map(|d| Self(d.normalize()))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// `true` when the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `true` when the amount has more than [`Self::SCALE`] decimal places.
    #[must_use]
    pub fn has_fractional_cents(&self) -> bool {
        self.0.normalize().scale() > Self::SCALE
    }

    /// Line total for `quantity` units at this price, or `None` above [`Self::MAX`].
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .filter(|total| *total <= Self::MAX)
    }

    /// `self + rhs`, or `None` above [`Self::MAX`].
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .filter(|total| *total <= Self::MAX)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
