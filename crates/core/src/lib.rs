//! Stride Core - Domain types and order workflow rules.
//!
//! This crate is shared by every Stride component:
//! - `api` - JSON REST service for carts, orders, products and the admin dashboard
//! - `cli` - Command-line tools for migrations, catalog seeding and dev tokens
//! - `integration-tests` - End-to-end tests against a running router
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Every rule that decides whether an order may move, which
//! dashboard bucket it belongs to, or what a checkout costs lives here so the
//! storage backends cannot disagree about it.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, order status and roles
//! - [`workflow`] - Stage derivation and the admin dashboard pages
//! - [`order`] - Orders, status history, partial updates
//! - [`cart`] - Cart lines and merge rules
//! - [`checkout`] - Turning a cart into an order snapshot
//! - [`product`] - Catalog products, filters and bulk-row normalization
//! - [`error`] - Domain error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod error;
pub mod order;
pub mod product;
pub mod types;
pub mod workflow;

pub use error::DomainError;
pub use types::*;
