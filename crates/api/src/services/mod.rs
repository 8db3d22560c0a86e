//! Business logic services for the API.
//!
//! # Services
//!
//! - `cart` - Cart add/remove/view for the signed-in shopper
//! - `orders` - Checkout, customer order actions, admin updates and dashboard actions
//! - `products` - Catalog management, browsing and bulk upload

pub mod cart;
pub mod orders;
pub mod products;

pub use cart::CartService;
pub use orders::OrderService;
pub use products::CatalogService;
