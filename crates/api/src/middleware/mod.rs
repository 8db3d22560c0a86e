//! HTTP middleware and request extractors.

pub mod auth;
pub mod request_id;

pub use auth::{Caller, RequireAdmin, RequireUser, TokenKey};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
