//! Domain error taxonomy.
//!
//! Every rule violation in this crate is reported as a [`DomainError`]. The
//! API layer maps each variant to an HTTP status and a stable `kind` string.

use thiserror::Error;

/// Errors raised by domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Input is missing, malformed or out of range.
    #[error("{0}")]
    Validation(String),

    /// The referenced entity does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(String),

    /// The entity exists but its current state forbids the operation.
    #[error("{0}")]
    InvalidState(String),

    /// Checkout was attempted without any orderable cart lines.
    #[error("Cart is empty")]
    EmptyCart,
}

impl DomainError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for an invalid-state failure.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Stable machine-readable kind, used as the `error` field of API bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::EmptyCart => "empty_cart",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DomainError::NotFound("Order 7".into()).to_string(), "Order 7 not found");
        assert_eq!(DomainError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            DomainError::validation("Address is required").to_string(),
            "Address is required"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(DomainError::validation("x").kind(), "validation_error");
        assert_eq!(DomainError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(DomainError::invalid_state("x").kind(), "invalid_state");
        assert_eq!(DomainError::EmptyCart.kind(), "empty_cart");
    }
}
