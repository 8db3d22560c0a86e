//! Status enums for orders, payments and callers.
//!
//! [`OrderStatus`] is the single source of truth for where an order is in the
//! fulfilment workflow. Every move goes through [`OrderStatus::transition`],
//! which knows the legal predecessors of each state:
//!
//! ```text
//! pending -> accepted -> processing -> in_transit -> shipped -> delivered
//!    \__________\___________\______________\___________\
//!                                                       -> cancelled
//! delivered -> return_requested -> return_picked -> refund_initiated
//! delivered -> exchange_requested -> exchange_picked_up
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Where an order is in the fulfilment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Processing,
    InTransit,
    Shipped,
    Delivered,
    Cancelled,
    ReturnRequested,
    ReturnPicked,
    RefundInitiated,
    ExchangeRequested,
    ExchangePickedUp,
}

impl OrderStatus {
    /// Every status, forward path first.
    pub const ALL: [Self; 12] = [
        Self::Pending,
        Self::Accepted,
        Self::Processing,
        Self::InTransit,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::ReturnRequested,
        Self::ReturnPicked,
        Self::RefundInitiated,
        Self::ExchangeRequested,
        Self::ExchangePickedUp,
    ];

    /// Wire name, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Processing => "processing",
            Self::InTransit => "in_transit",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::ReturnRequested => "return_requested",
            Self::ReturnPicked => "return_picked",
            Self::RefundInitiated => "refund_initiated",
            Self::ExchangeRequested => "exchange_requested",
            Self::ExchangePickedUp => "exchange_picked_up",
        }
    }

    /// Label shown to customers and on the dashboard after entering this status.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Processing => "Processing",
            Self::InTransit => "Packing",
            Self::Shipped => "Shipping",
            Self::Delivered => "Delivered",
            Self::Cancelled => "cancelled",
            Self::ReturnRequested => "Return Requested",
            Self::ReturnPicked => "Return Processing",
            Self::RefundInitiated => "Refund Initiated",
            Self::ExchangeRequested => "Exchange Requested",
            Self::ExchangePickedUp => "Exchange Processing",
        }
    }

    /// Whether `next` may directly follow `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Accepted, Self::Processing)
                | (Self::Processing, Self::InTransit)
                | (Self::InTransit, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (
                    Self::Pending
                        | Self::Accepted
                        | Self::Processing
                        | Self::InTransit
                        | Self::Shipped,
                    Self::Cancelled
                )
                | (Self::Delivered, Self::ReturnRequested | Self::ExchangeRequested)
                | (Self::ReturnRequested, Self::ReturnPicked)
                | (Self::ReturnPicked, Self::RefundInitiated)
                | (Self::ExchangeRequested, Self::ExchangePickedUp)
        )
    }

    /// Validate a move from `self` to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] when `next` is not a legal successor.
    pub fn transition(self, next: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidState(format!(
                "Order cannot move from {self} to {next}"
            )))
        }
    }

    /// Whether a customer may still cancel.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        self.can_transition_to(Self::Cancelled)
    }

    /// Delivered or any state after delivery.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(
            self,
            Self::Delivered
                | Self::ReturnRequested
                | Self::ReturnPicked
                | Self::RefundInitiated
                | Self::ExchangeRequested
                | Self::ExchangePickedUp
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Cash on delivery.
    #[serde(alias = "COD")]
    Cod,
    Card,
    Upi,
    NetBanking,
    Wallet,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Card => write!(f, "card"),
            Self::Upi => write!(f, "upi"),
            Self::NetBanking => write!(f, "net_banking"),
            Self::Wallet => write!(f, "wallet"),
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" | "COD" => Ok(Self::Cod),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "net_banking" => Ok(Self::NetBanking),
            "wallet" => Ok(Self::Wallet),
            _ => Err(format!("invalid payment mode: {s}")),
        }
    }
}

/// Role carried in a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A shopper. May manage their own cart and orders.
    Customer,
    /// Staff. May manage every order and the catalog.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Processing,
            OrderStatus::InTransit,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            assert_eq!(pair[0].transition(pair[1]), Ok(pair[1]));
        }
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let err = OrderStatus::Pending
            .transition(OrderStatus::Shipped)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert!(!OrderStatus::Accepted.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::ReturnRequested));
    }

    #[test]
    fn test_cancellable_until_delivered() {
        for status in OrderStatus::ALL {
            let expected = matches!(
                status,
                OrderStatus::Pending
                    | OrderStatus::Accepted
                    | OrderStatus::Processing
                    | OrderStatus::InTransit
                    | OrderStatus::Shipped
            );
            assert_eq!(status.is_cancellable(), expected, "{status}");
        }
    }

    #[test]
    fn test_cancelled_is_terminal() {
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_post_delivery_branches() {
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::ReturnRequested));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::ExchangeRequested));
        assert!(OrderStatus::ReturnPicked.can_transition_to(OrderStatus::RefundInitiated));
        assert!(!OrderStatus::ExchangeRequested.can_transition_to(OrderStatus::ReturnPicked));
        assert!(OrderStatus::RefundInitiated.is_completed());
        assert!(!OrderStatus::Shipped.is_completed());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
        assert!("on_hold".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_mode_accepts_legacy_cod() {
        let mode: PaymentMode = serde_json::from_str("\"COD\"").unwrap();
        assert_eq!(mode, PaymentMode::Cod);
        assert_eq!("net_banking".parse::<PaymentMode>().unwrap(), PaymentMode::NetBanking);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Customer.to_string(), "customer");
    }
}
