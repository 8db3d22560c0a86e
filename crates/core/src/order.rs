//! Orders and their status history.
//!
//! An [`Order`] is an immutable snapshot of a cart plus a workflow position.
//! The position is the current [`OrderStatus`] and an append-only history of
//! [`StatusChange`] entries. The legacy per-stage booleans and comments that
//! clients still read are computed from that history by [`WorkflowFlags`];
//! they are never stored, so no contradictory combination can exist.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::NewOrder;
use crate::error::DomainError;
use crate::types::{OrderId, OrderStatus, PaymentMode, Price, ProductId, UserId};
use crate::workflow::Stage;

/// Delivery address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Address {
    /// Check that every required line is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] naming the missing fields.
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("fullName", &self.full_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "Address is incomplete: missing {}",
                missing.join(", ")
            )))
        }
    }
}

/// One line of an order, priced at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub size: String,
    pub quantity: u32,
    pub price: Price,
}

impl OrderItem {
    /// `price × quantity`, `None` if it does not fit a money column.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.price.checked_times(self.quantity)
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    #[serde(default)]
    pub comment: String,
    pub at: DateTime<Utc>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub address: Address,
    pub payment_mode: PaymentMode,
    pub status: OrderStatus,
    pub status_label: String,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize a checkout snapshot as a pending order.
    #[must_use]
    pub fn from_new(id: OrderId, new: NewOrder, at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            items: new.items,
            total_amount: new.total_amount,
            address: new.address,
            payment_mode: new.payment_mode,
            status: OrderStatus::Pending,
            status_label: OrderStatus::Pending.default_label().to_owned(),
            history: vec![StatusChange {
                status: OrderStatus::Pending,
                comment: String::new(),
                at,
            }],
            created_at: at,
            updated_at: at,
        }
    }

    /// Whether the order has ever entered `status`.
    #[must_use]
    pub fn reached(&self, status: OrderStatus) -> bool {
        self.history.iter().any(|change| change.status == status)
    }

    /// Dashboard bucket for this order.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        Stage::of(self.status)
    }

    /// Legacy booleans and comments, computed from the history.
    #[must_use]
    pub fn flags(&self) -> WorkflowFlags {
        WorkflowFlags::from_history(&self.history)
    }

    /// Response shape: the stored fields plus derived flags and stage.
    #[must_use]
    pub fn view(&self) -> OrderView<'_> {
        let stage = self.stage();
        OrderView {
            order: self,
            flags: self.flags(),
            stage,
            stage_label: stage.label(),
        }
    }

    /// Move to `next`, recording `comment` in the history.
    ///
    /// Without an explicit `label` the status' default label is used.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] if `next` is not a legal successor.
    pub fn advance(
        &mut self,
        next: OrderStatus,
        comment: &str,
        label: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition(next)?;
        self.history.push(StatusChange {
            status: next,
            comment: comment.trim().to_owned(),
            at,
        });
        self.status_label = label.unwrap_or(next.default_label()).to_owned();
        self.updated_at = at;
        Ok(())
    }

    /// Customer cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] if the order is already
    /// cancelled, delivered or past delivery.
    pub fn cancel(&mut self, reason: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status == OrderStatus::Cancelled {
            return Err(DomainError::invalid_state("Order is already cancelled"));
        }
        if self.status.is_completed() {
            return Err(DomainError::invalid_state(
                "Order is already completed and cannot be cancelled",
            ));
        }
        self.advance(OrderStatus::Cancelled, reason, None, at)
    }

    /// Customer return request. Only delivered orders qualify.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] unless the order is delivered.
    pub fn request_return(&mut self, reason: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != OrderStatus::Delivered {
            return Err(DomainError::invalid_state(
                "Only delivered orders can be returned",
            ));
        }
        self.advance(OrderStatus::ReturnRequested, reason, None, at)
    }

    /// Customer exchange request. Only delivered orders qualify.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] unless the order is delivered.
    pub fn request_exchange(&mut self, reason: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != OrderStatus::Delivered {
            return Err(DomainError::invalid_state(
                "Only delivered orders can be exchanged",
            ));
        }
        self.advance(OrderStatus::ExchangeRequested, reason, None, at)
    }

    /// Apply an admin partial update.
    ///
    /// `true` flags for stages not yet reached are transition requests and
    /// run in workflow order. Comments land on the latest history entry of
    /// their stage. Either everything applies or nothing does.
    ///
    /// # Errors
    ///
    /// - [`DomainError::InvalidState`] for an illegal transition or an attempt
    ///   to clear a reached stage.
    /// - [`DomainError::Validation`] for a comment on a stage never reached.
    pub fn apply_patch(&mut self, patch: &OrderPatch, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut next = self.clone();

        for (status, field, requested) in patch.flags() {
            match requested {
                Some(true) if !next.reached(status) => {
                    next.advance(status, "", None, at)?;
                }
                Some(false) if next.reached(status) => {
                    return Err(DomainError::InvalidState(format!(
                        "{field} cannot be cleared once the order is {status}"
                    )));
                }
                _ => {}
            }
        }

        for (field, comment) in patch.comments() {
            let Some(comment) = comment else { continue };
            let entry = next
                .history
                .iter_mut()
                .rev()
                .find(|change| field.statuses().contains(&change.status))
                .ok_or_else(|| {
                    DomainError::Validation(format!(
                        "{} given but the order has not reached that stage",
                        field.name()
                    ))
                })?;
            comment.trim().clone_into(&mut entry.comment);
        }

        if let Some(label) = &patch.status {
            label.trim().clone_into(&mut next.status_label);
        }

        if !patch.is_empty() {
            next.updated_at = at;
        }
        *self = next;
        Ok(())
    }
}

/// Listing order: newest first, ties broken by id descending.
#[must_use]
pub fn newest_first(a: &Order, b: &Order) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

/// An order as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView<'a> {
    #[serde(flatten)]
    pub order: &'a Order,
    #[serde(flatten)]
    pub flags: WorkflowFlags,
    pub stage: Stage,
    pub stage_label: &'static str,
}

/// Comment fields of the legacy order document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    OrderAcceptance,
    InProcess,
    InTransit,
    Shipped,
    Delivered,
    Cancelled,
    Exchange,
    Return,
}

impl CommentField {
    /// Wire name of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OrderAcceptance => "orderAcceptanceComment",
            Self::InProcess => "inProcessComment",
            Self::InTransit => "inTransitComment",
            Self::Shipped => "shippedComment",
            Self::Delivered => "deliveredComment",
            Self::Cancelled => "cancelledComment",
            Self::Exchange => "exchangeComment",
            Self::Return => "returnComment",
        }
    }

    /// History entries whose comment this field reads and writes.
    #[must_use]
    pub const fn statuses(self) -> &'static [OrderStatus] {
        match self {
            Self::OrderAcceptance => &[OrderStatus::Accepted],
            Self::InProcess => &[OrderStatus::Processing],
            Self::InTransit => &[OrderStatus::InTransit],
            Self::Shipped => &[OrderStatus::Shipped],
            Self::Delivered => &[OrderStatus::Delivered],
            Self::Cancelled => &[OrderStatus::Cancelled],
            Self::Exchange => &[OrderStatus::ExchangeRequested, OrderStatus::ExchangePickedUp],
            Self::Return => &[
                OrderStatus::ReturnRequested,
                OrderStatus::ReturnPicked,
                OrderStatus::RefundInitiated,
            ],
        }
    }

    /// Field for a status, if any.
    #[must_use]
    pub const fn for_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Accepted => Some(Self::OrderAcceptance),
            OrderStatus::Processing => Some(Self::InProcess),
            OrderStatus::InTransit => Some(Self::InTransit),
            OrderStatus::Shipped => Some(Self::Shipped),
            OrderStatus::Delivered => Some(Self::Delivered),
            OrderStatus::Cancelled => Some(Self::Cancelled),
            OrderStatus::ExchangeRequested | OrderStatus::ExchangePickedUp => Some(Self::Exchange),
            OrderStatus::ReturnRequested
            | OrderStatus::ReturnPicked
            | OrderStatus::RefundInitiated => Some(Self::Return),
        }
    }
}

/// The legacy flag and comment fields, derived from a status history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct WorkflowFlags {
    pub is_order_accepted: bool,
    pub is_in_process: bool,
    pub is_in_transit: bool,
    pub is_shipped: bool,
    pub is_delivered: bool,
    pub is_cancelled: bool,
    pub is_exchange_request: bool,
    pub is_exchange_pickup: bool,
    pub is_return_request: bool,
    pub is_return_picked: bool,
    pub is_refund_initiate: bool,
    pub order_acceptance_comment: String,
    pub in_process_comment: String,
    pub in_transit_comment: String,
    pub shipped_comment: String,
    pub delivered_comment: String,
    pub cancelled_comment: String,
    pub exchange_comment: String,
    pub return_comment: String,
}

impl WorkflowFlags {
    /// Compute flags and comments. For shared comment fields the latest
    /// non-empty comment wins.
    #[must_use]
    pub fn from_history(history: &[StatusChange]) -> Self {
        let mut flags = Self::default();
        for change in history {
            match change.status {
                OrderStatus::Pending => {}
                OrderStatus::Accepted => flags.is_order_accepted = true,
                OrderStatus::Processing => flags.is_in_process = true,
                OrderStatus::InTransit => flags.is_in_transit = true,
                OrderStatus::Shipped => flags.is_shipped = true,
                OrderStatus::Delivered => flags.is_delivered = true,
                OrderStatus::Cancelled => flags.is_cancelled = true,
                OrderStatus::ExchangeRequested => flags.is_exchange_request = true,
                OrderStatus::ExchangePickedUp => flags.is_exchange_pickup = true,
                OrderStatus::ReturnRequested => flags.is_return_request = true,
                OrderStatus::ReturnPicked => flags.is_return_picked = true,
                OrderStatus::RefundInitiated => flags.is_refund_initiate = true,
            }
            if let Some(field) = CommentField::for_status(change.status)
                && !change.comment.is_empty()
            {
                change.comment.clone_into(flags.comment_mut(field));
            }
        }
        flags
    }

    /// Current value of a comment field.
    #[must_use]
    pub fn comment(&self, field: CommentField) -> &str {
        match field {
            CommentField::OrderAcceptance => &self.order_acceptance_comment,
            CommentField::InProcess => &self.in_process_comment,
            CommentField::InTransit => &self.in_transit_comment,
            CommentField::Shipped => &self.shipped_comment,
            CommentField::Delivered => &self.delivered_comment,
            CommentField::Cancelled => &self.cancelled_comment,
            CommentField::Exchange => &self.exchange_comment,
            CommentField::Return => &self.return_comment,
        }
    }

    fn comment_mut(&mut self, field: CommentField) -> &mut String {
        match field {
            CommentField::OrderAcceptance => &mut self.order_acceptance_comment,
            CommentField::InProcess => &mut self.in_process_comment,
            CommentField::InTransit => &mut self.in_transit_comment,
            CommentField::Shipped => &mut self.shipped_comment,
            CommentField::Delivered => &mut self.delivered_comment,
            CommentField::Cancelled => &mut self.cancelled_comment,
            CommentField::Exchange => &mut self.exchange_comment,
            CommentField::Return => &mut self.return_comment,
        }
    }
}

/// Admin partial update, in the legacy field vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderPatch {
    pub is_order_accepted: Option<bool>,
    pub is_in_process: Option<bool>,
    pub is_in_transit: Option<bool>,
    pub is_shipped: Option<bool>,
    pub is_delivered: Option<bool>,
    pub is_cancelled: Option<bool>,
    pub is_exchange_request: Option<bool>,
    pub is_exchange_pickup: Option<bool>,
    pub is_return_request: Option<bool>,
    pub is_return_picked: Option<bool>,
    pub is_refund_initiate: Option<bool>,
    pub order_acceptance_comment: Option<String>,
    pub in_process_comment: Option<String>,
    pub in_transit_comment: Option<String>,
    pub shipped_comment: Option<String>,
    pub delivered_comment: Option<String>,
    pub cancelled_comment: Option<String>,
    pub exchange_comment: Option<String>,
    pub return_comment: Option<String>,
    /// Free-text status label.
    pub status: Option<String>,
}

impl OrderPatch {
    /// Flag requests in the order transitions are attempted.
    #[must_use]
    pub const fn flags(&self) -> [(OrderStatus, &'static str, Option<bool>); 11] {
        [
            (OrderStatus::Accepted, "isOrderAccepted", self.is_order_accepted),
            (OrderStatus::Processing, "isInProcess", self.is_in_process),
            (OrderStatus::InTransit, "isInTransit", self.is_in_transit),
            (OrderStatus::Shipped, "isShipped", self.is_shipped),
            (OrderStatus::Delivered, "isDelivered", self.is_delivered),
            (OrderStatus::ReturnRequested, "isReturnRequest", self.is_return_request),
            (OrderStatus::ReturnPicked, "isReturnPicked", self.is_return_picked),
            (OrderStatus::RefundInitiated, "isRefundInitiate", self.is_refund_initiate),
            (OrderStatus::ExchangeRequested, "isExchangeRequest", self.is_exchange_request),
            (OrderStatus::ExchangePickedUp, "isExchangePickup", self.is_exchange_pickup),
            (OrderStatus::Cancelled, "isCancelled", self.is_cancelled),
        ]
    }

    /// Comment fields present in the patch.
    #[must_use]
    pub fn comments(&self) -> [(CommentField, Option<&str>); 8] {
        [
            (CommentField::OrderAcceptance, self.order_acceptance_comment.as_deref()),
            (CommentField::InProcess, self.in_process_comment.as_deref()),
            (CommentField::InTransit, self.in_transit_comment.as_deref()),
            (CommentField::Shipped, self.shipped_comment.as_deref()),
            (CommentField::Delivered, self.delivered_comment.as_deref()),
            (CommentField::Cancelled, self.cancelled_comment.as_deref()),
            (CommentField::Exchange, self.exchange_comment.as_deref()),
            (CommentField::Return, self.return_comment.as_deref()),
        ]
    }

    /// `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Set the flag that requests a move to `status`.
    pub fn request(&mut self, status: OrderStatus) {
        let flag = match status {
            OrderStatus::Pending => return,
            OrderStatus::Accepted => &mut self.is_order_accepted,
            OrderStatus::Processing => &mut self.is_in_process,
            OrderStatus::InTransit => &mut self.is_in_transit,
            OrderStatus::Shipped => &mut self.is_shipped,
            OrderStatus::Delivered => &mut self.is_delivered,
            OrderStatus::Cancelled => &mut self.is_cancelled,
            OrderStatus::ExchangeRequested => &mut self.is_exchange_request,
            OrderStatus::ExchangePickedUp => &mut self.is_exchange_pickup,
            OrderStatus::ReturnRequested => &mut self.is_return_request,
            OrderStatus::ReturnPicked => &mut self.is_return_picked,
            OrderStatus::RefundInitiated => &mut self.is_refund_initiate,
        };
        *flag = Some(true);
    }

    /// Patch carrying a single comment field.
    #[must_use]
    pub fn with_comment(field: CommentField, comment: &str) -> Self {
        let mut patch = Self::default();
        let value = Some(comment.to_owned());
        match field {
            CommentField::OrderAcceptance => patch.order_acceptance_comment = value,
            CommentField::InProcess => patch.in_process_comment = value,
            CommentField::InTransit => patch.in_transit_comment = value,
            CommentField::Shipped => patch.shipped_comment = value,
            CommentField::Delivered => patch.delivered_comment = value,
            CommentField::Cancelled => patch.cancelled_comment = value,
            CommentField::Exchange => patch.exchange_comment = value,
            CommentField::Return => patch.return_comment = value,
        }
        patch
    }
}
