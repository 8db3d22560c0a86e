//! Dashboard stages and workflow pages.
//!
//! [`Stage::of`] is the only place that decides which bucket an order is
//! displayed in. The board, the per-page listings and the `stage` field of
//! every order response all go through it, so they cannot disagree.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DomainError;
use crate::order::{CommentField, Order, OrderPatch, OrderView};
use crate::types::OrderStatus;

/// Display bucket of an order. Exactly one applies to every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cancelled,
    Delivered,
    Shipped,
    InTransit,
    Processing,
    Accepted,
    ReturnExchange,
    Pending,
}

impl Stage {
    /// All stages in board display order.
    pub const ALL: [Self; 8] = [
        Self::Cancelled,
        Self::Delivered,
        Self::Shipped,
        Self::InTransit,
        Self::Processing,
        Self::Accepted,
        Self::ReturnExchange,
        Self::Pending,
    ];

    /// Bucket for a status.
    #[must_use]
    pub const fn of(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => Self::Pending,
            OrderStatus::Accepted => Self::Accepted,
            OrderStatus::Processing => Self::Processing,
            OrderStatus::InTransit => Self::InTransit,
            OrderStatus::Shipped => Self::Shipped,
            OrderStatus::Delivered => Self::Delivered,
            OrderStatus::Cancelled => Self::Cancelled,
            OrderStatus::ReturnRequested
            | OrderStatus::ReturnPicked
            | OrderStatus::RefundInitiated
            | OrderStatus::ExchangeRequested
            | OrderStatus::ExchangePickedUp => Self::ReturnExchange,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cancelled => "Cancelled",
            Self::Delivered => "Delivered",
            Self::Shipped => "Shipped",
            Self::InTransit => "In Transit",
            Self::Processing => "Processing",
            Self::Accepted => "Accepted",
            Self::ReturnExchange => "Return/Exchange",
            Self::Pending => "Pending",
        }
    }
}

/// A legal move offered by a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// What the action button of a page does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAction {
    pub button_text: &'static str,
    pub comment_label: &'static str,
    pub transitions: &'static [Transition],
}

/// One of the eight admin workflow pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Pending,
    Processing,
    Packing,
    Shipping,
    Delivery,
    Completed,
    Cancelled,
    Returns,
}

const fn step(from: OrderStatus, to: OrderStatus) -> Transition {
    Transition { from, to }
}

const ACCEPT: &[Transition] = &[step(OrderStatus::Pending, OrderStatus::Accepted)];
const PROCESS: &[Transition] = &[step(OrderStatus::Accepted, OrderStatus::Processing)];
const PACK: &[Transition] = &[step(OrderStatus::Processing, OrderStatus::InTransit)];
const SHIP: &[Transition] = &[step(OrderStatus::InTransit, OrderStatus::Shipped)];
const DELIVER: &[Transition] = &[step(OrderStatus::Shipped, OrderStatus::Delivered)];
const RETURNS: &[Transition] = &[
    step(OrderStatus::ReturnRequested, OrderStatus::ReturnPicked),
    step(OrderStatus::ReturnPicked, OrderStatus::RefundInitiated),
    step(OrderStatus::ExchangeRequested, OrderStatus::ExchangePickedUp),
];

impl Page {
    /// All pages in navigation order.
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::Processing,
        Self::Packing,
        Self::Shipping,
        Self::Delivery,
        Self::Completed,
        Self::Cancelled,
        Self::Returns,
    ];

    /// URL slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Packing => "packing",
            Self::Shipping => "shipping",
            Self::Delivery => "delivery",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Returns => "returns",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pending => "Pending Orders",
            Self::Processing => "In Processing",
            Self::Packing => "In Packing",
            Self::Shipping => "In Shipping",
            Self::Delivery => "In Delivery",
            Self::Completed => "Completed Orders",
            Self::Cancelled => "Cancelled Orders",
            Self::Returns => "Returns & Exchanges",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pending => "Accept new orders to begin processing them.",
            Self::Processing => {
                "Orders that are currently being processed and prepared for shipping."
            }
            Self::Packing => "Orders that are being packed and prepared for shipping.",
            Self::Shipping => "Orders that have been sent out for delivery.",
            Self::Delivery => "Orders that are out for final delivery to customers.",
            Self::Completed => "All orders that have been successfully delivered to customers.",
            Self::Cancelled => "View all cancelled orders.",
            Self::Returns => "Process customer returns and exchanges in one place.",
        }
    }

    /// The stage whose orders this page lists.
    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            Self::Pending => Stage::Pending,
            Self::Processing => Stage::Accepted,
            Self::Packing => Stage::Processing,
            Self::Shipping => Stage::InTransit,
            Self::Delivery => Stage::Shipped,
            Self::Completed => Stage::Delivered,
            Self::Cancelled => Stage::Cancelled,
            Self::Returns => Stage::ReturnExchange,
        }
    }

    /// Action offered by the page; view-only pages have none.
    #[must_use]
    pub const fn action(self) -> Option<PageAction> {
        let (button_text, comment_label, transitions) = match self {
            Self::Pending => ("Accept Order", "Acceptance Notes", ACCEPT),
            Self::Processing => ("Mark as Processing", "Processing Notes", PROCESS),
            Self::Packing => ("Mark as Packing", "Packing Notes", PACK),
            Self::Shipping => ("Mark as Shipping", "Shipping Notes", SHIP),
            Self::Delivery => ("Mark as Delivered", "Delivery Notes", DELIVER),
            Self::Returns => ("Process Request", "Processing Notes", RETURNS),
            Self::Completed | Self::Cancelled => return None,
        };
        Some(PageAction {
            button_text,
            comment_label,
            transitions,
        })
    }

    /// Whether `order` is listed on this page.
    #[must_use]
    pub fn lists(self, order: &Order) -> bool {
        order.stage() == self.stage()
    }

    /// Status the page action would move an order in `current` to.
    #[must_use]
    pub fn next_status(self, current: OrderStatus) -> Option<OrderStatus> {
        self.action()?
            .transitions
            .iter()
            .find(|t| t.from == current)
            .map(|t| t.to)
    }

    /// Patch equivalent of pressing the page's button with `comment`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] when the order is not listed on
    /// this page or the page is view-only.
    pub fn patch_for(self, order: &Order, comment: &str) -> Result<OrderPatch, DomainError> {
        if !self.lists(order) {
            return Err(DomainError::InvalidState(format!(
                "Order {} is not on the {} page",
                order.id,
                self.slug()
            )));
        }
        let next = self.next_status(order.status).ok_or_else(|| {
            DomainError::InvalidState(format!("The {} page has no action", self.slug()))
        })?;

        let mut patch = CommentField::for_status(next)
            .map(|field| OrderPatch::with_comment(field, comment))
            .unwrap_or_default();
        patch.request(next);
        Ok(patch)
    }

    /// Press the page's button: validate membership and apply the move.
    ///
    /// # Errors
    ///
    /// See [`Page::patch_for`] and [`Order::apply_patch`].
    pub fn advance(
        self,
        order: &mut Order,
        comment: &str,
        at: DateTime<Utc>,
    ) -> Result<OrderStatus, DomainError> {
        let patch = self.patch_for(order, comment)?;
        order.apply_patch(&patch, at)?;
        Ok(order.status)
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Page {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|page| page.slug() == s)
            .ok_or_else(|| DomainError::NotFound(format!("Page '{s}'")))
    }
}

/// Orders of one stage on the board.
#[derive(Debug, Clone, Serialize)]
pub struct StageBucket<'a> {
    pub stage: Stage,
    pub label: &'static str,
    pub count: usize,
    pub orders: Vec<OrderView<'a>>,
}

/// Every order grouped by stage.
#[derive(Debug, Clone, Serialize)]
pub struct Board<'a> {
    pub total: usize,
    pub stages: Vec<StageBucket<'a>>,
}

impl<'a> Board<'a> {
    /// Group `orders` (already sorted) by stage, keeping their order.
    #[must_use]
    pub fn build(orders: &'a [Order]) -> Self {
        let stages = Stage::ALL
            .into_iter()
            .map(|stage| {
                let orders: Vec<OrderView<'a>> = orders
                    .iter()
                    .filter(|order| order.stage() == stage)
                    .map(Order::view)
                    .collect();
                StageBucket {
                    stage,
                    label: stage.label(),
                    count: orders.len(),
                    orders,
                }
            })
            .collect();
        Self {
            total: orders.len(),
            stages,
        }
    }
}

/// One workflow page with its orders.
#[derive(Debug, Clone, Serialize)]
pub struct PageListing<'a> {
    pub page: Page,
    pub title: &'static str,
    pub description: &'static str,
    pub stage: Stage,
    pub action: Option<PageAction>,
    pub count: usize,
    pub orders: Vec<OrderView<'a>>,
}

impl<'a> PageListing<'a> {
    /// Orders listed on `page`, keeping the input order.
    #[must_use]
    pub fn build(page: Page, orders: &'a [Order]) -> Self {
        let orders: Vec<OrderView<'a>> = orders
            .iter()
            .filter(|order| page.lists(order))
            .map(Order::view)
            .collect();
        Self {
            page,
            title: page.title(),
            description: page.description(),
            stage: page.stage(),
            action: page.action(),
            count: orders.len(),
            orders,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::order::tests::{at, order_in};
    use crate::types::OrderId;

    fn pages_listing(order: &Order) -> Vec<Page> {
        Page::ALL.into_iter().filter(|p| p.lists(order)).collect()
    }

    #[test]
    fn test_every_status_lands_on_exactly_one_page() {
        for status in OrderStatus::ALL {
            let order = order_in(status);
            assert_eq!(pages_listing(&order).len(), 1, "{status}");
        }
    }

    #[test]
    fn test_stage_priority_order() {
        assert_eq!(Stage::ALL[0], Stage::Cancelled);
        assert_eq!(Stage::ALL[7], Stage::Pending);
        assert_eq!(Stage::of(OrderStatus::RefundInitiated), Stage::ReturnExchange);
    }

    #[test]
    fn test_accepting_moves_order_from_pending_to_processing_page() {
        let mut order = order_in(OrderStatus::Pending);
        assert_eq!(pages_listing(&order), vec![Page::Pending]);
        let next = Page::Pending.advance(&mut order, "ok", at(30)).unwrap();
        assert_eq!(next, OrderStatus::Accepted);
        assert_eq!(pages_listing(&order), vec![Page::Processing]);
        assert_eq!(order.flags().order_acceptance_comment, "ok");
        assert_eq!(order.status_label, "Accepted");
    }

    #[test]
    fn test_processing_moves_order_to_packing_page() {
        let mut order = order_in(OrderStatus::Accepted);
        Page::Processing.advance(&mut order, "", at(30)).unwrap();
        assert_eq!(pages_listing(&order), vec![Page::Packing]);
    }

    #[test]
    fn test_delivery_moves_order_to_completed() {
        let mut order = order_in(OrderStatus::Shipped);
        Page::Delivery.advance(&mut order, "left at door", at(30)).unwrap();
        assert_eq!(pages_listing(&order), vec![Page::Completed]);
        assert_eq!(order.flags().delivered_comment, "left at door");
    }

    #[test]
    fn test_action_on_wrong_page_is_rejected() {
        let mut order = order_in(OrderStatus::Pending);
        let before = order.clone();
        let err = Page::Shipping.advance(&mut order, "", at(30)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(order, before);
    }

    #[test]
    fn test_view_only_pages() {
        assert!(Page::Completed.action().is_none());
        let mut order = order_in(OrderStatus::Cancelled);
        assert!(Page::Cancelled.advance(&mut order, "", at(30)).is_err());
    }

    #[test]
    fn test_returns_page_follows_current_status() {
        let mut order = order_in(OrderStatus::ReturnRequested);
        assert_eq!(
            Page::Returns.advance(&mut order, "picked", at(30)).unwrap(),
            OrderStatus::ReturnPicked
        );
        assert_eq!(order.status_label, "Return Processing");
        assert_eq!(
            Page::Returns.advance(&mut order, "", at(31)).unwrap(),
            OrderStatus::RefundInitiated
        );
        assert!(Page::Returns.advance(&mut order, "", at(32)).is_err());

        let mut exchange = order_in(OrderStatus::ExchangeRequested);
        assert_eq!(
            Page::Returns.advance(&mut exchange, "", at(30)).unwrap(),
            OrderStatus::ExchangePickedUp
        );
        assert_eq!(exchange.status_label, "Exchange Processing");
    }

    #[test]
    fn test_page_from_slug() {
        assert_eq!("packing".parse::<Page>().unwrap(), Page::Packing);
        assert!(matches!(
            "archive".parse::<Page>().unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn test_board_counts_every_order_once() {
        let mut orders: Vec<Order> = OrderStatus::ALL.into_iter().map(order_in).collect();
        for (i, order) in (1..).zip(orders.iter_mut()) {
            order.id = OrderId::new(i);
        }
        let board = Board::build(&orders);
        assert_eq!(board.total, 12);
        let counted: usize = board.stages.iter().map(|b| b.count).sum();
        assert_eq!(counted, 12);
        let returns = board
            .stages
            .iter()
            .find(|b| b.stage == Stage::ReturnExchange)
            .unwrap();
        assert_eq!(returns.count, 5);
    }

    #[test]
    fn test_page_listing_serializes_action() {
        let orders = vec![order_in(OrderStatus::Pending), order_in(OrderStatus::Shipped)];
        let listing = PageListing::build(Page::Pending, &orders);
        assert_eq!(listing.count, 1);
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["action"]["buttonText"], "Accept Order");
        assert_eq!(json["action"]["transitions"][0]["to"], "accepted");
        assert_eq!(json["stage"], "pending");
    }
}
