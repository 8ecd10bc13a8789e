//! Order lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// The status of an order in its fulfillment lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// Forward transitions along the fulfillment chain are admin-driven;
/// cancellation is open to the owning user as well. `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns true if line items can be added, updated, or removed.
    pub fn can_modify_items(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if the order can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position along the fulfillment chain; `Cancelled` is off-chain.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if an admin may move the order from this status to
    /// `target`. Only strictly forward moves along the fulfillment chain are
    /// allowed; cancellation follows [`OrderStatus::can_cancel`].
    pub fn can_advance_to(&self, target: OrderStatus) -> bool {
        if target == OrderStatus::Cancelled {
            return self.can_cancel();
        }
        match (self.rank(), target.rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its database representation.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(EngineError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn items_modifiable_until_shipped() {
        assert!(OrderStatus::Pending.can_modify_items());
        assert!(OrderStatus::Processing.can_modify_items());
        assert!(!OrderStatus::Shipped.can_modify_items());
        assert!(!OrderStatus::Delivered.can_modify_items());
        assert!(!OrderStatus::Cancelled.can_modify_items());
    }

    #[test]
    fn cancellable_from_pending_and_processing_only() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Processing.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn advance_is_forward_only() {
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Delivered));
        assert!(OrderStatus::Processing.can_advance_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_advance_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Shipped.can_advance_to(OrderStatus::Pending));
        assert!(!OrderStatus::Processing.can_advance_to(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_advance_to(OrderStatus::Pending));
    }

    #[test]
    fn advance_to_cancelled_follows_cancellation_rules() {
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_advance_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_advance_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_advance_to(OrderStatus::Cancelled));
    }

    #[test]
    fn parse_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::parse("draft").is_err());
    }
}
