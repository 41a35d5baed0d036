//! Order status state machine.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Confirmed ──► Preparing ──► Shipping ──► Delivered
///    │            │             │            ▲
///    │            │             │            │ (review shortcut)
///    └────────────┴─────────────┴──► Cancelled
/// ```
///
/// `Cancelled` is reachable from `Pending`, `Confirmed`, and `Preparing`
/// only; `Shipping` and `Delivered` orders can no longer be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order was committed, awaiting confirmation.
    #[default]
    Pending,

    /// Order is confirmed; loyalty points have been credited.
    Confirmed,

    /// Drinks are being prepared.
    Preparing,

    /// Order is out for delivery.
    Shipping,

    /// Order has been delivered (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns the next status on the linear happy path, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Shipping),
            OrderStatus::Shipping => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if the order can still be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Preparing
        )
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// How long an order rests in this status before the sweep advances it.
    ///
    /// Returns None for terminal statuses.
    pub fn auto_advance_after(&self) -> Option<Duration> {
        match self {
            OrderStatus::Pending => Some(Duration::minutes(5)),
            OrderStatus::Confirmed => Some(Duration::minutes(30)),
            OrderStatus::Preparing => Some(Duration::minutes(60)),
            OrderStatus::Shipping => Some(Duration::minutes(120)),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "shipping" => Some(OrderStatus::Shipping),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What triggered a status transition.
///
/// Keeping the cause explicit makes the review shortcut and the sweep
/// auditable instead of burying them in unrelated code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// The recurring sweep advanced the order after its time-in-status.
    Timer,
    /// An operator moved the order manually.
    Operator,
    /// The review subsystem reported a review on a pending order.
    Review,
    /// The customer cancelled within the allowed window.
    Customer,
}

impl TransitionCause {
    /// Returns the cause name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionCause::Timer => "timer",
            TransitionCause::Operator => "operator",
            TransitionCause::Review => "review",
            TransitionCause::Customer => "customer",
        }
    }
}

impl std::fmt::Display for TransitionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_happy_path_is_linear() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::Confirmed.next(), Some(OrderStatus::Preparing));
        assert_eq!(OrderStatus::Preparing.next(), Some(OrderStatus::Shipping));
        assert_eq!(OrderStatus::Shipping.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn test_can_cancel_from_early_statuses_only() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(OrderStatus::Preparing.can_cancel());
        assert!(!OrderStatus::Shipping.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipping.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_auto_advance_delays() {
        assert_eq!(
            OrderStatus::Pending.auto_advance_after(),
            Some(Duration::minutes(5))
        );
        assert_eq!(
            OrderStatus::Confirmed.auto_advance_after(),
            Some(Duration::minutes(30))
        );
        assert_eq!(
            OrderStatus::Preparing.auto_advance_after(),
            Some(Duration::minutes(60))
        );
        assert_eq!(
            OrderStatus::Shipping.auto_advance_after(),
            Some(Duration::minutes(120))
        );
        assert_eq!(OrderStatus::Delivered.auto_advance_after(), None);
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipping,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("draft"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Preparing.to_string(), "preparing");
        assert_eq!(TransitionCause::Review.to_string(), "review");
    }
}
