//! Transition planning for the order lifecycle.
//!
//! A transition is decided here as pure data and applied by the store
//! inside a single transaction while it holds the order row lock. Keeping
//! the decision separate from the application means both store backends
//! share one set of rules, and the rules are testable without I/O.

use chrono::{DateTime, Duration, Utc};

use crate::error::DomainError;

use super::status::{OrderStatus, TransitionCause};
use super::types::Order;

/// How long after creation a customer may still cancel their order.
pub const CANCEL_WINDOW: Duration = Duration::minutes(5);

/// A requested status change with its cause.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub to: OrderStatus,
    pub cause: TransitionCause,
    /// Cancellation reason; ignored for forward transitions.
    pub reason: Option<String>,
}

impl TransitionRequest {
    /// A forward transition driven by the sweep.
    pub fn timer(to: OrderStatus) -> Self {
        Self {
            to,
            cause: TransitionCause::Timer,
            reason: None,
        }
    }

    /// A forward transition driven by an operator.
    pub fn operator(to: OrderStatus) -> Self {
        Self {
            to,
            cause: TransitionCause::Operator,
            reason: None,
        }
    }

    /// The review-subsystem shortcut from pending straight to shipping.
    pub fn review() -> Self {
        Self {
            to: OrderStatus::Shipping,
            cause: TransitionCause::Review,
            reason: None,
        }
    }

    /// A cancellation by the given actor.
    pub fn cancel(cause: TransitionCause, reason: impl Into<String>) -> Self {
        Self {
            to: OrderStatus::Cancelled,
            cause,
            reason: Some(reason.into()),
        }
    }
}

/// The effects a status change applies, decided before any row is touched.
///
/// `credit_points`, `refund_points`, and `revoke_points` are ledger
/// amounts (always ≥ 0 here; the store writes the signed ledger entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub to: OrderStatus,
    pub cause: TransitionCause,
    /// Reverse the stock/sold counters for every item (cancellation only).
    pub restore_stock: bool,
    /// Earn credit applied on the first transition out of `Pending`.
    pub credit_points: i64,
    /// Points debited at commit, returned on cancellation.
    pub refund_points: i64,
    /// Earn credit taken back when cancelling an already-credited order.
    pub revoke_points: i64,
    pub reason: Option<String>,
}

impl TransitionPlan {
    fn forward(order: &Order, req: &TransitionRequest) -> Self {
        // The earn credit fires exactly once: on the edge leaving Pending,
        // whether that is the normal confirmation or the review shortcut.
        let credit_points = if order.status == OrderStatus::Pending && !order.points_credited() {
            order.points_earned
        } else {
            0
        };

        Self {
            to: req.to,
            cause: req.cause,
            restore_stock: false,
            credit_points,
            refund_points: 0,
            revoke_points: 0,
            reason: None,
        }
    }

    fn cancellation(order: &Order, req: &TransitionRequest) -> Self {
        Self {
            to: OrderStatus::Cancelled,
            cause: req.cause,
            restore_stock: true,
            credit_points: 0,
            refund_points: order.points_used,
            revoke_points: if order.points_credited() {
                order.points_earned
            } else {
                0
            },
            reason: req.reason.clone(),
        }
    }
}

/// Validates a requested transition against the order's current state and
/// returns the plan of effects to apply.
///
/// The caller must hold whatever lock makes `order` stable for the
/// duration of applying the plan.
pub fn plan_transition(
    order: &Order,
    req: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, DomainError> {
    let from = order.status;

    if req.to == OrderStatus::Cancelled {
        if !from.can_cancel() {
            return Err(DomainError::InvalidTransition {
                from,
                to: OrderStatus::Cancelled,
            });
        }

        // The customer window is a wall-clock check against creation time,
        // not a state guard; operators are not subject to it.
        if req.cause == TransitionCause::Customer {
            let age = now - order.created_at;
            if age > CANCEL_WINDOW {
                return Err(DomainError::CancelWindowElapsed {
                    window_minutes: CANCEL_WINDOW.num_minutes(),
                    elapsed_minutes: age.num_minutes(),
                });
            }
        }

        return Ok(TransitionPlan::cancellation(order, req));
    }

    let edge_allowed = match (from, req.to) {
        // Linear happy path, one step at a time.
        (OrderStatus::Pending, OrderStatus::Confirmed)
        | (OrderStatus::Confirmed, OrderStatus::Preparing)
        | (OrderStatus::Preparing, OrderStatus::Shipping)
        | (OrderStatus::Shipping, OrderStatus::Delivered) => {
            matches!(
                req.cause,
                TransitionCause::Timer | TransitionCause::Operator
            )
        }
        // The review shortcut jumps a pending order straight to shipping.
        (OrderStatus::Pending, OrderStatus::Shipping) => req.cause == TransitionCause::Review,
        _ => false,
    };

    if !edge_allowed {
        return Err(DomainError::InvalidTransition { from, to: req.to });
    }

    Ok(TransitionPlan::forward(order, req))
}
