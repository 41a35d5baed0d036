//! The order lifecycle engine.
//!
//! Orders advance `pending → confirmed → preparing → shipping → delivered`
//! on timers or operator actions, with two special paths: the review
//! shortcut (`pending → shipping`) and cancellation with its compensating
//! effects. Each order's transition runs in its own store transaction, so
//! one failure never blocks the rest of a sweep.

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{
    DomainError, Order, OrderStatus, TransitionCause, TransitionRequest,
};
use store::Store;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::notifier::Notifier;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Orders advanced to their next status.
    pub advanced: usize,
    /// Orders whose transition failed (logged, not propagated).
    pub failed: usize,
}

/// Drives order status changes from every trigger: timer, operator,
/// review callback, and cancellation.
pub struct LifecycleEngine<S: Store> {
    store: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: Store> LifecycleEngine<S> {
    /// Creates a new lifecycle engine.
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Runs one sweep pass: advances every order whose time-in-status has
    /// elapsed. Per-order failures are logged and counted; the sweep never
    /// fails as a whole.
    #[tracing::instrument(skip(self))]
    pub async fn run_sweep(&self) -> SweepReport {
        let now = Utc::now();
        let mut report = SweepReport::default();

        for from in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipping,
        ] {
            let (Some(delay), Some(to)) = (from.auto_advance_after(), from.next()) else {
                continue;
            };

            let due = match self.store.due_orders(from, now - delay).await {
                Ok(due) => due,
                Err(e) => {
                    tracing::error!(%from, error = %e, "sweep: listing due orders failed");
                    continue;
                }
            };

            for order_id in due {
                match self.apply(order_id, TransitionRequest::timer(to)).await {
                    Ok(_) => {
                        report.advanced += 1;
                        metrics::counter!("sweep_transitions_total").increment(1);
                    }
                    Err(e) => {
                        // A racing manual transition or cancellation is
                        // expected here; log and keep sweeping.
                        report.failed += 1;
                        metrics::counter!("sweep_failures_total").increment(1);
                        tracing::warn!(%order_id, %from, %to, error = %e, "sweep: transition failed");
                    }
                }
            }
        }

        report
    }

    /// Applies an operator-driven forward transition.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, to: OrderStatus) -> Result<Order> {
        self.apply(order_id, TransitionRequest::operator(to)).await
    }

    /// Cancels an order on behalf of its owner. Subject to the 5-minute
    /// window and the pending/confirmed/preparing state guard.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_by_customer(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reason: impl Into<String>,
    ) -> Result<Order> {
        self.owned_order(user_id, order_id).await?;
        let order = self
            .apply(
                order_id,
                TransitionRequest::cancel(TransitionCause::Customer, reason),
            )
            .await?;
        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(order)
    }

    /// Cancels an order as an operator: no time window, same state guard.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_by_operator(
        &self,
        order_id: OrderId,
        reason: impl Into<String>,
    ) -> Result<Order> {
        let order = self
            .apply(
                order_id,
                TransitionRequest::cancel(TransitionCause::Operator, reason),
            )
            .await?;
        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(order)
    }

    /// Records a cancellation request on an order past its window. No
    /// status change; an operator follows up manually.
    #[tracing::instrument(skip(self, reason))]
    pub async fn request_cancellation(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reason: &str,
    ) -> Result<Order> {
        let order = self.owned_order(user_id, order_id).await?;
        if order.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }
        Ok(self.store.record_cancel_request(order_id, reason).await?)
    }

    /// Handles the review-subsystem callback: a review on a pending order
    /// jumps it straight to shipping. Returns `None` when the order is no
    /// longer pending (the callback is then a no-op).
    #[tracing::instrument(skip(self))]
    pub async fn review_submitted(&self, order_id: OrderId) -> Result<Option<Order>> {
        match self.apply(order_id, TransitionRequest::review()).await {
            Ok(order) => Ok(Some(order)),
            Err(e) if matches!(e.domain_kind(), Some(domain::ErrorKind::State)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Loads an order by id without an ownership check (admin/read path).
    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order_id).into())
    }

    async fn apply(&self, order_id: OrderId, req: TransitionRequest) -> Result<Order> {
        let to = req.to;
        let cause = req.cause;
        let order = self.store.transition(order_id, req).await?;

        // The earn credit fires on the edge leaving Pending: the normal
        // confirmation or the review shortcut.
        let credited = to == OrderStatus::Confirmed
            || (to == OrderStatus::Shipping && cause == TransitionCause::Review);

        if to == OrderStatus::Confirmed
            && let Err(e) = self.notifier.order_confirmed(order.user_id, &order).await
        {
            tracing::warn!(order_no = %order.order_no, error = %e, "order-confirmed notification failed");
        }

        if credited
            && order.points_earned > 0
            && let Err(e) = self.notifier.reward(order.user_id, order.points_earned).await
        {
            tracing::warn!(order_no = %order.order_no, error = %e, "reward notification failed");
        }

        Ok(order)
    }

    /// Loads an order and verifies ownership, hiding other users' orders
    /// behind a not-found error.
    async fn owned_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(DomainError::OrderNotFound(order_id).into());
        }
        Ok(order)
    }
}

/// Spawns the recurring sweep as a background task.
///
/// The handle can be aborted on shutdown; a missed tick is delayed rather
/// than burst.
pub fn spawn_sweeper<S: Store + 'static>(
    engine: Arc<LifecycleEngine<S>>,
    period: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let report = engine.run_sweep().await;
            if report.advanced > 0 || report.failed > 0 {
                tracing::info!(
                    advanced = report.advanced,
                    failed = report.failed,
                    "sweep pass finished"
                );
            }
        }
    })
}
