//! Notification collaborator trait.
//!
//! Delivery (email, push, websocket) lives outside this system; the engine
//! only talks to this trait, injected where needed rather than reached
//! through a process-wide handle. Every call is fire-and-forget: callers
//! log failures and move on.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use domain::Order;
use thiserror::Error;

/// A notification delivery failure. Swallowed (logged) by all callers.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound customer notifications emitted by the engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The order was committed.
    async fn order_created(&self, user_id: UserId, order: &Order) -> Result<(), NotifyError>;

    /// The order was confirmed.
    async fn order_confirmed(&self, user_id: UserId, order: &Order) -> Result<(), NotifyError>;

    /// Loyalty points were credited.
    async fn reward(&self, user_id: UserId, points: i64) -> Result<(), NotifyError>;
}

/// Notifier that logs every notification; the default wiring when no
/// delivery backend is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_created(&self, user_id: UserId, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(%user_id, order_no = %order.order_no, "notify: order created");
        Ok(())
    }

    async fn order_confirmed(&self, user_id: UserId, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(%user_id, order_no = %order.order_no, "notify: order confirmed");
        Ok(())
    }

    async fn reward(&self, user_id: UserId, points: i64) -> Result<(), NotifyError> {
        tracing::info!(%user_id, points, "notify: points credited");
        Ok(())
    }
}

/// One recorded notification, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationRecord {
    OrderCreated { user_id: UserId, order_no: String },
    OrderConfirmed { user_id: UserId, order_no: String },
    Reward { user_id: UserId, points: i64 },
}

#[derive(Debug, Default)]
struct RecordingState {
    records: Vec<NotificationRecord>,
    fail_all: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every subsequent call to fail.
    pub fn set_fail_all(&self, fail: bool) {
        self.state.write().unwrap().fail_all = fail;
    }

    /// Returns all recorded notifications in order.
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.state.read().unwrap().records.clone()
    }

    fn push(&self, record: NotificationRecord) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        if state.fail_all {
            return Err(NotifyError("recording notifier set to fail".to_string()));
        }
        state.records.push(record);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_created(&self, user_id: UserId, order: &Order) -> Result<(), NotifyError> {
        self.push(NotificationRecord::OrderCreated {
            user_id,
            order_no: order.order_no.clone(),
        })
    }

    async fn order_confirmed(&self, user_id: UserId, order: &Order) -> Result<(), NotifyError> {
        self.push(NotificationRecord::OrderConfirmed {
            user_id,
            order_no: order.order_no.clone(),
        })
    }

    async fn reward(&self, user_id: UserId, points: i64) -> Result<(), NotifyError> {
        self.push(NotificationRecord::Reward { user_id, points })
    }
}
