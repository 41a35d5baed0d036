//! The ordering engine: checkout and lifecycle.
//!
//! [`CheckoutService`] turns a cart into a committed order through one
//! atomic store operation; [`LifecycleEngine`] advances committed orders
//! through their statuses via the recurring sweep, operator actions, the
//! review shortcut, and cancellation with its compensating effects.

pub mod checkout;
pub mod error;
pub mod lifecycle;
pub mod notifier;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use error::OrderingError;
pub use lifecycle::{LifecycleEngine, SweepReport, spawn_sweeper};
pub use notifier::{LogNotifier, NotificationRecord, NotifyError, Notifier, RecordingNotifier};
