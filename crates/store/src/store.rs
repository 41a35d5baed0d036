//! The storage trait: the system's atomic units.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    CartLine, LoyaltyTransaction, Order, OrderDraft, OrderStatus, Product, TransitionRequest,
    Voucher,
};

use crate::error::Result;

/// Storage operations for the ordering engine.
///
/// Every mutating method is atomic: either all of its effects are applied
/// or none are. The two multi-row operations, [`commit_order`] and
/// [`transition`], are the Order Commit Transaction and the lifecycle
/// step respectively; their internal guards (conditional stock decrement,
/// balance check, voucher cap, status check under the row lock) are what
/// make concurrent checkouts and sweeps safe.
///
/// [`commit_order`]: Store::commit_order
/// [`transition`]: Store::transition
#[async_trait]
pub trait Store: Send + Sync {
    // -- Lookups --

    /// Loads a product by id.
    async fn product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Loads a voucher by its normalized code.
    async fn voucher_by_code(&self, code: &str) -> Result<Option<Voucher>>;

    /// Returns the user's current point balance (0 for unknown users).
    async fn points_balance(&self, user_id: UserId) -> Result<i64>;

    /// Returns the user's loyalty ledger, oldest first.
    async fn ledger(&self, user_id: UserId) -> Result<Vec<LoyaltyTransaction>>;

    /// Returns the user's cart lines.
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>>;

    /// Replaces the user's cart with the given lines.
    async fn replace_cart(&self, user_id: UserId, lines: Vec<CartLine>) -> Result<()>;

    // -- The Order Commit Transaction --

    /// Commits a priced order atomically: conditional stock decrements,
    /// order + item insertion, voucher redemption, loyalty debit with its
    /// ledger entry, and cart clearing. Any guard failure rolls back every
    /// effect and surfaces the corresponding [`domain::DomainError`].
    async fn commit_order(&self, draft: OrderDraft) -> Result<Order>;

    // -- Order reads --

    /// Loads an order with its items.
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    // -- Lifecycle --

    /// Returns the ids of orders in `status` that entered it at or before
    /// `cutoff`, i.e. the ones the sweep is due to advance.
    async fn due_orders(&self, status: OrderStatus, cutoff: DateTime<Utc>) -> Result<Vec<OrderId>>;

    /// Applies a status transition under the order row lock: validates the
    /// edge via [`domain::plan_transition`], then applies the planned
    /// stock/ledger effects and timestamps in the same transaction.
    async fn transition(&self, order_id: OrderId, req: TransitionRequest) -> Result<Order>;

    /// Records a cancellation request on an order without changing its
    /// status; an operator acts on it manually.
    async fn record_cancel_request(&self, order_id: OrderId, reason: &str) -> Result<Order>;
}
