use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    CartLine, DomainError, LoyaltyKind, LoyaltyTransaction, Order, OrderDraft, OrderStatus,
    Product, TransitionRequest, Voucher, plan_transition,
};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::Store;

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    vouchers: HashMap<String, Voucher>,
    balances: HashMap<UserId, i64>,
    ledger: Vec<LoyaltyTransaction>,
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store implementation for testing.
///
/// All mutations happen under a single write lock, with a validate-first
/// pass so a failing guard leaves no partial effect, matching the
/// PostgreSQL implementation's transactional semantics.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub async fn insert_product(&self, product: Product) {
        self.inner
            .write()
            .await
            .products
            .insert(product.id, product);
    }

    /// Inserts or replaces a voucher, keyed by its code.
    pub async fn insert_voucher(&self, voucher: Voucher) {
        self.inner
            .write()
            .await
            .vouchers
            .insert(voucher.code.clone(), voucher);
    }

    /// Seeds a user's point balance.
    pub async fn set_balance(&self, user_id: UserId, balance: i64) {
        self.inner.write().await.balances.insert(user_id, balance);
    }

    /// Shifts an order's clock back by `by`, including every status
    /// timestamp that is set. Lets tests make orders "due" for the sweep
    /// or push them past the cancellation window.
    pub async fn backdate(&self, order_id: OrderId, by: Duration) {
        let mut inner = self.inner.write().await;
        if let Some(order) = inner.orders.get_mut(&order_id) {
            order.created_at -= by;
            for ts in [
                &mut order.confirmed_at,
                &mut order.preparing_at,
                &mut order.shipping_at,
                &mut order.delivered_at,
                &mut order.cancelled_at,
            ] {
                if let Some(t) = ts {
                    *t -= by;
                }
            }
        }
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn voucher_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        Ok(self.inner.read().await.vouchers.get(code).cloned())
    }

    async fn points_balance(&self, user_id: UserId) -> Result<i64> {
        Ok(self
            .inner
            .read()
            .await
            .balances
            .get(&user_id)
            .copied()
            .unwrap_or(0))
    }

    async fn ledger(&self, user_id: UserId) -> Result<Vec<LoyaltyTransaction>> {
        Ok(self
            .inner
            .read()
            .await
            .ledger
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        Ok(self
            .inner
            .read()
            .await
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_cart(&self, user_id: UserId, lines: Vec<CartLine>) -> Result<()> {
        self.inner.write().await.carts.insert(user_id, lines);
        Ok(())
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<Order> {
        let mut inner = self.inner.write().await;

        // Validate everything before touching any counter, so a failure
        // leaves no partial effect.
        for item in &draft.items {
            let product = inner
                .products
                .get(&item.product_id)
                .ok_or(DomainError::ProductNotFound(item.product_id))?;
            if product.stock < i64::from(item.quantity) {
                return Err(DomainError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    available: product.stock,
                    requested: item.quantity,
                }
                .into());
            }
        }

        if draft.points_used > 0 {
            let balance = inner.balances.get(&draft.user_id).copied().unwrap_or(0);
            if balance < draft.points_used {
                return Err(DomainError::InsufficientPoints {
                    balance,
                    requested: draft.points_used,
                }
                .into());
            }
        }

        if let Some(code) = &draft.voucher_code {
            let voucher = inner
                .vouchers
                .get(code)
                .ok_or_else(|| DomainError::VoucherExhausted { code: code.clone() })?;
            if let Some(limit) = voucher.usage_limit
                && voucher.used_count >= limit
            {
                return Err(DomainError::VoucherExhausted { code: code.clone() }.into());
            }
        }

        // Apply.
        let order_id = OrderId::new();

        for item in &draft.items {
            let product = inner
                .products
                .get_mut(&item.product_id)
                .ok_or(DomainError::ProductNotFound(item.product_id))?;
            product.stock -= i64::from(item.quantity);
            product.sold += i64::from(item.quantity);
        }

        if draft.points_used > 0 {
            *inner.balances.entry(draft.user_id).or_insert(0) -= draft.points_used;
            let entry = LoyaltyTransaction::new(
                draft.user_id,
                LoyaltyKind::Used,
                draft.points_used,
                Some(order_id),
                format!("Redeemed points on order {}", draft.order_no),
            );
            inner.ledger.push(entry);
        }

        if let Some(code) = &draft.voucher_code
            && let Some(voucher) = inner.vouchers.get_mut(code)
        {
            voucher.used_count += 1;
        }

        inner.carts.remove(&draft.user_id);

        let order = Order {
            id: order_id,
            user_id: draft.user_id,
            order_no: draft.order_no,
            status: OrderStatus::Pending,
            payment_method: draft.payment_method,
            shipping_method: draft.shipping_method,
            subtotal: draft.subtotal,
            shipping_fee: draft.shipping_fee,
            voucher_code: draft.voucher_code,
            voucher_discount: draft.voucher_discount,
            points_used: draft.points_used,
            points_earned: draft.points_earned,
            total: draft.total,
            shipping_address: draft.shipping_address,
            shipping_phone: draft.shipping_phone,
            notes: draft.notes,
            created_at: Utc::now(),
            confirmed_at: None,
            preparing_at: None,
            shipping_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            cancel_requested_at: None,
            cancel_request_reason: None,
            items: draft.items,
        };

        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn due_orders(&self, status: OrderStatus, cutoff: DateTime<Utc>) -> Result<Vec<OrderId>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| o.status == status && o.entered_status_at() <= cutoff)
            .map(|o| o.id)
            .collect())
    }

    async fn transition(&self, order_id: OrderId, req: TransitionRequest) -> Result<Order> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        let order = inner
            .orders
            .get(&order_id)
            .ok_or(DomainError::OrderNotFound(order_id))?
            .clone();

        let plan = plan_transition(&order, &req, now)?;

        if plan.restore_stock {
            for item in &order.items {
                if let Some(product) = inner.products.get_mut(&item.product_id) {
                    product.stock += i64::from(item.quantity);
                    product.sold -= i64::from(item.quantity);
                }
            }
        }

        if plan.refund_points > 0 {
            *inner.balances.entry(order.user_id).or_insert(0) += plan.refund_points;
            let entry = LoyaltyTransaction::new(
                order.user_id,
                LoyaltyKind::Earned,
                plan.refund_points,
                Some(order.id),
                format!("Points refunded for cancelled order {}", order.order_no),
            );
            inner.ledger.push(entry);
        }

        if plan.revoke_points > 0 {
            let balance = inner.balances.entry(order.user_id).or_insert(0);
            if *balance >= plan.revoke_points {
                *balance -= plan.revoke_points;
                let entry = LoyaltyTransaction::new(
                    order.user_id,
                    LoyaltyKind::Used,
                    plan.revoke_points,
                    Some(order.id),
                    format!("Points reversed for cancelled order {}", order.order_no),
                );
                inner.ledger.push(entry);
            } else {
                tracing::warn!(
                    order_id = %order.id,
                    points = plan.revoke_points,
                    balance = *balance,
                    "skipping earn reversal: balance no longer covers it"
                );
            }
        }

        if plan.credit_points > 0 {
            *inner.balances.entry(order.user_id).or_insert(0) += plan.credit_points;
            let entry = LoyaltyTransaction::new(
                order.user_id,
                LoyaltyKind::Earned,
                plan.credit_points,
                Some(order.id),
                format!("Points earned from order {}", order.order_no),
            );
            inner.ledger.push(entry);
        }

        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(DomainError::OrderNotFound(order_id))?;
        order.status = plan.to;
        match plan.to {
            OrderStatus::Confirmed => order.confirmed_at = Some(now),
            OrderStatus::Preparing => order.preparing_at = Some(now),
            OrderStatus::Shipping => order.shipping_at = Some(now),
            OrderStatus::Delivered => order.delivered_at = Some(now),
            OrderStatus::Cancelled => {
                order.cancelled_at = Some(now);
                order.cancellation_reason = plan.reason;
            }
            OrderStatus::Pending => {}
        }

        Ok(order.clone())
    }

    async fn record_cancel_request(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(DomainError::OrderNotFound(order_id))?;
        order.cancel_requested_at = Some(Utc::now());
        order.cancel_request_reason = Some(reason.to_string());
        Ok(order.clone())
    }
}
