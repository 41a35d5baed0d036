//! The Order Commit Transaction.

use std::sync::Arc;

use chrono::Utc;
use common::UserId;
use domain::{
    DomainError, Money, Order, OrderDraft, OrderItem, PaymentMethod, Pricing, ShippingMethod,
    generate_order_no, normalize_code, resolve_unit_price,
};
use serde::Deserialize;
use store::{Store, StoreError};

use crate::error::{OrderingError, Result};
use crate::notifier::Notifier;

/// Checkout parameters supplied by the customer.
///
/// The cart itself is read server-side; this carries everything else the
/// commit needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub shipping_phone: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub points_to_use: i64,
}

/// Converts carts into committed orders.
///
/// All pricing and validation happens here; the store applies the result
/// as one all-or-nothing operation whose internal guards re-check stock,
/// balance, and voucher capacity under the transaction.
pub struct CheckoutService<S: Store> {
    store: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: Store> CheckoutService<S> {
    /// Creates a new checkout service.
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Commits the user's cart as an order.
    ///
    /// See the crate docs for the step sequence; any failure before the
    /// store commit returns without side effects, and the store commit
    /// itself rolls back completely on any guard failure.
    #[tracing::instrument(skip(self, request), fields(%user_id))]
    pub async fn commit_order(&self, user_id: UserId, request: CheckoutRequest) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.commit_order_inner(user_id, request).await;

        match &result {
            Ok(order) => {
                metrics::histogram!("checkout_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!("checkout_orders_total").increment(1);
                tracing::info!(order_no = %order.order_no, total = %order.total, "order committed");
            }
            Err(e) => {
                metrics::counter!("checkout_failures_total").increment(1);
                tracing::info!(error = %e, "checkout rejected");
            }
        }

        result
    }

    async fn commit_order_inner(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<Order> {
        if request.points_to_use < 0 {
            return Err(DomainError::Validation {
                field: "points_to_use",
                message: "must not be negative".to_string(),
            }
            .into());
        }

        let cart = self.store.cart_lines(user_id).await?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart.into());
        }

        // Resolve products and capture unit prices as of right now.
        let mut items = Vec::with_capacity(cart.len());
        for line in cart {
            if line.quantity == 0 {
                return Err(DomainError::Validation {
                    field: "quantity",
                    message: "must be greater than zero".to_string(),
                }
                .into());
            }

            let product = self
                .store
                .product(line.product_id)
                .await?
                .ok_or(DomainError::ProductNotFound(line.product_id))?;

            items.push(OrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price: resolve_unit_price(&product, line.size),
                size: line.size,
                ice: line.ice,
                sugar: line.sugar,
                notes: line.notes,
            });
        }

        let subtotal: Money = items.iter().map(OrderItem::line_total).sum();

        // Hard check on points up front for a clear error; the store
        // re-checks under the transaction.
        if request.points_to_use > 0 {
            let balance = self.store.points_balance(user_id).await?;
            if request.points_to_use > balance {
                return Err(DomainError::InsufficientPoints {
                    balance,
                    requested: request.points_to_use,
                }
                .into());
            }
        }

        // An invalid voucher is dropped, not an error.
        let voucher = self.evaluate_voucher(request.voucher_code.as_deref(), subtotal).await?;

        let draft = build_draft(user_id, &request, &items, voucher);

        match self.store.commit_order(draft).await {
            Ok(order) => {
                self.notify_created(&order).await;
                Ok(order)
            }
            // The voucher cap was exhausted by a concurrent order between
            // validation and commit; drop it and commit once more.
            Err(StoreError::Domain(DomainError::VoucherExhausted { code })) => {
                tracing::warn!(code = %code, "voucher exhausted during commit, retrying without it");
                let draft = build_draft(user_id, &request, &items, None);
                let order = self.store.commit_order(draft).await?;
                self.notify_created(&order).await;
                Ok(order)
            }
            Err(e) => Err(OrderingError::Store(e)),
        }
    }

    async fn evaluate_voucher(
        &self,
        code: Option<&str>,
        subtotal: Money,
    ) -> Result<Option<(String, Money)>> {
        let Some(code) = code else {
            return Ok(None);
        };

        let normalized = normalize_code(code);
        let Some(voucher) = self.store.voucher_by_code(&normalized).await? else {
            tracing::debug!(code = %normalized, "voucher not found, proceeding without it");
            return Ok(None);
        };

        match voucher.evaluate(subtotal, Utc::now()) {
            Ok(discount) => Ok(Some((normalized, discount))),
            Err(rejection) => {
                tracing::debug!(
                    code = %normalized,
                    reason = %rejection,
                    "voucher rejected, proceeding without it"
                );
                Ok(None)
            }
        }
    }

    async fn notify_created(&self, order: &Order) {
        // Best effort; a notification failure never fails the checkout.
        if let Err(e) = self.notifier.order_created(order.user_id, order).await {
            tracing::warn!(order_no = %order.order_no, error = %e, "order-created notification failed");
        }
    }
}

fn build_draft(
    user_id: UserId,
    request: &CheckoutRequest,
    items: &[OrderItem],
    voucher: Option<(String, Money)>,
) -> OrderDraft {
    let (voucher_code, voucher_discount) = match voucher {
        Some((code, discount)) => (Some(code), discount),
        None => (None, Money::zero()),
    };

    let pricing = Pricing::compute(
        items,
        request.shipping_method,
        request.points_to_use,
        voucher_discount,
    );

    OrderDraft {
        user_id,
        order_no: generate_order_no(Utc::now()),
        payment_method: request.payment_method,
        shipping_method: request.shipping_method,
        subtotal: pricing.subtotal,
        shipping_fee: pricing.shipping_fee,
        voucher_code,
        voucher_discount: pricing.voucher_discount,
        points_used: pricing.points_used,
        points_earned: pricing.points_earned,
        total: pricing.total,
        shipping_address: request.shipping_address.clone(),
        shipping_phone: request.shipping_phone.clone(),
        notes: request.notes.clone(),
        items: items.to_vec(),
    }
}
