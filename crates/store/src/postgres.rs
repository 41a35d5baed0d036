use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId, VoucherId};
use domain::{
    CartLine, CupSize, DiscountKind, DomainError, IceLevel, LoyaltyKind, LoyaltyTransaction,
    Order, OrderDraft, OrderItem, OrderStatus, PaymentMethod, Product, ShippingMethod, SugarLevel,
    TransitionRequest, Voucher, plan_transition,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::Store;

/// How many times a lock-contended operation is attempted before the
/// caller sees a transient error.
const MAX_ATTEMPTS: u32 = 3;

/// PostgreSQL-backed store implementation.
///
/// Stock, balance, and voucher counters are guarded by conditional
/// updates; lifecycle transitions lock the order row with
/// `FOR UPDATE NOWAIT` and retry briefly on contention.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Retries `f` on lock contention with a short backoff, surfacing
    /// [`StoreError::Transient`] once the attempts are exhausted.
    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f().await {
                Err(StoreError::Database(e)) if is_lock_contention(&e) => {
                    if attempt >= MAX_ATTEMPTS {
                        tracing::warn!(op, attempt, "giving up after lock contention");
                        return Err(StoreError::Transient { attempts: attempt });
                    }
                    tracing::debug!(op, attempt, "retrying after lock contention");
                    tokio::time::sleep(std::time::Duration::from_millis(20 * u64::from(attempt)))
                        .await;
                }
                other => return other,
            }
        }
    }

    async fn try_commit_order(&self, draft: &OrderDraft) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Reserve inventory: conditional decrement per item, aborting the
        // whole transaction on the first shortfall.
        for item in &draft.items {
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - $1, sold = sold + $1 \
                 WHERE id = $2 AND stock >= $1",
            )
            .bind(i64::from(item.quantity))
            .bind(item.product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let row = sqlx::query("SELECT name, stock FROM products WHERE id = $1")
                    .bind(item.product_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

                return Err(match row {
                    Some(row) => DomainError::InsufficientStock {
                        product_id: item.product_id,
                        product_name: row.try_get("name")?,
                        available: row.try_get("stock")?,
                        requested: item.quantity,
                    },
                    None => DomainError::ProductNotFound(item.product_id),
                }
                .into());
            }
        }

        let order_id = OrderId::new();

        // Debit loyalty points, re-checking the balance under the same
        // transaction that the pre-validation ran outside of.
        if draft.points_used > 0 {
            let updated = sqlx::query(
                "UPDATE loyalty_accounts SET balance = balance - $1 \
                 WHERE user_id = $2 AND balance >= $1",
            )
            .bind(draft.points_used)
            .bind(draft.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let balance: Option<i64> =
                    sqlx::query_scalar("SELECT balance FROM loyalty_accounts WHERE user_id = $1")
                        .bind(draft.user_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(DomainError::InsufficientPoints {
                    balance: balance.unwrap_or(0),
                    requested: draft.points_used,
                }
                .into());
            }

            let entry = LoyaltyTransaction::new(
                draft.user_id,
                LoyaltyKind::Used,
                draft.points_used,
                Some(order_id),
                format!("Redeemed points on order {}", draft.order_no),
            );
            insert_ledger_entry(&mut tx, &entry).await?;
        }

        // Redeem the voucher. A concurrent exhaustion aborts the commit;
        // the checkout service retries once without the voucher.
        if let Some(code) = &draft.voucher_code {
            let updated = sqlx::query(
                "UPDATE vouchers SET used_count = used_count + 1 \
                 WHERE code = $1 AND (usage_limit IS NULL OR used_count < usage_limit)",
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(DomainError::VoucherExhausted { code: code.clone() }.into());
            }
        }

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                id, user_id, order_no, status, payment_method, shipping_method,
                subtotal, shipping_fee, voucher_code, voucher_discount,
                points_used, points_earned, total,
                shipping_address, shipping_phone, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(draft.user_id.as_uuid())
        .bind(&draft.order_no)
        .bind(OrderStatus::Pending.as_str())
        .bind(draft.payment_method.as_str())
        .bind(draft.shipping_method.as_str())
        .bind(draft.subtotal.amount())
        .bind(draft.shipping_fee.amount())
        .bind(&draft.voucher_code)
        .bind(draft.voucher_discount.amount())
        .bind(draft.points_used)
        .bind(draft.points_earned)
        .bind(draft.total.amount())
        .bind(&draft.shipping_address)
        .bind(&draft.shipping_phone)
        .bind(&draft.notes)
        .fetch_one(&mut *tx)
        .await?;

        for item in &draft.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, product_name, quantity, unit_price,
                    size, ice, sugar, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.unit_price.amount())
            .bind(item.size.as_str())
            .bind(item.ice.as_str())
            .bind(item.sugar.as_str())
            .bind(&item.notes)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(draft.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            user_id: draft.user_id,
            order_no: draft.order_no.clone(),
            status: OrderStatus::Pending,
            payment_method: draft.payment_method,
            shipping_method: draft.shipping_method,
            subtotal: draft.subtotal,
            shipping_fee: draft.shipping_fee,
            voucher_code: draft.voucher_code.clone(),
            voucher_discount: draft.voucher_discount,
            points_used: draft.points_used,
            points_earned: draft.points_earned,
            total: draft.total,
            shipping_address: draft.shipping_address.clone(),
            shipping_phone: draft.shipping_phone.clone(),
            notes: draft.notes.clone(),
            created_at,
            confirmed_at: None,
            preparing_at: None,
            shipping_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            cancel_requested_at: None,
            cancel_request_reason: None,
            items: draft.items.clone(),
        })
    }

    async fn try_transition(&self, order_id: OrderId, req: &TransitionRequest) -> Result<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Lock the order row so the sweep, operators, and cancellations
        // serialize against each other. NOWAIT turns a held lock into a
        // retryable error instead of an unbounded wait.
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1 FOR UPDATE NOWAIT")
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        let mut order = match row {
            Some(row) => row_to_order(&row)?,
            None => return Err(DomainError::OrderNotFound(order_id).into()),
        };
        order.items = fetch_items(&mut tx, order_id).await?;

        let plan = plan_transition(&order, req, now)?;

        if plan.restore_stock {
            for item in &order.items {
                sqlx::query(
                    "UPDATE products SET stock = stock + $1, sold = sold - $1 WHERE id = $2",
                )
                .bind(i64::from(item.quantity))
                .bind(item.product_id.as_uuid())
                .execute(&mut *tx)
                .await?;
            }
        }

        if plan.refund_points > 0 {
            credit_balance(&mut tx, order.user_id, plan.refund_points).await?;
            let entry = LoyaltyTransaction::new(
                order.user_id,
                LoyaltyKind::Earned,
                plan.refund_points,
                Some(order.id),
                format!("Points refunded for cancelled order {}", order.order_no),
            );
            insert_ledger_entry(&mut tx, &entry).await?;
        }

        if plan.revoke_points > 0 {
            let updated = sqlx::query(
                "UPDATE loyalty_accounts SET balance = balance - $1 \
                 WHERE user_id = $2 AND balance >= $1",
            )
            .bind(plan.revoke_points)
            .bind(order.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tracing::warn!(
                    order_id = %order.id,
                    points = plan.revoke_points,
                    "skipping earn reversal: balance no longer covers it"
                );
            } else {
                let entry = LoyaltyTransaction::new(
                    order.user_id,
                    LoyaltyKind::Used,
                    plan.revoke_points,
                    Some(order.id),
                    format!("Points reversed for cancelled order {}", order.order_no),
                );
                insert_ledger_entry(&mut tx, &entry).await?;
            }
        }

        if plan.credit_points > 0 {
            credit_balance(&mut tx, order.user_id, plan.credit_points).await?;
            let entry = LoyaltyTransaction::new(
                order.user_id,
                LoyaltyKind::Earned,
                plan.credit_points,
                Some(order.id),
                format!("Points earned from order {}", order.order_no),
            );
            insert_ledger_entry(&mut tx, &entry).await?;
        }

        let ts_column = status_timestamp_column(plan.to);
        let sql = format!(
            "UPDATE orders SET status = $1, {ts_column} = $2, cancellation_reason = $3 \
             WHERE id = $4"
        );
        sqlx::query(&sql)
            .bind(plan.to.as_str())
            .bind(now)
            .bind(&plan.reason)
            .bind(order.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

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

        Ok(order)
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, price, sale_price, stock, sold FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_product(&r)).transpose()
    }

    async fn voucher_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, discount_type, discount_value, min_order_amount,
                   max_discount_amount, starts_at, ends_at, usage_limit, used_count
            FROM vouchers
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_voucher(&r)).transpose()
    }

    async fn points_balance(&self, user_id: UserId) -> Result<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM loyalty_accounts WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    async fn ledger(&self, user_id: UserId) -> Result<Vec<LoyaltyTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, amount, order_id, description, created_at
            FROM loyalty_transactions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_ledger_entry).collect()
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, size, ice, sugar, notes \
             FROM cart_lines WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_cart_line).collect()
    }

    async fn replace_cart(&self, user_id: UserId, lines: Vec<CartLine>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO cart_lines (id, user_id, product_id, quantity, size, ice, sugar, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .bind(line.size.as_str())
            .bind(line.ice.as_str())
            .bind(line.sugar.as_str())
            .bind(&line.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<Order> {
        self.with_retry("commit_order", || self.try_commit_order(&draft))
            .await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut order = row_to_order(&row)?;
                order.items = self.items_for(id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut order = row_to_order(row)?;
            order.items = self.items_for(order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    async fn due_orders(&self, status: OrderStatus, cutoff: DateTime<Utc>) -> Result<Vec<OrderId>> {
        // Each status has its own entered-at column, matching the partial
        // indexes, so the sweep reads an index range instead of scanning.
        let column = match status {
            OrderStatus::Pending => "created_at",
            OrderStatus::Confirmed => "confirmed_at",
            OrderStatus::Preparing => "preparing_at",
            OrderStatus::Shipping => "shipping_at",
            OrderStatus::Delivered | OrderStatus::Cancelled => return Ok(Vec::new()),
        };

        let sql = format!("SELECT id FROM orders WHERE status = $1 AND {column} <= $2");
        let ids: Vec<Uuid> = sqlx::query_scalar(&sql)
            .bind(status.as_str())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(OrderId::from_uuid).collect())
    }

    async fn transition(&self, order_id: OrderId, req: TransitionRequest) -> Result<Order> {
        self.with_retry("transition", || self.try_transition(order_id, &req))
            .await
    }

    async fn record_cancel_request(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let row = sqlx::query(
            "UPDATE orders SET cancel_requested_at = now(), cancel_request_reason = $2 \
             WHERE id = $1 RETURNING *",
        )
        .bind(order_id.as_uuid())
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut order = row_to_order(&row)?;
                order.items = self.items_for(order_id).await?;
                Ok(order)
            }
            None => Err(DomainError::OrderNotFound(order_id).into()),
        }
    }
}

impl PostgresStore {
    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, unit_price, size, ice, sugar, notes
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }
}

fn is_lock_contention(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        // lock_not_available, serialization_failure, deadlock_detected
        matches!(
            db_err.code().as_deref(),
            Some("55P03") | Some("40001") | Some("40P01")
        )
    } else {
        false
    }
}

fn status_timestamp_column(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "created_at",
        OrderStatus::Confirmed => "confirmed_at",
        OrderStatus::Preparing => "preparing_at",
        OrderStatus::Shipping => "shipping_at",
        OrderStatus::Delivered => "delivered_at",
        OrderStatus::Cancelled => "cancelled_at",
    }
}

async fn fetch_items(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<Vec<OrderItem>> {
    let rows = sqlx::query(
        r#"
        SELECT product_id, product_name, quantity, unit_price, size, ice, sugar, notes
        FROM order_items
        WHERE order_id = $1
        "#,
    )
    .bind(order_id.as_uuid())
    .fetch_all(&mut **tx)
    .await?;

    rows.iter().map(row_to_item).collect()
}

async fn credit_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    points: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO loyalty_accounts (user_id, balance)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET balance = loyalty_accounts.balance + EXCLUDED.balance
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(points)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_ledger_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: &LoyaltyTransaction,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO loyalty_transactions (id, user_id, kind, amount, order_id, description, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.id)
    .bind(entry.user_id.as_uuid())
    .bind(entry.kind.as_str())
    .bind(entry.amount)
    .bind(entry.order_id.map(|id| id.as_uuid()))
    .bind(&entry.description)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn row_to_ledger_entry(row: &PgRow) -> Result<LoyaltyTransaction> {
    let kind_raw: String = row.try_get("kind")?;
    let kind = LoyaltyKind::parse(&kind_raw)
        .ok_or_else(|| corrupt("loyalty_transactions", "kind", &kind_raw))?;

    Ok(LoyaltyTransaction {
        id: row.try_get::<Uuid, _>("id")?,
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        kind,
        amount: row.try_get("amount")?,
        order_id: row
            .try_get::<Option<Uuid>, _>("order_id")?
            .map(OrderId::from_uuid),
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn corrupt(table: &'static str, column: &'static str, value: &str) -> StoreError {
    StoreError::CorruptValue {
        table,
        column,
        value: value.to_string(),
    }
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: domain::Money::new(row.try_get("price")?),
        sale_price: row
            .try_get::<Option<i64>, _>("sale_price")?
            .map(domain::Money::new),
        stock: row.try_get("stock")?,
        sold: row.try_get("sold")?,
    })
}

fn row_to_voucher(row: &PgRow) -> Result<Voucher> {
    let kind_raw: String = row.try_get("discount_type")?;
    let kind = DiscountKind::parse(&kind_raw)
        .ok_or_else(|| corrupt("vouchers", "discount_type", &kind_raw))?;

    Ok(Voucher {
        id: VoucherId::from_uuid(row.try_get::<Uuid, _>("id")?),
        code: row.try_get("code")?,
        kind,
        value: row.try_get("discount_value")?,
        min_order_amount: row
            .try_get::<Option<i64>, _>("min_order_amount")?
            .map(domain::Money::new),
        max_discount_amount: row
            .try_get::<Option<i64>, _>("max_discount_amount")?
            .map(domain::Money::new),
        starts_at: row.try_get("starts_at")?,
        ends_at: row.try_get("ends_at")?,
        usage_limit: row.try_get("usage_limit")?,
        used_count: row.try_get("used_count")?,
    })
}

fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
    let size_raw: String = row.try_get("size")?;
    let ice_raw: String = row.try_get("ice")?;
    let sugar_raw: String = row.try_get("sugar")?;

    Ok(CartLine {
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        size: CupSize::parse(&size_raw).ok_or_else(|| corrupt("cart_lines", "size", &size_raw))?,
        ice: IceLevel::parse(&ice_raw).ok_or_else(|| corrupt("cart_lines", "ice", &ice_raw))?,
        sugar: SugarLevel::parse(&sugar_raw)
            .ok_or_else(|| corrupt("cart_lines", "sugar", &sugar_raw))?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_item(row: &PgRow) -> Result<OrderItem> {
    let size_raw: String = row.try_get("size")?;
    let ice_raw: String = row.try_get("ice")?;
    let sugar_raw: String = row.try_get("sugar")?;

    Ok(OrderItem {
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        unit_price: domain::Money::new(row.try_get("unit_price")?),
        size: CupSize::parse(&size_raw).ok_or_else(|| corrupt("order_items", "size", &size_raw))?,
        ice: IceLevel::parse(&ice_raw).ok_or_else(|| corrupt("order_items", "ice", &ice_raw))?,
        sugar: SugarLevel::parse(&sugar_raw)
            .ok_or_else(|| corrupt("order_items", "sugar", &sugar_raw))?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let status_raw: String = row.try_get("status")?;
    let payment_raw: String = row.try_get("payment_method")?;
    let shipping_raw: String = row.try_get("shipping_method")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        order_no: row.try_get("order_no")?,
        status: OrderStatus::parse(&status_raw)
            .ok_or_else(|| corrupt("orders", "status", &status_raw))?,
        payment_method: PaymentMethod::parse(&payment_raw)
            .ok_or_else(|| corrupt("orders", "payment_method", &payment_raw))?,
        shipping_method: ShippingMethod::parse(&shipping_raw)
            .ok_or_else(|| corrupt("orders", "shipping_method", &shipping_raw))?,
        subtotal: domain::Money::new(row.try_get("subtotal")?),
        shipping_fee: domain::Money::new(row.try_get("shipping_fee")?),
        voucher_code: row.try_get("voucher_code")?,
        voucher_discount: domain::Money::new(row.try_get("voucher_discount")?),
        points_used: row.try_get("points_used")?,
        points_earned: row.try_get("points_earned")?,
        total: domain::Money::new(row.try_get("total")?),
        shipping_address: row.try_get("shipping_address")?,
        shipping_phone: row.try_get("shipping_phone")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        confirmed_at: row.try_get("confirmed_at")?,
        preparing_at: row.try_get("preparing_at")?,
        shipping_at: row.try_get("shipping_at")?,
        delivered_at: row.try_get("delivered_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
        cancellation_reason: row.try_get("cancellation_reason")?,
        cancel_requested_at: row.try_get("cancel_requested_at")?,
        cancel_request_reason: row.try_get("cancel_request_reason")?,
        items: Vec::new(),
    })
}
