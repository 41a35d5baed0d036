//! Order, item, and cart types.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

use super::status::OrderStatus;

/// Cup size for a drink. The large cup carries a fixed surcharge on top
/// of the resolved unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CupSize {
    #[default]
    Regular,
    Large,
}

impl CupSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CupSize::Regular => "regular",
            CupSize::Large => "large",
        }
    }

    pub fn parse(s: &str) -> Option<CupSize> {
        match s {
            "regular" => Some(CupSize::Regular),
            "large" => Some(CupSize::Large),
            _ => None,
        }
    }
}

/// Ice level for a drink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IceLevel {
    None,
    Less,
    #[default]
    Normal,
    Extra,
}

impl IceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IceLevel::None => "none",
            IceLevel::Less => "less",
            IceLevel::Normal => "normal",
            IceLevel::Extra => "extra",
        }
    }

    pub fn parse(s: &str) -> Option<IceLevel> {
        match s {
            "none" => Some(IceLevel::None),
            "less" => Some(IceLevel::Less),
            "normal" => Some(IceLevel::Normal),
            "extra" => Some(IceLevel::Extra),
            _ => None,
        }
    }
}

/// Sugar level for a drink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SugarLevel {
    None,
    Less,
    #[default]
    Normal,
    Extra,
}

impl SugarLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SugarLevel::None => "none",
            SugarLevel::Less => "less",
            SugarLevel::Normal => "normal",
            SugarLevel::Extra => "extra",
        }
    }

    pub fn parse(s: &str) -> Option<SugarLevel> {
        match s {
            "none" => Some(SugarLevel::None),
            "less" => Some(SugarLevel::Less),
            "normal" => Some(SugarLevel::Normal),
            "extra" => Some(SugarLevel::Extra),
            _ => None,
        }
    }
}

/// How the customer pays for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    BankTransfer,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentMethod> {
        match s {
            "cod" => Some(PaymentMethod::Cod),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "card" => Some(PaymentMethod::Card),
            _ => None,
        }
    }
}

/// Shipping method, each carrying a fixed fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    /// Returns the flat shipping fee for this method.
    pub fn fee(&self) -> Money {
        match self {
            ShippingMethod::Standard => Money::new(10_000),
            ShippingMethod::Express => Money::new(30_000),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
        }
    }

    pub fn parse(s: &str) -> Option<ShippingMethod> {
        match s {
            "standard" => Some(ShippingMethod::Standard),
            "express" => Some(ShippingMethod::Express),
            _ => None,
        }
    }
}

/// A catalog product as seen by the ordering engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// List price per regular cup.
    pub price: Money,
    /// Discounted price, taking precedence over `price` when present.
    pub sale_price: Option<Money>,
    /// Units currently available. Never negative.
    pub stock: i64,
    /// Cumulative units sold.
    pub sold: i64,
}

/// One row of a user's cart: a product plus the chosen drink options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub size: CupSize,
    #[serde(default)]
    pub ice: IceLevel,
    #[serde(default)]
    pub sugar: SugarLevel,
    #[serde(default)]
    pub notes: Option<String>,
}

/// An item of a committed order.
///
/// The unit price is captured at commit time and never changes, no matter
/// what happens to the catalog price afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub size: CupSize,
    pub ice: IceLevel,
    pub sugar: SugarLevel,
    pub notes: Option<String>,
}

impl OrderItem {
    /// Returns quantity × unit price for this line.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A committed order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Unique human-readable order number, e.g. `ORD-20260805-3FA9C1`.
    pub order_no: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub voucher_code: Option<String>,
    pub voucher_discount: Money,
    pub points_used: i64,
    pub points_earned: i64,
    pub total: Money,
    pub shipping_address: String,
    pub shipping_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub shipping_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancel_requested_at: Option<DateTime<Utc>>,
    pub cancel_request_reason: Option<String>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Returns the timestamp at which the order entered its current status.
    ///
    /// This is the reference point for the sweep's time-in-status checks.
    pub fn entered_status_at(&self) -> DateTime<Utc> {
        match self.status {
            OrderStatus::Pending => self.created_at,
            OrderStatus::Confirmed => self.confirmed_at.unwrap_or(self.created_at),
            OrderStatus::Preparing => self.preparing_at.unwrap_or(self.created_at),
            OrderStatus::Shipping => self.shipping_at.unwrap_or(self.created_at),
            OrderStatus::Delivered => self.delivered_at.unwrap_or(self.created_at),
            OrderStatus::Cancelled => self.cancelled_at.unwrap_or(self.created_at),
        }
    }

    /// Returns true if the earn credit for this order has been applied.
    ///
    /// Points are credited on the first transition out of `Pending`, so any
    /// order with a confirmation timestamp (or one the review shortcut sent
    /// straight to shipping) has earned its points.
    pub fn points_credited(&self) -> bool {
        self.confirmed_at.is_some() || self.shipping_at.is_some()
    }
}

/// A fully priced order ready to be committed.
///
/// Produced by the checkout service after pricing and validation; consumed
/// by the store as the single atomic commit operation.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub order_no: String,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub voucher_code: Option<String>,
    pub voucher_discount: Money,
    pub points_used: i64,
    pub points_earned: i64,
    pub total: Money,
    pub shipping_address: String,
    pub shipping_phone: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Generates a unique human-readable order number.
pub fn generate_order_no(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        now.format("%Y%m%d"),
        suffix[..6].to_uppercase()
    )
}
