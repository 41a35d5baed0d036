//! Domain error taxonomy.

use common::{OrderId, ProductId};
use thiserror::Error;

use crate::order::OrderStatus;

/// Coarse classification of a domain error, used by outer layers to pick
/// an HTTP status or a retry policy without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any side effect.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A resource-level conflict: stock, points, or voucher capacity.
    Conflict,
    /// The order is not in a state that allows the operation.
    State,
}

/// Errors produced by domain rules.
///
/// Every variant carries enough context for a user-facing message
/// (product name and available stock, current balance) without leaking
/// internal identifiers beyond the ones the caller already holds.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Checkout was attempted with an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist (or is not visible to the caller).
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Stock cannot cover the requested quantity.
    #[error("insufficient stock for {product_name}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        available: i64,
        requested: u32,
    },

    /// The user asked to redeem more points than they hold.
    #[error("insufficient loyalty points: balance is {balance}, requested {requested}")]
    InsufficientPoints { balance: i64, requested: i64 },

    /// The voucher's usage cap was exhausted by a concurrent order.
    #[error("voucher {code} has reached its usage limit")]
    VoucherExhausted { code: String },

    /// The requested status change is not a legal edge of the state machine.
    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A customer cancellation arrived after the allowed window.
    #[error(
        "orders can only be cancelled within {window_minutes} minutes of creation \
         ({elapsed_minutes} minutes have passed)"
    )]
    CancelWindowElapsed {
        window_minutes: i64,
        elapsed_minutes: i64,
    },

    /// Malformed input caught before any side effect.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EmptyCart | DomainError::Validation { .. } => ErrorKind::Validation,
            DomainError::ProductNotFound(_) | DomainError::OrderNotFound(_) => ErrorKind::NotFound,
            DomainError::InsufficientStock { .. }
            | DomainError::InsufficientPoints { .. }
            | DomainError::VoucherExhausted { .. } => ErrorKind::Conflict,
            DomainError::InvalidTransition { .. } | DomainError::CancelWindowElapsed { .. } => {
                ErrorKind::State
            }
        }
    }
}
