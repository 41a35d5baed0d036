//! Domain layer for the shop backend.
//!
//! This crate holds the pure, I/O-free core of the ordering system:
//! - Money value type and pricing calculator
//! - Order types and the status state machine
//! - Transition planning (which ledger/stock effects a status change applies)
//! - Voucher validation and discount computation
//! - Loyalty ledger types
//! - The domain error taxonomy

pub mod error;
pub mod loyalty;
pub mod money;
pub mod order;
pub mod pricing;
pub mod voucher;

pub use error::{DomainError, ErrorKind};
pub use loyalty::{LoyaltyKind, LoyaltyTransaction};
pub use money::Money;
pub use order::{
    CartLine, CupSize, IceLevel, Order, OrderDraft, OrderItem, OrderStatus, PaymentMethod,
    Product, ShippingMethod, SugarLevel, TransitionCause, TransitionPlan, TransitionRequest,
    generate_order_no, plan_transition,
};
pub use pricing::{Pricing, resolve_unit_price};
pub use voucher::{DiscountKind, Voucher, VoucherRejection, normalize_code};
