//! Order types, the status state machine, and transition planning.

mod status;
mod transition;
mod types;

pub use status::{OrderStatus, TransitionCause};
pub use transition::{CANCEL_WINDOW, TransitionPlan, TransitionRequest, plan_transition};
pub use types::{
    CartLine, CupSize, IceLevel, Order, OrderDraft, OrderItem, PaymentMethod, Product,
    ShippingMethod, SugarLevel, generate_order_no,
};
