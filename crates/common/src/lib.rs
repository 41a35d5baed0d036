//! Shared identifier types used across the shop backend.

pub mod types;

pub use types::{OrderId, ProductId, UserId, VoucherId};
