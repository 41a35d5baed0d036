//! Persistence layer for the ordering engine.
//!
//! The [`Store`] trait exposes the system's atomic units: the order commit,
//! the lifecycle transition, and the supporting lookups. Two
//! implementations are provided:
//! - [`PostgresStore`] — sqlx-backed, with row locks and conditional
//!   updates guarding stock, balances, and voucher counters
//! - [`InMemoryStore`] — a lock-protected map store with the same
//!   all-or-nothing semantics, for tests

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;
