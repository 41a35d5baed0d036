//! Store error types.

use domain::{DomainError, ErrorKind};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule was violated inside a store operation (insufficient
    /// stock or points, illegal transition, voucher cap).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Lock contention persisted across the bounded retries. Callers may
    /// retry the whole operation.
    #[error("operation aborted after {attempts} attempts due to lock contention")]
    Transient { attempts: u32 },

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt stored value in {table}.{column}: {value}")]
    CorruptValue {
        table: &'static str,
        column: &'static str,
        value: String,
    },
}

impl StoreError {
    /// Returns the domain classification when a domain rule caused the
    /// failure; storage-level failures have no domain kind.
    pub fn domain_kind(&self) -> Option<ErrorKind> {
        match self {
            StoreError::Domain(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Returns true if retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
