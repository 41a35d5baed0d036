//! Ordering engine error types.

use domain::{DomainError, ErrorKind};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout service and the lifecycle engine.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderingError {
    /// Returns the domain classification when a domain rule caused the
    /// failure, unwrapping store-carried domain errors.
    pub fn domain_kind(&self) -> Option<ErrorKind> {
        match self {
            OrderingError::Domain(e) => Some(e.kind()),
            OrderingError::Store(e) => e.domain_kind(),
        }
    }

    /// Returns true if retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderingError::Store(e) if e.is_transient())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, OrderingError>;
