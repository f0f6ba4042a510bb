//! # Error Types
//!
//! Defines error types shared by the read-side stores.

use thiserror::Error;

/// Errors returned by a read-side store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record rejected by the store (constraint violation, bad key, ...).
    #[error("Invalid record: {0}")]
    Invalid(String),

    /// The store is shut down and accepts no more writes.
    #[error("Store closed")]
    Closed,

    /// Backend operation failed.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::NotFound("node-1".into()).to_string(),
            "Not found: node-1"
        );
        assert_eq!(StoreError::Closed.to_string(), "Store closed");
    }
}
