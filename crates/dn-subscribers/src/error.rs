//! Error types for the subscriber layer.

use thiserror::Error;

/// Errors raised by subscriber configuration and read APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriberError {
    /// Channel buffer outside the accepted range.
    #[error("Invalid buffer size {size}: expected {min}..={max}")]
    InvalidBufferSize { size: usize, min: usize, max: usize },

    /// Unsubscribe of an unknown market depth listener.
    #[error("subscriber to market depth updates does not exist with id: {0}")]
    UnknownDepthListener(u64),
}

/// Result type for subscriber operations.
pub type SubscriberResult<T> = Result<T, SubscriberError>;
