//! Error types for the network parameters store.

use thiserror::Error;

/// Errors raised by network parameter reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetParamsError {
    /// No parameter is registered under this key.
    #[error("unknown network parameter: {0}")]
    UnknownKey(String),

    /// The value parsed but broke one or more rules.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The parameter cannot be changed at runtime.
    #[error("network parameter {0} is not mutable")]
    Immutable(String),

    /// The value is not in the parameter's text format.
    #[error("unable to parse value for {key}: {reason}")]
    Parse { key: String, reason: String },

    /// Typed read of a parameter of another kind.
    #[error("network parameter {key} is not a {expected} value")]
    WrongKind { key: String, expected: &'static str },

    #[error("invalid genesis state: {0}")]
    Genesis(String),

    #[error("invalid checkpoint: {0}")]
    Checkpoint(String),
}

/// Result type for network parameter operations.
pub type NetParamsResult<T> = Result<T, NetParamsError>;
