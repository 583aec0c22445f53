//! Unified error types for the orders pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the orders pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage engine error, wrapped with context at the store boundary.
    #[error("store error: {0}")]
    Store(String),

    /// A staged record that cannot be normalized (NULL fields, bad types).
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// An order status string outside the closed set.
    #[error("invalid order status: {0}")]
    InvalidStatus(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
