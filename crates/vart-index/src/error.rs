//! Error types for index operations.

use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A partition or sort key is empty or otherwise unusable.
    #[error("invalid index key: {reason}")]
    InvalidKey { reason: String },

    /// An attribute held a value of the wrong type.
    #[error("attribute {name} has unexpected type: expected {expected}")]
    AttributeType { name: String, expected: &'static str },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing table reported a failure.
    #[error("index backend error: {0}")]
    Backend(String),
}

/// Convenience type alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
