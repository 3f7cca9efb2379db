// Error types for store implementations

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors returned by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (duplicate name, email, ...)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced row (user, agent) does not exist
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }

    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        StoreError::InvalidReference(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        StoreError::Database(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
