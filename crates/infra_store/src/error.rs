//! Store error types

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Record not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Stored document could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl StoreError {
    /// Creates a not found error for an entity type and identifier
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error.to_string())
    }
}

impl From<StoreError> for PortError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ConnectionFailed(message) => PortError::Connection {
                message,
                source: None,
            },
            StoreError::NotFound(message) => PortError::NotFound {
                entity_type: "record".to_string(),
                id: message,
            },
            StoreError::DuplicateEntry(message) => PortError::Conflict { message },
            StoreError::Serialization(message) => PortError::Serialization { message },
            StoreError::PoolExhausted => PortError::Connection {
                message: "connection pool exhausted".to_string(),
                source: None,
            },
            StoreError::Sql(error) => PortError::Internal {
                message: "sql failure".to_string(),
                source: Some(Box::new(error)),
            },
        }
    }
}
