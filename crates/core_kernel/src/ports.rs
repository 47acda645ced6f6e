//! Ports and Adapters Infrastructure
//!
//! The engine is constructed with explicit collaborator dependencies rather
//! than module-level singletons: a storage port, a transport port, and a
//! participant directory. Each domain defines its own port trait extending
//! the marker here; adapters live in the `infra_*` crates.

use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// A unified error type that all port implementations map into, keeping
/// store and directory failures distinguishable from protocol failures.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Stored data could not be serialized or deserialized
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        PortError::Serialization {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all engine ports
///
/// Port traits extend this marker so implementations are thread-safe and
/// usable behind an `Arc` in async contexts.
pub trait EnginePort: Send + Sync + 'static {}
