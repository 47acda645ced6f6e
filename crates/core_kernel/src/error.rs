//! Engine error taxonomy
//!
//! Four failure families with distinct propagation rules:
//! - `Transport` - no usable response from the exchange; retried with
//!   backoff before surfacing
//! - `Structural` - the response arrived but is not a recognizable envelope;
//!   never retried
//! - `Business` - the exchange processed the request and rejected it; never
//!   retried
//! - `Guard` - a local precondition failed before any network call
//!
//! Business and structural failures carry the full ordered list of
//! [`ErrorRecord`]s extracted from the response, never a single collapsed
//! message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::PortError;

/// Severity of a reported issue, mirroring the exchange vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

impl ErrorSeverity {
    /// Returns true if this severity forces a business failure
    pub fn is_failure(&self) -> bool {
        matches!(self, ErrorSeverity::Fatal | ErrorSeverity::Error)
    }
}

/// Which validation layer produced an error record
///
/// Kept distinct so callers can alert differently on "the exchange rejected
/// the operation" versus "the response did not parse".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Exchange-reported operation failure
    BusinessRejection,
    /// Envelope shape or content failed structural validation
    StructuralDefect,
}

/// A normalized error extracted from a response payload
///
/// Attached to submission records as zero-or-more entries and surfaced to
/// callers in the order the exchange reported them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    /// Machine-readable issue code
    pub code: String,
    /// Human-readable diagnostic
    pub message: String,
    /// Optional field path locating the offending element
    pub expression: Option<String>,
}

impl ErrorRecord {
    /// Creates a business rejection record
    pub fn business(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::BusinessRejection,
            severity: ErrorSeverity::Error,
            code: code.into(),
            message: message.into(),
            expression: None,
        }
    }

    /// Creates a structural defect record
    pub fn structural(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::StructuralDefect,
            severity: ErrorSeverity::Fatal,
            code: code.into(),
            message: message.into(),
            expression: None,
        }
    }

    /// Sets the locating expression
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Sets the severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Transport-level failure, classified independently of payload semantics
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange answered with a non-success transport status
    #[error("HTTP {status} from exchange: {body}")]
    Http { status: u16, body: String },

    /// No response arrived: connection failure or timeout
    #[error("No response from exchange: {0}")]
    NoResponse(String),

    /// The request could not be constructed or serialized
    #[error("Request error: {0}")]
    Request(String),

    /// All retry attempts exhausted; carries the last attempt's failure
    #[error("Exhausted {attempts} attempts, last error: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Returns true if another attempt may succeed
    ///
    /// 4xx statuses mean the request itself was rejected and will be
    /// rejected again; 5xx and missing responses are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http { status, .. } => *status >= 500,
            TransportError::NoResponse(_) => true,
            TransportError::Request(_) => false,
            TransportError::Exhausted { .. } => false,
        }
    }
}

/// Top-level engine error
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Transport failure after retry exhaustion
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Response envelope failed structural validation
    #[error("Structural validation failed: {message}")]
    Structural {
        message: String,
        errors: Vec<ErrorRecord>,
    },

    /// The exchange reported a business-level operation failure
    #[error("Exchange rejected the operation with {} error(s)", errors.len())]
    Business { errors: Vec<ErrorRecord> },

    /// A local precondition failed before any transport attempt
    #[error("Guard failed: {0}")]
    Guard(String),

    /// The backing store failed
    #[error("Store failure: {0}")]
    Store(#[from] PortError),
}

impl ExchangeError {
    /// Creates a structural error with a single record
    pub fn structural(message: impl Into<String>) -> Self {
        let message = message.into();
        let record = ErrorRecord::structural("invalid-envelope", message.clone());
        ExchangeError::Structural {
            message,
            errors: vec![record],
        }
    }

    /// Creates a guard error
    pub fn guard(message: impl Into<String>) -> Self {
        ExchangeError::Guard(message.into())
    }

    /// Returns the error records attached to this failure, if any
    pub fn records(&self) -> &[ErrorRecord] {
        match self {
            ExchangeError::Structural { errors, .. } => errors,
            ExchangeError::Business { errors } => errors,
            _ => &[],
        }
    }

    /// Returns true if this is a local guard failure
    pub fn is_guard(&self) -> bool {
        matches!(self, ExchangeError::Guard(_))
    }
}
