//! Core Kernel - Foundational types for the claims exchange engine
//!
//! This crate provides the fundamental building blocks used across the
//! protocol engine crates:
//! - Money types with precise decimal arithmetic for adjudicated amounts
//! - Strongly-typed identifiers for submissions, batches, and interactions
//! - The engine error taxonomy and normalized error records

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{SubmissionId, BatchId, InteractionId, MessageId};
pub use error::{
    ExchangeError, ErrorRecord, ErrorKind, ErrorSeverity, TransportError,
};
pub use ports::{EnginePort, PortError};
