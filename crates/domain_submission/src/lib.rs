//! Submission Lifecycle Domain
//!
//! This crate implements the claim lifecycle against the exchange, from
//! draft through transmission to terminal adjudication.
//!
//! # Submission Lifecycle
//!
//! ```text
//! Draft -> Pending -> {Queued, Complete, Error}
//!             Queued -> {Complete, Error}   (poll / status-check driven)
//! ```

pub mod submission;
pub mod batch;
pub mod interaction;
pub mod ports;
pub mod services;
pub mod error;

pub use submission::{RecordPayload, SubmissionKind, SubmissionRecord, SubmissionStatus};
pub use batch::{
    aggregate_status, BatchCounts, BatchMember, BatchRecord, BatchStatus, MemberOutcome,
    MAX_BATCH_SIZE, MIN_BATCH_SIZE,
};
pub use interaction::{InteractionKind, InteractionStatus, PendingInteraction};
pub use ports::{ExchangeTransport, ParticipantDirectory, SendOptions, SubmissionStore};
pub use services::{ExchangeEngine, PollResult, SubmitPayload};
pub use error::SubmissionError;
