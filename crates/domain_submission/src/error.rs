//! Submission domain errors

use thiserror::Error;

use core_kernel::ExchangeError;

/// Errors raised by submission, batch, and interaction invariants
///
/// These are all local guard failures: they abort before any transport
/// attempt.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Request envelope is immutable once transmitted")]
    RequestImmutable,

    #[error("No receiver identity resolved for insurer {0}")]
    MissingReceiver(String),

    #[error("Submission {0} is not cancellable in status {1}")]
    NotCancellable(String, String),

    #[error("Batch size {0} outside allowed range {1}..={2}")]
    BatchSizeOutOfRange(usize, usize, usize),

    #[error("Batch members must share one receiver identity")]
    MixedReceivers,

    #[error("Claim {0} is attached to active batch {1}")]
    AlreadyBatched(String, String),

    #[error("Only draft claim submissions can join a batch: {0} is {1}")]
    NotBatchable(String, String),

    #[error("Batch {0} is not in a submittable state: {1}")]
    BatchNotSubmittable(String, String),
}

impl From<SubmissionError> for ExchangeError {
    fn from(err: SubmissionError) -> Self {
        ExchangeError::Guard(err.to_string())
    }
}
