//! Envelope codec errors

use thiserror::Error;

/// Errors that can occur while encoding or decoding envelopes
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Envelope is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
