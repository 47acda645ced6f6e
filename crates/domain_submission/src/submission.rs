//! Submission record aggregate
//!
//! One record per outbound unit of work. The request envelope is written at
//! the draft -> pending transition and never mutated afterwards; only the
//! response side and derived status fields change, preserving an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{BatchId, ErrorRecord, Money, SubmissionId};
use domain_envelope::{AdjudicationDecision, ClaimResource, EligibilityRequest};

use crate::error::SubmissionError;

/// Submission lifecycle status
///
/// `Queued` is non-terminal: the exchange accepted the envelope but
/// adjudication arrives later via poll or status-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Created locally, nothing transmitted
    Draft,
    /// Send attempted; request envelope recorded
    Pending,
    /// Accepted with adjudication deferred
    Queued,
    /// Terminal adjudication recorded
    Complete,
    /// Terminal failure recorded
    Error,
}

impl SubmissionStatus {
    /// Returns true when no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Complete | SubmissionStatus::Error)
    }
}

/// Message kind of a submission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Eligibility,
    PriorAuth,
    Claim,
    Cancel,
    Batch,
}

/// The domain payload a record was created from
///
/// Stored alongside the record so batch submission can rebuild member claims
/// without re-parsing audit envelopes. The tag key avoids the claim
/// resource's own `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payload_kind", rename_all = "snake_case")]
pub enum RecordPayload {
    Eligibility(EligibilityRequest),
    PriorAuth(ClaimResource),
    Claim(ClaimResource),
    Cancel { target: Uuid, reason: String },
    Batch { batch_ref: Uuid },
}

impl RecordPayload {
    /// Returns the submission kind for this payload
    pub fn kind(&self) -> SubmissionKind {
        match self {
            RecordPayload::Eligibility(_) => SubmissionKind::Eligibility,
            RecordPayload::PriorAuth(_) => SubmissionKind::PriorAuth,
            RecordPayload::Claim(_) => SubmissionKind::Claim,
            RecordPayload::Cancel { .. } => SubmissionKind::Cancel,
            RecordPayload::Batch { .. } => SubmissionKind::Batch,
        }
    }

    /// Returns the focal resource identifier embedded in request payloads
    pub fn focal_id(&self) -> Uuid {
        match self {
            RecordPayload::Eligibility(request) => request.identifier,
            RecordPayload::PriorAuth(claim) => claim.identifier,
            RecordPayload::Claim(claim) => claim.identifier,
            RecordPayload::Cancel { target, .. } => *target,
            RecordPayload::Batch { batch_ref } => *batch_ref,
        }
    }

    /// Returns the insurer reference for receiver resolution, when present
    pub fn insurer_ref(&self) -> Option<&str> {
        match self {
            RecordPayload::Eligibility(request) => Some(&request.insurer_ref),
            RecordPayload::PriorAuth(claim) => Some(&claim.insurer_ref),
            RecordPayload::Claim(claim) => Some(&claim.insurer_ref),
            RecordPayload::Cancel { .. } | RecordPayload::Batch { .. } => None,
        }
    }
}

/// One outbound unit of work against the exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Local identifier
    pub id: SubmissionId,
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    /// Focal resource identifier; the correlation key for poll results
    pub focal_id: Uuid,
    /// Exchange-assigned identifier, null until acknowledged
    pub exchange_ref: Option<String>,
    /// Receiver identity this record was built for
    pub receiver: String,
    /// The payload this record was created from
    pub payload: RecordPayload,
    /// Raw request envelope; immutable once transmitted
    pub request_envelope: Option<serde_json::Value>,
    /// Raw response envelope from the latest outcome
    pub response_envelope: Option<serde_json::Value>,
    /// Terminal adjudication decision
    pub decision: Option<AdjudicationDecision>,
    pub approved_amount: Option<Money>,
    pub disposition: Option<String>,
    /// Errors reported by the exchange, in order; never silently dropped
    pub errors: Vec<ErrorRecord>,
    /// Active batch membership, claims only
    pub batch_id: Option<BatchId>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Creates a new draft record
    pub fn new(payload: RecordPayload, receiver: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SubmissionId::new_v7(),
            kind: payload.kind(),
            status: SubmissionStatus::Draft,
            focal_id: payload.focal_id(),
            exchange_ref: None,
            receiver: receiver.into(),
            payload,
            request_envelope: None,
            response_envelope: None,
            decision: None,
            approved_amount: None,
            disposition: None,
            errors: Vec::new(),
            batch_id: None,
            created_at: now,
            submitted_at: None,
            updated_at: now,
        }
    }

    /// Records the send attempt: draft -> pending with the request envelope
    ///
    /// Fails if the record already carries a transmitted envelope.
    pub fn mark_pending(&mut self, request_envelope: serde_json::Value) -> Result<(), SubmissionError> {
        if self.request_envelope.is_some() {
            return Err(SubmissionError::RequestImmutable);
        }
        self.transition(SubmissionStatus::Pending)?;
        self.request_envelope = Some(request_envelope);
        self.submitted_at = Some(Utc::now());
        Ok(())
    }

    /// Records a deferred acceptance: pending -> queued
    pub fn mark_queued(
        &mut self,
        response_envelope: serde_json::Value,
        exchange_ref: Option<String>,
    ) -> Result<(), SubmissionError> {
        self.transition(SubmissionStatus::Queued)?;
        self.response_envelope = Some(response_envelope);
        if exchange_ref.is_some() {
            self.exchange_ref = exchange_ref;
        }
        Ok(())
    }

    /// Records a terminal adjudication: pending/queued -> complete
    pub fn mark_complete(
        &mut self,
        response_envelope: serde_json::Value,
        decision: Option<AdjudicationDecision>,
        approved_amount: Option<Money>,
        disposition: Option<String>,
    ) -> Result<(), SubmissionError> {
        self.transition(SubmissionStatus::Complete)?;
        self.response_envelope = Some(response_envelope);
        self.decision = decision;
        self.approved_amount = approved_amount;
        self.disposition = disposition;
        Ok(())
    }

    /// Records a terminal failure: pending/queued -> error
    ///
    /// The full ordered error list is attached; transport-only failures pass
    /// an empty list and a disposition describing the last transport error.
    pub fn mark_error(
        &mut self,
        response_envelope: Option<serde_json::Value>,
        errors: Vec<ErrorRecord>,
        disposition: Option<String>,
    ) -> Result<(), SubmissionError> {
        self.transition(SubmissionStatus::Error)?;
        if response_envelope.is_some() {
            self.response_envelope = response_envelope;
        }
        self.errors = errors;
        self.disposition = disposition;
        Ok(())
    }

    /// Attaches batch membership
    pub fn attach_to_batch(&mut self, batch_id: BatchId) {
        self.batch_id = Some(batch_id);
        self.updated_at = Utc::now();
    }

    fn transition(&mut self, target: SubmissionStatus) -> Result<(), SubmissionError> {
        if !self.can_transition_to(target) {
            return Err(SubmissionError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", target),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Checks if transition is valid
    fn can_transition_to(&self, target: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self.status, target),
            (Draft, Pending)
                | (Pending, Queued)
                | (Pending, Complete)
                | (Pending, Error)
                | (Queued, Complete)
                | (Queued, Error)
        )
    }
}
