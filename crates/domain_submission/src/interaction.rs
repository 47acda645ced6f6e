//! Pending interactions
//!
//! Every unit of deferred, caller-pollable work gets one record: a queued
//! submission awaiting adjudication, an exchange-issued information request
//! awaiting a reply, or an outbound communication awaiting acknowledgment.
//! Created on send or on poll-discovery; closed when a matching response or
//! acknowledgment is correlated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InteractionId, SubmissionId};

/// What the interaction is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// A queued submission needing a status-check or poll
    QueuedSubmission,
    /// The exchange asked for more material; needs a solicited reply
    InformationRequest,
    /// An outbound communication awaiting acknowledgment
    UnacknowledgedCommunication,
}

/// Interaction lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    Open,
    Closed,
}

/// One item of deferred work awaiting asynchronous resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInteraction {
    pub id: InteractionId,
    pub kind: InteractionKind,
    pub status: InteractionStatus,
    /// Correlation key: the focal identifier for queued submissions, the
    /// exchange-issued request identifier for information requests, and the
    /// local communication identifier for unacknowledged communications
    pub correlation_id: Uuid,
    /// Originating submission, when known
    pub submission_id: Option<SubmissionId>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl PendingInteraction {
    fn new(
        kind: InteractionKind,
        correlation_id: Uuid,
        submission_id: Option<SubmissionId>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: InteractionId::new_v7(),
            kind,
            status: InteractionStatus::Open,
            correlation_id,
            submission_id,
            reason,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    /// Opens a queued-submission interaction keyed by the focal identifier
    pub fn queued_submission(focal_id: Uuid, submission_id: SubmissionId) -> Self {
        Self::new(
            InteractionKind::QueuedSubmission,
            focal_id,
            Some(submission_id),
            None,
        )
    }

    /// Opens an information-request interaction keyed by the exchange-issued
    /// request identifier
    pub fn information_request(
        request_id: Uuid,
        submission_id: Option<SubmissionId>,
        reason: Option<String>,
    ) -> Self {
        Self::new(
            InteractionKind::InformationRequest,
            request_id,
            submission_id,
            reason,
        )
    }

    /// Opens an unacknowledged-communication interaction keyed by the local
    /// communication identifier
    pub fn unacknowledged_communication(
        communication_id: Uuid,
        submission_id: Option<SubmissionId>,
    ) -> Self {
        Self::new(
            InteractionKind::UnacknowledgedCommunication,
            communication_id,
            submission_id,
            None,
        )
    }

    /// Returns true while the interaction awaits resolution
    pub fn is_open(&self) -> bool {
        self.status == InteractionStatus::Open
    }

    /// Closes the interaction; idempotent
    pub fn close(&mut self) {
        if self.status == InteractionStatus::Closed {
            return;
        }
        self.status = InteractionStatus::Closed;
        self.closed_at = Some(Utc::now());
    }
}
