//! Batch record and correlator
//!
//! A batch groups 2..=200 claim submissions sharing one receiver identity.
//! Each member holds a 1-based sequence number unique within the batch;
//! polled results are re-associated to members by that sequence, and the
//! batch aggregate status is a pure function of member outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{BatchId, SubmissionId};
use domain_envelope::AdjudicationDecision;

use crate::error::SubmissionError;
use crate::submission::{SubmissionRecord, SubmissionStatus};

/// Allowed batch size bounds
pub const MIN_BATCH_SIZE: usize = 2;
pub const MAX_BATCH_SIZE: usize = 200;

/// Batch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Created; members attached; nothing transmitted
    Draft,
    /// Submitted; at least one member still awaiting adjudication
    Queued,
    /// Every member approved
    Complete,
    /// Every member rejected
    Rejected,
    /// Mixed terminal outcomes
    Partial,
    /// The batch submission itself failed; members are reassignable
    Failed,
}

impl BatchStatus {
    /// Returns true when members may be reassigned to another batch
    pub fn allows_reassignment(&self) -> bool {
        matches!(self, BatchStatus::Draft | BatchStatus::Failed)
    }
}

/// Per-member outcome as seen by the aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOutcome {
    Approved,
    Rejected,
    Pending,
}

impl MemberOutcome {
    /// Derives the outcome of one member record
    pub fn of(record: &SubmissionRecord) -> Self {
        match (record.status, record.decision) {
            (SubmissionStatus::Complete, Some(AdjudicationDecision::Approved))
            | (SubmissionStatus::Complete, Some(AdjudicationDecision::PartiallyApproved)) => {
                MemberOutcome::Approved
            }
            (SubmissionStatus::Complete, _) => MemberOutcome::Rejected,
            (SubmissionStatus::Error, _) => MemberOutcome::Rejected,
            _ => MemberOutcome::Pending,
        }
    }
}

/// One member of a batch: the claim submission plus its sequence number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMember {
    pub submission_id: SubmissionId,
    /// Focal claim identifier
    pub claim_id: Uuid,
    /// 1-based, unique within the batch
    pub sequence: u32,
}

/// Aggregate counts recomputed after every poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub approved: u32,
    pub rejected: u32,
    pub pending: u32,
}

/// A group of claim submissions transmitted as one envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: BatchId,
    /// Shared receiver identity of every member
    pub receiver: String,
    pub status: BatchStatus,
    /// Ordered claim -> sequence assignments
    pub members: Vec<BatchMember>,
    pub counts: BatchCounts,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchRecord {
    /// Creates a draft batch from ordered members
    ///
    /// Sequence numbers are assigned 1-based in the given order. Size bounds
    /// are enforced here; receiver and membership guards are enforced by the
    /// engine, which has the member records in hand.
    pub fn create(
        receiver: impl Into<String>,
        members: Vec<(SubmissionId, Uuid)>,
    ) -> Result<Self, SubmissionError> {
        if members.len() < MIN_BATCH_SIZE || members.len() > MAX_BATCH_SIZE {
            return Err(SubmissionError::BatchSizeOutOfRange(
                members.len(),
                MIN_BATCH_SIZE,
                MAX_BATCH_SIZE,
            ));
        }
        let now = Utc::now();
        let count = members.len() as u32;
        Ok(Self {
            id: BatchId::new_v7(),
            receiver: receiver.into(),
            status: BatchStatus::Draft,
            members: members
                .into_iter()
                .zip(1u32..)
                .map(|((submission_id, claim_id), sequence)| BatchMember {
                    submission_id,
                    claim_id,
                    sequence,
                })
                .collect(),
            counts: BatchCounts {
                approved: 0,
                rejected: 0,
                pending: count,
            },
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the member holding the given sequence number
    pub fn member_by_sequence(&self, sequence: u32) -> Option<&BatchMember> {
        self.members.iter().find(|m| m.sequence == sequence)
    }

    /// Returns the member for the given focal claim identifier
    pub fn member_by_claim(&self, claim_id: Uuid) -> Option<&BatchMember> {
        self.members.iter().find(|m| m.claim_id == claim_id)
    }

    /// Returns true when no member is still awaiting adjudication
    ///
    /// A `partial` batch with outstanding members stays pollable; it is
    /// settled only once every member reached a terminal state.
    pub fn is_settled(&self) -> bool {
        match self.status {
            BatchStatus::Complete | BatchStatus::Rejected | BatchStatus::Failed => true,
            BatchStatus::Partial => self.counts.pending == 0,
            BatchStatus::Draft | BatchStatus::Queued => false,
        }
    }

    /// Marks the batch as transmitted and awaiting adjudication
    pub fn mark_queued(&mut self) -> Result<(), SubmissionError> {
        if self.status != BatchStatus::Draft {
            return Err(SubmissionError::BatchNotSubmittable(
                self.id.to_string(),
                format!("{:?}", self.status),
            ));
        }
        self.status = BatchStatus::Queued;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the batch submission itself as failed; members become
    /// reassignable
    pub fn mark_failed(&mut self) {
        self.status = BatchStatus::Failed;
        self.updated_at = Utc::now();
    }

    /// Recomputes the aggregate status and counts from member records
    ///
    /// Pure with respect to the members passed in; records are matched by
    /// submission id and unmatched members count as pending.
    pub fn recompute(&mut self, member_records: &[SubmissionRecord]) {
        let outcomes: Vec<MemberOutcome> = self
            .members
            .iter()
            .map(|member| {
                member_records
                    .iter()
                    .find(|r| r.id == member.submission_id)
                    .map(MemberOutcome::of)
                    .unwrap_or(MemberOutcome::Pending)
            })
            .collect();
        self.counts = BatchCounts {
            approved: outcomes.iter().filter(|o| **o == MemberOutcome::Approved).count() as u32,
            rejected: outcomes.iter().filter(|o| **o == MemberOutcome::Rejected).count() as u32,
            pending: outcomes.iter().filter(|o| **o == MemberOutcome::Pending).count() as u32,
        };
        if self.status != BatchStatus::Draft && self.status != BatchStatus::Failed {
            self.status = aggregate_status(&outcomes);
        }
        self.updated_at = Utc::now();
    }
}

/// Folds member outcomes into the batch aggregate status
///
/// No adjudications yet => queued; all approved => complete; all rejected
/// => rejected; everything else (mixed terminal outcomes, or terminal
/// results alongside outstanding members) => partial.
pub fn aggregate_status(outcomes: &[MemberOutcome]) -> BatchStatus {
    let terminal = outcomes.iter().filter(|o| **o != MemberOutcome::Pending).count();
    if terminal == 0 {
        return BatchStatus::Queued;
    }
    let approved = outcomes.iter().filter(|o| **o == MemberOutcome::Approved).count();
    let rejected = outcomes.iter().filter(|o| **o == MemberOutcome::Rejected).count();
    if approved == outcomes.len() {
        BatchStatus::Complete
    } else if rejected == outcomes.len() {
        BatchStatus::Rejected
    } else {
        BatchStatus::Partial
    }
}
