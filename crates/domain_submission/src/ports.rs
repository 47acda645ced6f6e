//! Ports consumed by the exchange engine
//!
//! The engine is a stateless instance constructed with explicit transport,
//! storage, and identity dependencies, so tests substitute fakes without any
//! global state.

use async_trait::async_trait;
use uuid::Uuid;

use core_kernel::{BatchId, EnginePort, PortError, SubmissionId, TransportError};
use domain_envelope::Envelope;

use crate::batch::BatchRecord;
use crate::interaction::{InteractionKind, PendingInteraction};
use crate::submission::SubmissionRecord;

/// Per-call transport options
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// Batch submissions carry larger payloads and double the request timeout
    pub batch: bool,
}

impl SendOptions {
    /// Options for a single-resource envelope
    pub fn standard() -> Self {
        Self { batch: false }
    }

    /// Options for a multi-claim batch envelope
    pub fn batch() -> Self {
        Self { batch: true }
    }
}

/// Wire transport to the single exchange endpoint
///
/// Implementations apply bounded retry with backoff and classify outcomes by
/// transport status alone; payload semantics belong to the validator.
#[async_trait]
pub trait ExchangeTransport: EnginePort {
    async fn send(
        &self,
        envelope: &Envelope,
        options: SendOptions,
    ) -> Result<Envelope, TransportError>;
}

/// Durable store for submissions, batches, and pending interactions
///
/// Each update call persists the whole record atomically: a crash between
/// "sent" and "outcome recorded" leaves a well-defined pending/queued state
/// recoverable by a later poll. The store is the durable queue of
/// outstanding work; the engine keeps no in-memory queue.
#[async_trait]
pub trait SubmissionStore: EnginePort {
    async fn insert_submission(&self, record: &SubmissionRecord) -> Result<(), PortError>;
    async fn get_submission(&self, id: SubmissionId) -> Result<SubmissionRecord, PortError>;
    async fn find_submission_by_focal(
        &self,
        focal_id: Uuid,
    ) -> Result<Option<SubmissionRecord>, PortError>;
    async fn update_submission(&self, record: &SubmissionRecord) -> Result<(), PortError>;

    async fn insert_batch(&self, batch: &BatchRecord) -> Result<(), PortError>;
    async fn get_batch(&self, id: BatchId) -> Result<BatchRecord, PortError>;
    async fn update_batch(&self, batch: &BatchRecord) -> Result<(), PortError>;

    async fn insert_interaction(&self, interaction: &PendingInteraction) -> Result<(), PortError>;
    async fn find_interaction(
        &self,
        kind: InteractionKind,
        correlation_id: Uuid,
    ) -> Result<Option<PendingInteraction>, PortError>;
    async fn update_interaction(&self, interaction: &PendingInteraction) -> Result<(), PortError>;
    async fn open_interactions(&self) -> Result<Vec<PendingInteraction>, PortError>;
}

/// Resolved sender/receiver identity supplier
///
/// Patient, provider, insurer, and coverage references arrive on payloads
/// already resolved; this port only answers which exchange identities to put
/// on the header.
pub trait ParticipantDirectory: EnginePort {
    /// The submitter's exchange identity
    fn sender(&self) -> String;

    /// Resolves the receiver identity for an insurer reference
    ///
    /// Returns `None` when the insurer is not onboarded, which the engine
    /// turns into a guard failure before any transport call.
    fn receiver(&self, insurer_ref: &str) -> Option<String>;
}
