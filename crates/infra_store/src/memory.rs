//! In-memory store
//!
//! One mutex over the whole state, so every update lands atomically: a
//! reader never observes a record mid-write. Default store for tests and
//! embedded callers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use core_kernel::{BatchId, EnginePort, InteractionId, PortError, SubmissionId};
use domain_submission::{
    BatchRecord, InteractionKind, PendingInteraction, SubmissionKind, SubmissionRecord,
    SubmissionStore,
};

#[derive(Default)]
struct State {
    submissions: HashMap<SubmissionId, SubmissionRecord>,
    batches: HashMap<BatchId, BatchRecord>,
    interactions: HashMap<InteractionId, PendingInteraction>,
}

/// Mutex-guarded in-memory implementation of the store port
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored interactions, open or closed
    pub async fn interaction_count(&self) -> usize {
        self.state.lock().await.interactions.len()
    }
}

impl EnginePort for InMemoryStore {}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn insert_submission(&self, record: &SubmissionRecord) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if state.submissions.contains_key(&record.id) {
            return Err(PortError::conflict(format!(
                "submission {} already exists",
                record.id
            )));
        }
        state.submissions.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<SubmissionRecord, PortError> {
        self.state
            .lock()
            .await
            .submissions
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Submission", id))
    }

    async fn find_submission_by_focal(
        &self,
        focal_id: Uuid,
    ) -> Result<Option<SubmissionRecord>, PortError> {
        // Cancel records share the focal identifier of the submission they
        // target; correlation must resolve to the adjudicable record.
        Ok(self
            .state
            .lock()
            .await
            .submissions
            .values()
            .find(|record| record.focal_id == focal_id && record.kind != SubmissionKind::Cancel)
            .cloned())
    }

    async fn update_submission(&self, record: &SubmissionRecord) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if !state.submissions.contains_key(&record.id) {
            return Err(PortError::not_found("Submission", record.id));
        }
        state.submissions.insert(record.id, record.clone());
        Ok(())
    }

    async fn insert_batch(&self, batch: &BatchRecord) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if state.batches.contains_key(&batch.id) {
            return Err(PortError::conflict(format!("batch {} already exists", batch.id)));
        }
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn get_batch(&self, id: BatchId) -> Result<BatchRecord, PortError> {
        self.state
            .lock()
            .await
            .batches
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Batch", id))
    }

    async fn update_batch(&self, batch: &BatchRecord) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if !state.batches.contains_key(&batch.id) {
            return Err(PortError::not_found("Batch", batch.id));
        }
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn insert_interaction(&self, interaction: &PendingInteraction) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if state.interactions.contains_key(&interaction.id) {
            return Err(PortError::conflict(format!(
                "interaction {} already exists",
                interaction.id
            )));
        }
        state.interactions.insert(interaction.id, interaction.clone());
        Ok(())
    }

    async fn find_interaction(
        &self,
        kind: InteractionKind,
        correlation_id: Uuid,
    ) -> Result<Option<PendingInteraction>, PortError> {
        Ok(self
            .state
            .lock()
            .await
            .interactions
            .values()
            .find(|i| i.kind == kind && i.correlation_id == correlation_id)
            .cloned())
    }

    async fn update_interaction(&self, interaction: &PendingInteraction) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        if !state.interactions.contains_key(&interaction.id) {
            return Err(PortError::not_found("Interaction", interaction.id));
        }
        state.interactions.insert(interaction.id, interaction.clone());
        Ok(())
    }

    async fn open_interactions(&self) -> Result<Vec<PendingInteraction>, PortError> {
        Ok(self
            .state
            .lock()
            .await
            .interactions
            .values()
            .filter(|i| i.is_open())
            .cloned()
            .collect())
    }
}
