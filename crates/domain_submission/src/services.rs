//! Exchange engine orchestration
//!
//! Drives the submission state machine over the transport and store ports:
//! build envelope, send with bounded retry, classify business outcome, and
//! persist the transition in one store update. Deferred outcomes are pulled
//! back in through the poll and status-check paths and correlated to their
//! originating records.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use core_kernel::{BatchId, ErrorRecord, ExchangeError, SubmissionId};
use domain_envelope::{
    validate_response, ClaimOutcome, ClaimResult, Envelope, EventKind, RequestBuilder, Resource,
    ResourceType, TaskStatus, ValidatedResponse,
};

use crate::batch::{BatchRecord, BatchStatus, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
use crate::error::SubmissionError;
use crate::interaction::{InteractionKind, PendingInteraction};
use crate::ports::{ExchangeTransport, ParticipantDirectory, SendOptions, SubmissionStore};
use crate::submission::{RecordPayload, SubmissionKind, SubmissionRecord, SubmissionStatus};

/// Payloads a caller may submit directly
///
/// Cancels and batches are driven through their dedicated operations, so
/// they are not constructible here.
#[derive(Debug, Clone)]
pub enum SubmitPayload {
    Eligibility(domain_envelope::EligibilityRequest),
    PriorAuth(domain_envelope::ClaimResource),
    Claim(domain_envelope::ClaimResource),
}

impl SubmitPayload {
    fn into_record_payload(self) -> RecordPayload {
        match self {
            SubmitPayload::Eligibility(request) => RecordPayload::Eligibility(request),
            SubmitPayload::PriorAuth(claim) => RecordPayload::PriorAuth(claim),
            SubmitPayload::Claim(claim) => RecordPayload::Claim(claim),
        }
    }
}

/// Result of one poll cycle
///
/// Buckets contain only the effects of this cycle: an identical re-poll with
/// no new exchange-side activity yields empty buckets.
#[derive(Debug, Default)]
pub struct PollResult {
    /// Submissions that reached a terminal state in this cycle
    pub adjudications: Vec<SubmissionRecord>,
    /// Information requests newly discovered in this cycle
    pub information_requests: Vec<PendingInteraction>,
    /// Communications newly acknowledged in this cycle
    pub acknowledgments: Vec<PendingInteraction>,
}

/// The messaging protocol engine
///
/// Stateless apart from the per-focus poll serialization map; all durable
/// state lives behind the store port.
pub struct ExchangeEngine<S, T, D> {
    store: Arc<S>,
    transport: Arc<T>,
    directory: Arc<D>,
    focus_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl<S, T, D> ExchangeEngine<S, T, D>
where
    S: SubmissionStore,
    T: ExchangeTransport,
    D: ParticipantDirectory,
{
    /// Creates an engine over explicit collaborator dependencies
    pub fn new(store: Arc<S>, transport: Arc<T>, directory: Arc<D>) -> Self {
        Self {
            store,
            transport,
            directory,
            focus_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a draft claim submission without sending it
    ///
    /// Draft claims are the raw material of batches; single claims go
    /// through [`ExchangeEngine::submit`] which sends immediately.
    pub async fn prepare_claim(
        &self,
        claim: domain_envelope::ClaimResource,
    ) -> Result<SubmissionRecord, ExchangeError> {
        let receiver = self.resolve_receiver(&claim.insurer_ref)?;
        let record = SubmissionRecord::new(RecordPayload::Claim(claim), receiver);
        self.store.insert_submission(&record).await?;
        Ok(record)
    }

    /// Builds, sends, and classifies one submission
    ///
    /// Remote failures (transport exhaustion, business rejection) are
    /// persisted as a terminal `error` state on the returned record; only
    /// local guard and store failures surface as `Err`.
    pub async fn submit(&self, payload: SubmitPayload) -> Result<SubmissionRecord, ExchangeError> {
        let payload = payload.into_record_payload();
        let insurer_ref = payload
            .insurer_ref()
            .ok_or_else(|| ExchangeError::guard("payload carries no insurer reference"))?
            .to_string();
        let receiver = self.resolve_receiver(&insurer_ref)?;

        let builder = RequestBuilder::new(self.directory.sender(), receiver.clone());
        let (envelope, event) = match &payload {
            RecordPayload::Eligibility(request) => {
                (builder.eligibility(request), EventKind::EligibilityRequest)
            }
            RecordPayload::PriorAuth(claim) => (builder.priorauth(claim), EventKind::PriorauthRequest),
            RecordPayload::Claim(claim) => (builder.claim(claim), EventKind::ClaimRequest),
            _ => return Err(ExchangeError::guard("payload kind is not directly submittable")),
        };

        let mut record = SubmissionRecord::new(payload, receiver);
        record.mark_pending(envelope.to_raw())?;
        self.store.insert_submission(&record).await?;
        info!(submission = %record.id, kind = ?record.kind, "submission pending");

        match self.transport.send(&envelope, SendOptions::standard()).await {
            Ok(response) => {
                self.apply_response(&mut record, event, &response).await?;
            }
            Err(err) => {
                warn!(submission = %record.id, error = %err, "transport failure");
                record.mark_error(None, vec![], Some(format!("transport: {err}")))?;
                self.store.update_submission(&record).await?;
            }
        }
        Ok(record)
    }

    /// Polls the exchange and correlates everything that comes back
    ///
    /// With a focus, results are narrowed to one submission or batch and the
    /// call is serialized against concurrent polls for the same focus. A
    /// poll whose own envelope fails validation surfaces the error records
    /// and touches no stored state.
    pub async fn poll(&self, focus: Option<Uuid>) -> Result<PollResult, ExchangeError> {
        let lock = self.focus_lock(focus).await;
        let _guard = lock.lock().await;

        let builder = self.poll_builder();
        let envelope = builder.poll(focus, None);
        let response = self.transport.send(&envelope, SendOptions::standard()).await?;
        let validated = validate_response(EventKind::PollRequest, &response);
        if !validated.success {
            warn!(?focus, "poll envelope failed validation");
            return Err(ExchangeError::Business {
                errors: validated.errors,
            });
        }

        let mut result = PollResult::default();
        let mut touched_batches: HashSet<BatchId> = HashSet::new();
        let raw = response.to_raw();

        for resource in response.resources_of(ResourceType::ClaimResult) {
            if let Resource::ClaimResult(claim_result) = resource {
                if let Some(record) = self
                    .correlate_claim_result(claim_result, &raw, None)
                    .await?
                {
                    if let Some(batch_id) = record.batch_id {
                        touched_batches.insert(batch_id);
                    }
                    result.adjudications.push(record);
                }
            }
        }

        for resource in response.resources_of(ResourceType::EligibilityResult) {
            if let Resource::EligibilityResult(eligibility) = resource {
                if let Some(record) = self.correlate_eligibility(eligibility, &raw).await? {
                    result.adjudications.push(record);
                }
            }
        }

        for resource in response.resources_of(ResourceType::CommunicationRequest) {
            if let Resource::CommunicationRequest(request) = resource {
                if let Some(interaction) = self.discover_information_request(request).await? {
                    result.information_requests.push(interaction);
                }
            }
        }

        for resource in response.resources_of(ResourceType::Communication) {
            if let Resource::Communication(communication) = resource {
                if !communication.is_acknowledgment() {
                    continue;
                }
                if let Some(interaction) = self.apply_acknowledgment(communication).await? {
                    result.acknowledgments.push(interaction);
                }
            }
        }

        for batch_id in touched_batches {
            self.refresh_batch(batch_id).await?;
        }

        info!(
            ?focus,
            adjudications = result.adjudications.len(),
            information_requests = result.information_requests.len(),
            acknowledgments = result.acknowledgments.len(),
            "poll cycle complete"
        );
        Ok(result)
    }

    /// Cancels a queued submission
    ///
    /// The cancel message gets its own audit record; on acceptance the
    /// original record completes with a cancelled disposition. Cancelling a
    /// record already in a terminal state is a guard failure and performs
    /// zero transport calls.
    pub async fn cancel(
        &self,
        submission_id: SubmissionId,
        reason: &str,
    ) -> Result<SubmissionRecord, ExchangeError> {
        let mut original = self.store.get_submission(submission_id).await?;
        if original.status != SubmissionStatus::Queued {
            return Err(SubmissionError::NotCancellable(
                original.id.to_string(),
                format!("{:?}", original.status),
            )
            .into());
        }

        let builder = RequestBuilder::new(self.directory.sender(), original.receiver.clone());
        let envelope = builder.cancel(original.focal_id, reason);
        let mut cancel_record = SubmissionRecord::new(
            RecordPayload::Cancel {
                target: original.focal_id,
                reason: reason.to_string(),
            },
            original.receiver.clone(),
        );
        cancel_record.mark_pending(envelope.to_raw())?;
        self.store.insert_submission(&cancel_record).await?;

        let response = match self.transport.send(&envelope, SendOptions::standard()).await {
            Ok(response) => response,
            Err(err) => {
                cancel_record.mark_error(None, vec![], Some(format!("transport: {err}")))?;
                self.store.update_submission(&cancel_record).await?;
                return Err(err.into());
            }
        };

        let validated = validate_response(EventKind::CancelRequest, &response);
        let raw = response.to_raw();
        if !validated.success || !self.task_completed(&validated) {
            cancel_record.mark_error(Some(raw), validated.errors.clone(), None)?;
            self.store.update_submission(&cancel_record).await?;
            return Err(ExchangeError::Business {
                errors: validated.errors,
            });
        }

        cancel_record.mark_complete(raw.clone(), None, None, Some("cancel accepted".to_string()))?;
        self.store.update_submission(&cancel_record).await?;

        original.mark_complete(raw, None, None, Some("cancelled".to_string()))?;
        self.store.update_submission(&original).await?;
        self.close_interaction(InteractionKind::QueuedSubmission, original.focal_id)
            .await?;
        info!(submission = %original.id, "submission cancelled");
        Ok(original)
    }

    /// Probes one queued submission for its current outcome
    ///
    /// A task-based alternative to broad polling: the response either
    /// carries the terminal result for the focal submission or confirms it
    /// is still queued.
    pub async fn status_check(
        &self,
        submission_id: SubmissionId,
    ) -> Result<SubmissionRecord, ExchangeError> {
        let record = self.store.get_submission(submission_id).await?;
        if record.status != SubmissionStatus::Queued {
            return Err(ExchangeError::guard(format!(
                "status-check requires a queued submission, {} is {:?}",
                record.id, record.status
            )));
        }

        let lock = self.focus_lock(Some(record.focal_id)).await;
        let _guard = lock.lock().await;
        // Reload under the lock so a concurrent poll's update is visible.
        let record = self.store.get_submission(submission_id).await?;
        if record.status != SubmissionStatus::Queued {
            return Ok(record);
        }

        let builder = RequestBuilder::new(self.directory.sender(), record.receiver.clone());
        let envelope = builder.status_check(record.focal_id);
        let response = self.transport.send(&envelope, SendOptions::standard()).await?;
        let validated = validate_response(EventKind::StatusCheck, &response);
        if !validated.success {
            return Err(ExchangeError::Business {
                errors: validated.errors,
            });
        }

        let raw = response.to_raw();
        if let Some(Resource::ClaimResult(claim_result)) =
            response.first_of(ResourceType::ClaimResult)
        {
            if let Some(updated) = self
                .correlate_claim_result(claim_result, &raw, Some(record.focal_id))
                .await?
            {
                return Ok(updated);
            }
        }
        // Still queued on the exchange side; nothing to record.
        Ok(record)
    }

    /// Sends a free-form communication about a submission
    ///
    /// Opens an unacknowledged-communication interaction closed by a later
    /// polled acknowledgment. A reply to an information request names the
    /// exchange-issued request identifier, which closes that request.
    pub async fn send_communication(
        &self,
        submission_id: SubmissionId,
        payloads: Vec<String>,
        in_response_to: Option<Uuid>,
    ) -> Result<PendingInteraction, ExchangeError> {
        let record = self.store.get_submission(submission_id).await?;
        if record.status == SubmissionStatus::Draft {
            return Err(ExchangeError::guard(
                "cannot communicate about an untransmitted submission",
            ));
        }

        let communication_id = Uuid::now_v7();
        let builder = RequestBuilder::new(self.directory.sender(), record.receiver.clone());
        let envelope = builder.communication(
            communication_id,
            Some(record.focal_id),
            payloads,
            in_response_to,
        );
        let response = self.transport.send(&envelope, SendOptions::standard()).await?;
        let validated = validate_response(EventKind::Communication, &response);
        if !validated.success {
            return Err(ExchangeError::Business {
                errors: validated.errors,
            });
        }

        if let Some(request_id) = in_response_to {
            self.close_interaction(InteractionKind::InformationRequest, request_id)
                .await?;
        }

        let interaction =
            PendingInteraction::unacknowledged_communication(communication_id, Some(record.id));
        self.store.insert_interaction(&interaction).await?;
        info!(submission = %record.id, communication = %communication_id, "communication sent");
        Ok(interaction)
    }

    /// Groups draft claim submissions into a batch
    ///
    /// Members must share one receiver identity; a claim attached to an
    /// active batch cannot join another one until that batch is failed or
    /// still draft.
    pub async fn create_batch(
        &self,
        submission_ids: Vec<SubmissionId>,
    ) -> Result<BatchRecord, ExchangeError> {
        let mut members = Vec::with_capacity(submission_ids.len());
        let mut records = Vec::with_capacity(submission_ids.len());
        let mut receiver: Option<String> = None;

        for submission_id in submission_ids {
            let record = self.store.get_submission(submission_id).await?;
            if record.kind != SubmissionKind::Claim || record.status != SubmissionStatus::Draft {
                return Err(SubmissionError::NotBatchable(
                    record.id.to_string(),
                    format!("{:?}", record.status),
                )
                .into());
            }
            if let Some(existing) = record.batch_id {
                let batch = self.store.get_batch(existing).await?;
                if !batch.status.allows_reassignment() {
                    return Err(SubmissionError::AlreadyBatched(
                        record.id.to_string(),
                        existing.to_string(),
                    )
                    .into());
                }
            }
            match &receiver {
                None => receiver = Some(record.receiver.clone()),
                Some(shared) if *shared != record.receiver => {
                    return Err(SubmissionError::MixedReceivers.into());
                }
                Some(_) => {}
            }
            members.push((record.id, record.focal_id));
            records.push(record);
        }

        let receiver = receiver.ok_or_else(|| {
            ExchangeError::from(SubmissionError::BatchSizeOutOfRange(
                0,
                MIN_BATCH_SIZE,
                MAX_BATCH_SIZE,
            ))
        })?;
        let batch = BatchRecord::create(receiver, members)?;
        self.store.insert_batch(&batch).await?;
        for mut record in records {
            record.attach_to_batch(batch.id);
            self.store.update_submission(&record).await?;
        }
        info!(batch = %batch.id, members = batch.members.len(), "batch created");
        Ok(batch)
    }

    /// Transmits a draft batch as one envelope
    ///
    /// Member records stay draft if the transport fails outright, keeping
    /// them reassignable; the batch itself moves to `failed`.
    pub async fn submit_batch(&self, batch_id: BatchId) -> Result<BatchRecord, ExchangeError> {
        let mut batch = self.store.get_batch(batch_id).await?;
        if batch.status != BatchStatus::Draft {
            return Err(SubmissionError::BatchNotSubmittable(
                batch.id.to_string(),
                format!("{:?}", batch.status),
            )
            .into());
        }

        let mut member_records = Vec::with_capacity(batch.members.len());
        let mut claims = Vec::with_capacity(batch.members.len());
        for member in &batch.members {
            let record = self.store.get_submission(member.submission_id).await?;
            match &record.payload {
                RecordPayload::Claim(claim) => claims.push((member.sequence, claim.clone())),
                _ => {
                    return Err(ExchangeError::guard(format!(
                        "batch member {} is not a claim",
                        record.id
                    )))
                }
            }
            member_records.push(record);
        }

        let builder = RequestBuilder::new(self.directory.sender(), batch.receiver.clone());
        let envelope = builder.batch(&claims);
        let raw_request = envelope.to_raw();

        let mut batch_record = SubmissionRecord::new(
            RecordPayload::Batch {
                batch_ref: batch.id.as_uuid().to_owned(),
            },
            batch.receiver.clone(),
        );
        batch_record.mark_pending(raw_request.clone())?;
        self.store.insert_submission(&batch_record).await?;

        let response = match self.transport.send(&envelope, SendOptions::batch()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(batch = %batch.id, error = %err, "batch transport failure");
                batch_record.mark_error(None, vec![], Some(format!("transport: {err}")))?;
                self.store.update_submission(&batch_record).await?;
                batch.mark_failed();
                self.store.update_batch(&batch).await?;
                return Ok(batch);
            }
        };

        let validated = validate_response(EventKind::BatchRequest, &response);
        let raw_response = response.to_raw();
        if !validated.success {
            batch_record.mark_error(Some(raw_response), validated.errors, None)?;
            self.store.update_submission(&batch_record).await?;
            batch.mark_failed();
            self.store.update_batch(&batch).await?;
            return Ok(batch);
        }

        batch.mark_queued()?;
        batch_record.mark_queued(raw_response.clone(), None)?;
        self.store.update_submission(&batch_record).await?;
        self.store
            .insert_interaction(&PendingInteraction::queued_submission(
                batch.id.as_uuid().to_owned(),
                batch_record.id,
            ))
            .await?;

        // Seed every member as queued, then apply any terminal results the
        // exchange answered synchronously.
        for record in &mut member_records {
            record.mark_pending(raw_request.clone())?;
            record.mark_queued(raw_response.clone(), None)?;
            self.store.update_submission(record).await?;
        }
        for resource in response.resources_of(ResourceType::ClaimResult) {
            if let Resource::ClaimResult(claim_result) = resource {
                self.apply_batch_result(&batch, claim_result, &raw_response)
                    .await?;
            }
        }

        let batch = self.refresh_batch(batch.id).await?;
        info!(batch = %batch.id, status = ?batch.status, "batch submitted");
        Ok(batch)
    }

    /// Polls the exchange scoped to one batch and re-associates each
    /// adjudication to its member claim by sequence number
    pub async fn poll_batch(&self, batch_id: BatchId) -> Result<BatchRecord, ExchangeError> {
        let batch = self.store.get_batch(batch_id).await?;
        if batch.status == BatchStatus::Draft {
            return Err(SubmissionError::BatchNotSubmittable(
                batch.id.to_string(),
                "Draft".to_string(),
            )
            .into());
        }
        if batch.is_settled() {
            return Ok(batch);
        }

        let focus = batch.id.as_uuid().to_owned();
        let lock = self.focus_lock(Some(focus)).await;
        let _guard = lock.lock().await;

        let builder = self.poll_builder();
        let envelope = builder.poll(Some(focus), None);
        let response = self.transport.send(&envelope, SendOptions::standard()).await?;
        let validated = validate_response(EventKind::PollRequest, &response);
        if !validated.success {
            return Err(ExchangeError::Business {
                errors: validated.errors,
            });
        }

        let raw = response.to_raw();
        for resource in response.resources_of(ResourceType::ClaimResult) {
            if let Resource::ClaimResult(claim_result) = resource {
                self.apply_batch_result(&batch, claim_result, &raw).await?;
            }
        }
        self.refresh_batch(batch.id).await
    }

    /// Loads one submission record
    pub async fn get_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<SubmissionRecord, ExchangeError> {
        Ok(self.store.get_submission(submission_id).await?)
    }

    /// Loads one batch record
    pub async fn get_batch(&self, batch_id: BatchId) -> Result<BatchRecord, ExchangeError> {
        Ok(self.store.get_batch(batch_id).await?)
    }

    // ------------------------------------------------------------------
    // internals

    fn resolve_receiver(&self, insurer_ref: &str) -> Result<String, ExchangeError> {
        self.directory
            .receiver(insurer_ref)
            .ok_or_else(|| SubmissionError::MissingReceiver(insurer_ref.to_string()).into())
    }

    fn poll_builder(&self) -> RequestBuilder {
        // Polls go to the exchange itself rather than one insurer.
        RequestBuilder::new(self.directory.sender(), "exchange".to_string())
    }

    async fn focus_lock(&self, focus: Option<Uuid>) -> Arc<Mutex<()>> {
        let key = focus.unwrap_or(Uuid::nil());
        let mut locks = self.focus_locks.lock().await;
        locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    fn task_completed(&self, validated: &ValidatedResponse) -> bool {
        matches!(
            &validated.payload,
            Some(Resource::Task(task)) if task.status == TaskStatus::Completed
        )
    }

    /// Applies a validated synchronous response to a pending record
    async fn apply_response(
        &self,
        record: &mut SubmissionRecord,
        event: EventKind,
        response: &Envelope,
    ) -> Result<(), ExchangeError> {
        let validated = validate_response(event, response);
        let raw = response.to_raw();
        let exchange_ref = response.header().map(|h| h.id.to_string());

        if !validated.success {
            record.mark_error(Some(raw), validated.errors, None)?;
            self.store.update_submission(record).await?;
            info!(submission = %record.id, "submission rejected by exchange");
            return Ok(());
        }

        match &validated.payload {
            Some(Resource::EligibilityResult(result)) => {
                let disposition = result.disposition.clone().or_else(|| {
                    Some(if result.inforce { "coverage in force" } else { "coverage not in force" }.to_string())
                });
                record.mark_complete(raw, None, None, disposition)?;
            }
            Some(Resource::ClaimResult(result)) => match result.outcome {
                ClaimOutcome::Queued => {
                    record.mark_queued(raw, exchange_ref)?;
                    self.store
                        .insert_interaction(&PendingInteraction::queued_submission(
                            record.focal_id,
                            record.id,
                        ))
                        .await?;
                }
                ClaimOutcome::Complete | ClaimOutcome::Partial => {
                    record.mark_complete(
                        raw,
                        result.decision,
                        result.approved_amount,
                        result.disposition.clone(),
                    )?;
                }
                ClaimOutcome::Error => {
                    let errors = vec![ErrorRecord::business(
                        "claim-error",
                        result
                            .disposition
                            .clone()
                            .unwrap_or_else(|| "exchange could not process the claim".to_string()),
                    )];
                    record.mark_error(Some(raw), errors, result.disposition.clone())?;
                }
            },
            _ => {
                record.mark_error(
                    Some(raw),
                    vec![ErrorRecord::structural(
                        "unexpected-payload",
                        "validated response carries no interpretable payload",
                    )],
                    None,
                )?;
            }
        }
        self.store.update_submission(record).await?;
        info!(submission = %record.id, status = ?record.status, "submission outcome recorded");
        Ok(())
    }

    /// Correlates one polled claim result back to its submission record
    ///
    /// Returns the updated record when this cycle changed it; `None` for
    /// unknown focal identifiers, non-terminal results, and already-terminal
    /// records (idempotent re-poll).
    async fn correlate_claim_result(
        &self,
        result: &ClaimResult,
        raw: &serde_json::Value,
        assumed_focal: Option<Uuid>,
    ) -> Result<Option<SubmissionRecord>, ExchangeError> {
        let Some(focal_id) = result.claim_identifier.or(assumed_focal) else {
            warn!("claim result without focal identifier ignored");
            return Ok(None);
        };
        let Some(mut record) = self.store.find_submission_by_focal(focal_id).await? else {
            warn!(%focal_id, "claim result correlates to no stored submission");
            return Ok(None);
        };
        if record.status.is_terminal() {
            return Ok(None);
        }
        if !result.is_terminal() {
            return Ok(None);
        }

        match result.outcome {
            ClaimOutcome::Complete | ClaimOutcome::Partial => {
                record.mark_complete(
                    raw.clone(),
                    result.decision,
                    result.approved_amount,
                    result.disposition.clone(),
                )?;
            }
            ClaimOutcome::Error => {
                let errors = vec![ErrorRecord::business(
                    "claim-error",
                    result
                        .disposition
                        .clone()
                        .unwrap_or_else(|| "exchange could not process the claim".to_string()),
                )];
                record.mark_error(Some(raw.clone()), errors, result.disposition.clone())?;
            }
            ClaimOutcome::Queued => return Ok(None),
        }
        self.store.update_submission(&record).await?;
        self.close_interaction(InteractionKind::QueuedSubmission, focal_id)
            .await?;
        info!(submission = %record.id, status = ?record.status, "adjudication correlated");
        Ok(Some(record))
    }

    async fn correlate_eligibility(
        &self,
        result: &domain_envelope::EligibilityResult,
        raw: &serde_json::Value,
    ) -> Result<Option<SubmissionRecord>, ExchangeError> {
        let Some(focal_id) = result.request_identifier else {
            return Ok(None);
        };
        let Some(mut record) = self.store.find_submission_by_focal(focal_id).await? else {
            warn!(%focal_id, "eligibility result correlates to no stored submission");
            return Ok(None);
        };
        if record.status.is_terminal() {
            return Ok(None);
        }
        let disposition = result.disposition.clone().or_else(|| {
            Some(if result.inforce { "coverage in force" } else { "coverage not in force" }.to_string())
        });
        record.mark_complete(raw.clone(), None, None, disposition)?;
        self.store.update_submission(&record).await?;
        self.close_interaction(InteractionKind::QueuedSubmission, focal_id)
            .await?;
        Ok(Some(record))
    }

    /// Stores a newly discovered information request; idempotent
    async fn discover_information_request(
        &self,
        request: &domain_envelope::CommunicationRequest,
    ) -> Result<Option<PendingInteraction>, ExchangeError> {
        if self
            .store
            .find_interaction(InteractionKind::InformationRequest, request.identifier)
            .await?
            .is_some()
        {
            return Ok(None);
        }
        let submission_id = match request.about {
            Some(about) => self
                .store
                .find_submission_by_focal(about)
                .await?
                .map(|record| record.id),
            None => None,
        };
        let interaction = PendingInteraction::information_request(
            request.identifier,
            submission_id,
            request.reason.clone(),
        );
        self.store.insert_interaction(&interaction).await?;
        info!(request = %request.identifier, "information request discovered");
        Ok(Some(interaction))
    }

    /// Closes the acknowledged communication's interaction; idempotent
    async fn apply_acknowledgment(
        &self,
        communication: &domain_envelope::CommunicationResource,
    ) -> Result<Option<PendingInteraction>, ExchangeError> {
        let Some(local_id) = communication.in_response_to else {
            return Ok(None);
        };
        let Some(mut interaction) = self
            .store
            .find_interaction(InteractionKind::UnacknowledgedCommunication, local_id)
            .await?
        else {
            warn!(%local_id, "acknowledgment correlates to no stored communication");
            return Ok(None);
        };
        if !interaction.is_open() {
            return Ok(None);
        }
        interaction.close();
        self.store.update_interaction(&interaction).await?;
        info!(communication = %local_id, "communication acknowledged");
        Ok(Some(interaction))
    }

    /// Applies one batch adjudication result to the member it sequences to
    async fn apply_batch_result(
        &self,
        batch: &BatchRecord,
        result: &ClaimResult,
        raw: &serde_json::Value,
    ) -> Result<(), ExchangeError> {
        let member = match result.sequence {
            Some(sequence) => batch.member_by_sequence(sequence),
            None => result
                .claim_identifier
                .and_then(|claim_id| batch.member_by_claim(claim_id)),
        };
        let Some(member) = member else {
            warn!(batch = %batch.id, sequence = ?result.sequence, "batch result matches no member");
            return Ok(());
        };
        self.correlate_claim_result(result, raw, Some(member.claim_id))
            .await?;
        Ok(())
    }

    /// Recomputes one batch's aggregate from its member records
    async fn refresh_batch(&self, batch_id: BatchId) -> Result<BatchRecord, ExchangeError> {
        let mut batch = self.store.get_batch(batch_id).await?;
        let mut member_records = Vec::with_capacity(batch.members.len());
        for member in &batch.members {
            member_records.push(self.store.get_submission(member.submission_id).await?);
        }
        batch.recompute(&member_records);
        self.store.update_batch(&batch).await?;

        if batch.is_settled() {
            // The batch's own submission record completes with the aggregate
            // disposition once no member is outstanding.
            let focal = batch.id.as_uuid().to_owned();
            if let Some(mut batch_record) = self.store.find_submission_by_focal(focal).await? {
                if !batch_record.status.is_terminal() {
                    let audit = batch_record
                        .response_envelope
                        .clone()
                        .unwrap_or(serde_json::Value::Null);
                    batch_record.mark_complete(
                        audit,
                        None,
                        None,
                        Some(format!("batch {:?}", batch.status).to_lowercase()),
                    )?;
                    self.store.update_submission(&batch_record).await?;
                }
            }
            self.close_interaction(InteractionKind::QueuedSubmission, focal)
                .await?;
        }
        Ok(batch)
    }

    async fn close_interaction(
        &self,
        kind: InteractionKind,
        correlation_id: Uuid,
    ) -> Result<(), ExchangeError> {
        if let Some(mut interaction) = self.store.find_interaction(kind, correlation_id).await? {
            if interaction.is_open() {
                interaction.close();
                self.store.update_interaction(&interaction).await?;
            }
        }
        Ok(())
    }
}
