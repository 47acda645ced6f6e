//! End-to-end engine behaviour against a scripted transport
//!
//! Every scenario runs the real state machine, validator, and correlation
//! logic over the in-memory store; only the wire is faked.

use std::sync::Arc;

use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Currency, ExchangeError, Money};
use domain_envelope::{AdjudicationDecision, EventKind, TaskCode};
use domain_submission::{
    BatchStatus, ExchangeEngine, InteractionKind, SubmissionKind, SubmissionStatus, SubmissionStore,
    SubmitPayload,
};
use infra_store::InMemoryStore;
use test_utils::{ResponseFixtures, StaticDirectory, StubTransport, TestClaimBuilder, TestEligibilityBuilder};

type TestEngine = ExchangeEngine<InMemoryStore, StubTransport, StaticDirectory>;

fn engine() -> (TestEngine, Arc<InMemoryStore>, Arc<StubTransport>) {
    test_utils::init_tracing();
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(StubTransport::new());
    let directory = Arc::new(StaticDirectory::new("PR-0001").with_receiver("insurer/42", "INS-0042"));
    let engine = ExchangeEngine::new(store.clone(), transport.clone(), directory);
    (engine, store, transport)
}

fn sar(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::SAR)
}

// ============================================================================
// Submission scenarios
// ============================================================================

#[tokio::test]
async fn claim_approved_synchronously() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport
        .respond_with(ResponseFixtures::claim_approved(focal, sar(dec!(850))))
        .await;

    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    assert_eq!(record.status, SubmissionStatus::Complete);
    assert_eq!(record.decision, Some(AdjudicationDecision::Approved));
    assert_eq!(record.approved_amount.unwrap().amount(), dec!(850));
    assert!(record.request_envelope.is_some());
    assert!(record.response_envelope.is_some());
}

#[tokio::test]
async fn eligibility_completes_synchronously() {
    let (engine, _store, transport) = engine();
    let request = TestEligibilityBuilder::new().build();
    transport
        .respond_with(ResponseFixtures::eligibility_inforce(request.identifier))
        .await;

    let record = engine
        .submit(SubmitPayload::Eligibility(request))
        .await
        .unwrap();

    assert_eq!(record.kind, SubmissionKind::Eligibility);
    assert_eq!(record.status, SubmissionStatus::Complete);
    assert_eq!(record.disposition.as_deref(), Some("coverage in force"));
}

#[tokio::test]
async fn queued_claim_completes_via_poll_and_repoll_is_idempotent() -> anyhow::Result<()> {
    let (engine, store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;

    // Submit: the exchange queues the claim for later adjudication.
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await?;
    assert_eq!(record.status, SubmissionStatus::Queued);

    let open = store
        .find_interaction(InteractionKind::QueuedSubmission, focal)
        .await?
        .unwrap();
    assert!(open.is_open());

    // Poll scoped to the claim returns the adjudication.
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            domain_envelope::Resource::ClaimResult(ResponseFixtures::approved_result(
                focal,
                sar(dec!(850)),
                None,
            )),
        ]))
        .await;
    let result = engine.poll(Some(focal)).await?;
    assert_eq!(result.adjudications.len(), 1);

    let updated = engine.get_submission(record.id).await?;
    assert_eq!(updated.status, SubmissionStatus::Complete);
    assert_eq!(updated.approved_amount.unwrap().amount(), dec!(850));

    let closed = store
        .find_interaction(InteractionKind::QueuedSubmission, focal)
        .await?
        .unwrap();
    assert!(!closed.is_open());

    // An identical second poll changes nothing.
    let interactions_before = store.interaction_count().await;
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            domain_envelope::Resource::ClaimResult(ResponseFixtures::approved_result(
                focal,
                sar(dec!(850)),
                None,
            )),
        ]))
        .await;
    let repoll = engine.poll(Some(focal)).await?;
    assert!(repoll.adjudications.is_empty());
    assert_eq!(store.interaction_count().await, interactions_before);
    let unchanged = engine.get_submission(record.id).await?;
    assert_eq!(unchanged.status, SubmissionStatus::Complete);
    Ok(())
}

#[tokio::test]
async fn business_failure_beats_transport_success() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    // Transport answers 200, but the header carries fatal-error.
    transport
        .respond_with(ResponseFixtures::fatal_header(EventKind::ClaimRequest))
        .await;

    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    assert_eq!(record.status, SubmissionStatus::Error);
    assert!(!record.errors.is_empty());
    assert_eq!(record.errors[0].code, "fatal-error");
}

#[tokio::test]
async fn rejection_keeps_every_error_record_in_order() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    transport
        .respond_with(ResponseFixtures::rejection(
            EventKind::ClaimRequest,
            vec![
                ("BV-017", "member not covered at service date"),
                ("BV-042", "service code retired"),
            ],
        ))
        .await;

    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    assert_eq!(record.status, SubmissionStatus::Error);
    let codes: Vec<&str> = record.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["BV-017", "BV-042"]);
}

#[tokio::test]
async fn transport_exhaustion_marks_submission_error() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    transport.fail_exhausted().await;

    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    assert_eq!(record.status, SubmissionStatus::Error);
    assert!(record.disposition.unwrap().starts_with("transport:"));
}

#[tokio::test]
async fn unknown_insurer_is_a_guard_failure_with_zero_transport_calls() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().with_insurer_ref("insurer/99").build();

    let err = engine.submit(SubmitPayload::Claim(claim)).await.unwrap_err();

    assert!(err.is_guard());
    assert_eq!(transport.sent_count().await, 0);
}

// ============================================================================
// Cancel scenarios
// ============================================================================

#[tokio::test]
async fn cancelling_a_completed_submission_is_guarded() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport
        .respond_with(ResponseFixtures::claim_approved(focal, sar(dec!(850))))
        .await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();
    let sends_before = transport.sent_count().await;

    let err = engine.cancel(record.id, "entered in error").await.unwrap_err();

    assert!(err.is_guard());
    // Zero transport calls for the guarded cancel.
    assert_eq!(transport.sent_count().await, sends_before);
}

#[tokio::test]
async fn cancelling_a_queued_submission_completes_it_as_cancelled() {
    let (engine, store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    transport
        .respond_with(ResponseFixtures::task_completed(
            EventKind::CancelRequest,
            TaskCode::Cancel,
            Some(focal),
        ))
        .await;
    let cancelled = engine.cancel(record.id, "entered in error").await.unwrap();

    assert_eq!(cancelled.status, SubmissionStatus::Complete);
    assert_eq!(cancelled.disposition.as_deref(), Some("cancelled"));
    let interaction = store
        .find_interaction(InteractionKind::QueuedSubmission, focal)
        .await
        .unwrap()
        .unwrap();
    assert!(!interaction.is_open());
}

// ============================================================================
// Status-check scenarios
// ============================================================================

#[tokio::test]
async fn status_check_applies_a_terminal_result() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    transport
        .respond_with(ResponseFixtures::status_result(
            focal,
            ResponseFixtures::denied_result(focal, None),
        ))
        .await;
    let updated = engine.status_check(record.id).await.unwrap();

    assert_eq!(updated.status, SubmissionStatus::Complete);
    assert_eq!(updated.decision, Some(AdjudicationDecision::Denied));
}

#[tokio::test]
async fn status_check_leaves_a_still_queued_submission_alone() {
    let (engine, _store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    transport
        .respond_with(ResponseFixtures::task_completed(
            EventKind::StatusCheck,
            TaskCode::StatusCheck,
            Some(focal),
        ))
        .await;
    let unchanged = engine.status_check(record.id).await.unwrap();

    assert_eq!(unchanged.status, SubmissionStatus::Queued);
}

// ============================================================================
// Poll demultiplexing
// ============================================================================

#[tokio::test]
async fn information_requests_are_stored_once() {
    let (engine, store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    let request_id = Uuid::new_v4();
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            ResponseFixtures::information_request(request_id, focal, "need discharge summary"),
        ]))
        .await;
    let first = engine.poll(None).await.unwrap();
    assert_eq!(first.information_requests.len(), 1);
    assert_eq!(first.information_requests[0].correlation_id, request_id);

    // The same request on a re-poll is a no-op.
    let count_before = store.interaction_count().await;
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            ResponseFixtures::information_request(request_id, focal, "need discharge summary"),
        ]))
        .await;
    let second = engine.poll(None).await.unwrap();
    assert!(second.information_requests.is_empty());
    assert_eq!(store.interaction_count().await, count_before);
}

#[tokio::test]
async fn communication_acknowledgment_round_trip() {
    let (engine, store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    transport
        .respond_with(ResponseFixtures::communication_echo(Uuid::now_v7()))
        .await;
    let interaction = engine
        .send_communication(record.id, vec!["discharge summary attached".to_string()], None)
        .await
        .unwrap();
    assert_eq!(interaction.kind, InteractionKind::UnacknowledgedCommunication);
    assert!(interaction.is_open());

    // The exchange acknowledges the communication on a later poll.
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            ResponseFixtures::acknowledgment(interaction.correlation_id),
        ]))
        .await;
    let polled = engine.poll(None).await.unwrap();
    assert_eq!(polled.acknowledgments.len(), 1);

    let closed = store
        .find_interaction(
            InteractionKind::UnacknowledgedCommunication,
            interaction.correlation_id,
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_open());

    // Re-polling the same acknowledgment must not double-count.
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            ResponseFixtures::acknowledgment(interaction.correlation_id),
        ]))
        .await;
    let repolled = engine.poll(None).await.unwrap();
    assert!(repolled.acknowledgments.is_empty());
}

#[tokio::test]
async fn replying_to_an_information_request_closes_it() {
    let (engine, store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    let request_id = Uuid::new_v4();
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            ResponseFixtures::information_request(request_id, focal, "need discharge summary"),
        ]))
        .await;
    engine.poll(None).await.unwrap();

    transport
        .respond_with(ResponseFixtures::communication_echo(Uuid::now_v7()))
        .await;
    engine
        .send_communication(
            record.id,
            vec!["summary attached".to_string()],
            Some(request_id),
        )
        .await
        .unwrap();

    let request = store
        .find_interaction(InteractionKind::InformationRequest, request_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!request.is_open());
}

#[tokio::test]
async fn empty_poll_yields_empty_buckets() {
    let (engine, _store, transport) = engine();
    transport.respond_with(ResponseFixtures::poll_empty()).await;

    let result = engine.poll(None).await.unwrap();

    assert!(result.adjudications.is_empty());
    assert!(result.information_requests.is_empty());
    assert!(result.acknowledgments.is_empty());
}

#[tokio::test]
async fn failed_poll_touches_no_pending_interaction() {
    let (engine, store, transport) = engine();
    let claim = TestClaimBuilder::new().build();
    let focal = claim.identifier;
    transport.respond_with(ResponseFixtures::claim_queued(focal)).await;
    let record = engine.submit(SubmitPayload::Claim(claim)).await.unwrap();

    transport.respond_with(ResponseFixtures::poll_fatal()).await;
    let err = engine.poll(Some(focal)).await.unwrap_err();

    match err {
        ExchangeError::Business { errors } => assert!(!errors.is_empty()),
        other => panic!("expected Business, got {other:?}"),
    }
    // The queued submission and its interaction are untouched.
    let unchanged = engine.get_submission(record.id).await.unwrap();
    assert_eq!(unchanged.status, SubmissionStatus::Queued);
    let interaction = store
        .find_interaction(InteractionKind::QueuedSubmission, focal)
        .await
        .unwrap()
        .unwrap();
    assert!(interaction.is_open());
}

// ============================================================================
// Batch scenarios
// ============================================================================

async fn prepared_batch(
    engine: &TestEngine,
    transport: &StubTransport,
    count: usize,
) -> (core_kernel::BatchId, Vec<core_kernel::SubmissionId>, Vec<Uuid>) {
    let mut submission_ids = Vec::new();
    let mut focals = Vec::new();
    for _ in 0..count {
        let claim = TestClaimBuilder::new().build();
        focals.push(claim.identifier);
        let record = engine.prepare_claim(claim).await.unwrap();
        submission_ids.push(record.id);
    }
    let batch = engine.create_batch(submission_ids.clone()).await.unwrap();
    transport
        .respond_with(ResponseFixtures::batch_queued(
            &(1..=count as u32).collect::<Vec<_>>(),
        ))
        .await;
    let batch = engine.submit_batch(batch.id).await.unwrap();
    assert_eq!(batch.status, BatchStatus::Queued);
    (batch.id, submission_ids, focals)
}

#[tokio::test]
async fn batch_members_queue_on_submission() {
    let (engine, store, transport) = engine();
    let (batch_id, submission_ids, _focals) = prepared_batch(&engine, &transport, 3).await;

    for submission_id in &submission_ids {
        let record = engine.get_submission(*submission_id).await.unwrap();
        assert_eq!(record.status, SubmissionStatus::Queued);
        assert_eq!(record.batch_id, Some(batch_id));
    }
    let batch = engine.get_batch(batch_id).await.unwrap();
    assert_eq!(batch.counts.pending, 3);

    // The batch envelope itself is tracked as a queued submission of kind
    // batch, keyed by the batch identifier.
    let batch_record = store
        .find_submission_by_focal(*batch.id.as_uuid())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch_record.kind, SubmissionKind::Batch);
    assert_eq!(batch_record.status, SubmissionStatus::Queued);
}

#[tokio::test]
async fn partial_batch_poll_updates_only_matched_sequences() {
    let (engine, _store, transport) = engine();
    let (batch_id, submission_ids, focals) = prepared_batch(&engine, &transport, 3).await;

    // Adjudications for sequences 1 and 3 only.
    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            domain_envelope::Resource::ClaimResult(ResponseFixtures::approved_result(
                focals[0],
                sar(dec!(100)),
                Some(1),
            )),
            domain_envelope::Resource::ClaimResult(ResponseFixtures::approved_result(
                focals[2],
                sar(dec!(300)),
                Some(3),
            )),
        ]))
        .await;
    let batch = engine.poll_batch(batch_id).await.unwrap();

    assert_eq!(batch.status, BatchStatus::Partial);
    assert_eq!(batch.counts.approved, 2);
    assert_eq!(batch.counts.pending, 1);

    // Claim 2 keeps its prior non-terminal state.
    let middle = engine.get_submission(submission_ids[1]).await.unwrap();
    assert_eq!(middle.status, SubmissionStatus::Queued);
}

#[tokio::test]
async fn batch_settles_once_every_member_is_terminal() {
    let (engine, store, transport) = engine();
    let (batch_id, _submission_ids, focals) = prepared_batch(&engine, &transport, 2).await;

    transport
        .respond_with(ResponseFixtures::poll_response(vec![
            domain_envelope::Resource::ClaimResult(ResponseFixtures::approved_result(
                focals[0],
                sar(dec!(100)),
                Some(1),
            )),
            domain_envelope::Resource::ClaimResult(ResponseFixtures::denied_result(
                focals[1],
                Some(2),
            )),
        ]))
        .await;
    let batch = engine.poll_batch(batch_id).await.unwrap();

    assert_eq!(batch.status, BatchStatus::Partial);
    assert!(batch.is_settled());

    // The batch's own submission record completes with the aggregate.
    let batch_record = store
        .find_submission_by_focal(*batch.id.as_uuid())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch_record.kind, SubmissionKind::Batch);
    assert_eq!(batch_record.status, SubmissionStatus::Complete);

    // A settled batch ignores further polls without sending anything.
    let sends = transport.sent_count().await;
    let settled = engine.poll_batch(batch_id).await.unwrap();
    assert_eq!(settled.status, BatchStatus::Partial);
    assert_eq!(transport.sent_count().await, sends);
}

#[tokio::test]
async fn batch_guards_size_and_membership() {
    let (engine, _store, transport) = engine();

    // Too small.
    let single = engine
        .prepare_claim(TestClaimBuilder::new().build())
        .await
        .unwrap();
    assert!(engine.create_batch(vec![single.id]).await.unwrap_err().is_guard());

    // A claim in an active (queued) batch cannot join another batch.
    let (_batch_id, submission_ids, _focals) = prepared_batch(&engine, &transport, 2).await;
    let fresh = engine
        .prepare_claim(TestClaimBuilder::new().build())
        .await
        .unwrap();
    let err = engine
        .create_batch(vec![submission_ids[0], fresh.id])
        .await
        .unwrap_err();
    assert!(err.is_guard());
}

#[tokio::test]
async fn failed_batch_frees_members_for_reassignment() {
    let (engine, _store, transport) = engine();
    let first = engine.prepare_claim(TestClaimBuilder::new().build()).await.unwrap();
    let second = engine.prepare_claim(TestClaimBuilder::new().build()).await.unwrap();
    let batch = engine
        .create_batch(vec![first.id, second.id])
        .await
        .unwrap();

    transport.fail_exhausted().await;
    let failed = engine.submit_batch(batch.id).await.unwrap();
    assert_eq!(failed.status, BatchStatus::Failed);

    // Members stayed draft and can join a new batch.
    let member = engine.get_submission(first.id).await.unwrap();
    assert_eq!(member.status, SubmissionStatus::Draft);
    let replacement = engine
        .create_batch(vec![first.id, second.id])
        .await
        .unwrap();
    assert_eq!(replacement.members.len(), 2);
}

#[tokio::test]
async fn batch_envelope_is_sent_with_batch_options() {
    let (engine, _store, transport) = engine();
    let (_batch_id, _submission_ids, _focals) = prepared_batch(&engine, &transport, 2).await;

    let sent = transport.sent().await;
    let (envelope, options) = sent.last().unwrap();
    assert!(options.batch);
    assert_eq!(envelope.header().unwrap().event, EventKind::BatchRequest);
}
