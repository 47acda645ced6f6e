//! Response envelope fixtures
//!
//! Canonical exchange responses as the wire produces them: ok headers with
//! queued or terminal results, fatal headers, rejection outcomes, and poll
//! bundles that nest each answer inside its own sub-envelope.

use chrono::Utc;
use uuid::Uuid;

use core_kernel::{ErrorSeverity, MessageId, Money};
use domain_envelope::{
    AdjudicationDecision, ClaimOutcome, ClaimResult, CommunicationRequest, CommunicationResource,
    CommunicationStatus, Direction, EligibilityResult, Entry, Envelope, EventKind, MessageHeader,
    OperationOutcome, OutcomeIssue, Resource, ResponseCode, TaskCode, TaskResource, TaskStatus,
};

/// Factory for response envelopes
pub struct ResponseFixtures;

impl ResponseFixtures {
    fn header(event: EventKind, code: ResponseCode) -> MessageHeader {
        MessageHeader {
            id: MessageId::new_v7(),
            event,
            direction: Direction::Response,
            sender: "INS-0042".to_string(),
            receiver: "PR-0001".to_string(),
            response_code: Some(code),
            in_response_to: Some(MessageId::new_v7()),
            timestamp: Utc::now(),
        }
    }

    fn envelope(event: EventKind, code: ResponseCode, payload: Vec<Entry>) -> Envelope {
        let mut entries = vec![Entry::new(Resource::Header(Self::header(event, code)))];
        entries.extend(payload);
        Envelope::new(entries)
    }

    /// Claim accepted with adjudication deferred
    pub fn claim_queued(focal: Uuid) -> Envelope {
        Self::envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::ClaimResult(ClaimResult {
                claim_identifier: Some(focal),
                outcome: ClaimOutcome::Queued,
                decision: None,
                disposition: Some("accepted for adjudication".to_string()),
                approved_amount: None,
                sequence: None,
            }))],
        )
    }

    /// Terminal approval for a claim
    pub fn claim_approved(focal: Uuid, amount: Money) -> Envelope {
        Self::envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::ClaimResult(Self::approved_result(
                focal, amount, None,
            )))],
        )
    }

    /// Terminal denial for a claim
    pub fn claim_denied(focal: Uuid) -> Envelope {
        Self::envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::ClaimResult(Self::denied_result(focal, None)))],
        )
    }

    /// An approved claim result resource, for poll bundles
    pub fn approved_result(focal: Uuid, amount: Money, sequence: Option<u32>) -> ClaimResult {
        ClaimResult {
            claim_identifier: Some(focal),
            outcome: ClaimOutcome::Complete,
            decision: Some(AdjudicationDecision::Approved),
            disposition: Some("approved".to_string()),
            approved_amount: Some(amount),
            sequence,
        }
    }

    /// A denied claim result resource, for poll bundles
    pub fn denied_result(focal: Uuid, sequence: Option<u32>) -> ClaimResult {
        ClaimResult {
            claim_identifier: Some(focal),
            outcome: ClaimOutcome::Complete,
            decision: Some(AdjudicationDecision::Denied),
            disposition: Some("denied: service not covered".to_string()),
            approved_amount: None,
            sequence,
        }
    }

    /// Eligibility answered synchronously
    pub fn eligibility_inforce(focal: Uuid) -> Envelope {
        Self::envelope(
            EventKind::EligibilityRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::EligibilityResult(EligibilityResult {
                request_identifier: Some(focal),
                inforce: true,
                disposition: Some("coverage in force".to_string()),
            }))],
        )
    }

    /// Transport success carrying a header-level fatal error
    pub fn fatal_header(event: EventKind) -> Envelope {
        Self::envelope(event, ResponseCode::FatalError, vec![])
    }

    /// Transport success carrying an operation rejection
    pub fn rejection(event: EventKind, issues: Vec<(&str, &str)>) -> Envelope {
        let outcome = OperationOutcome {
            issues: issues
                .into_iter()
                .map(|(code, details)| OutcomeIssue {
                    severity: ErrorSeverity::Error,
                    code: code.to_string(),
                    details: Some(details.to_string()),
                    expression: None,
                })
                .collect(),
        };
        Self::envelope(
            event,
            ResponseCode::Ok,
            vec![Entry::new(Resource::OperationOutcome(outcome))],
        )
    }

    /// Completed task response for cancel and status-check flows
    pub fn task_completed(event: EventKind, code: TaskCode, focal: Option<Uuid>) -> Envelope {
        Self::envelope(
            event,
            ResponseCode::Ok,
            vec![Entry::new(Resource::Task(TaskResource {
                focal_identifier: focal,
                code,
                status: TaskStatus::Completed,
                reason: None,
                count: None,
                outputs: vec![],
            }))],
        )
    }

    /// Status-check response carrying the terminal result for the focal
    /// submission
    pub fn status_result(focal: Uuid, result: ClaimResult) -> Envelope {
        Self::envelope(
            EventKind::StatusCheck,
            ResponseCode::Ok,
            vec![
                Entry::new(Resource::Task(TaskResource {
                    focal_identifier: Some(focal),
                    code: TaskCode::StatusCheck,
                    status: TaskStatus::Completed,
                    reason: None,
                    count: None,
                    outputs: vec![],
                })),
                Entry::new(Resource::ClaimResult(result)),
            ],
        )
    }

    /// Communication accepted by the exchange (synchronous echo)
    pub fn communication_echo(communication_id: Uuid) -> Envelope {
        Self::envelope(
            EventKind::Communication,
            ResponseCode::Ok,
            vec![Entry::new(Resource::Communication(CommunicationResource {
                identifier: communication_id,
                about: None,
                in_response_to: None,
                status: CommunicationStatus::InProgress,
                payloads: vec![],
            }))],
        )
    }

    /// An information-request resource, for poll bundles
    pub fn information_request(request_id: Uuid, about: Uuid, reason: &str) -> Resource {
        Resource::CommunicationRequest(CommunicationRequest {
            identifier: request_id,
            about: Some(about),
            reason: Some(reason.to_string()),
            payloads: vec![],
        })
    }

    /// An acknowledgment resource for a local communication, for poll bundles
    pub fn acknowledgment(local_communication_id: Uuid) -> Resource {
        Resource::Communication(CommunicationResource {
            identifier: Uuid::now_v7(),
            about: None,
            in_response_to: Some(local_communication_id),
            status: CommunicationStatus::Completed,
            payloads: vec![],
        })
    }

    /// Poll response nesting each answer inside its own sub-envelope
    pub fn poll_response(answers: Vec<Resource>) -> Envelope {
        let mut entries = vec![Entry::new(Resource::Task(TaskResource {
            focal_identifier: None,
            code: TaskCode::Poll,
            status: TaskStatus::Completed,
            reason: None,
            count: None,
            outputs: vec![],
        }))];
        for answer in answers {
            let inner_event = match &answer {
                Resource::EligibilityResult(_) => EventKind::EligibilityRequest,
                Resource::Communication(_) | Resource::CommunicationRequest(_) => {
                    EventKind::Communication
                }
                _ => EventKind::ClaimRequest,
            };
            let inner = Envelope::new(vec![
                Entry::new(Resource::Header(Self::header(inner_event, ResponseCode::Ok))),
                Entry::new(answer),
            ]);
            entries.push(Entry::new(Resource::Envelope(inner)));
        }
        Self::envelope(EventKind::PollRequest, ResponseCode::Ok, entries)
    }

    /// Poll response with no outstanding work
    pub fn poll_empty() -> Envelope {
        Self::poll_response(vec![])
    }

    /// Poll response whose own envelope reports a fatal header error
    pub fn poll_fatal() -> Envelope {
        Self::envelope(EventKind::PollRequest, ResponseCode::FatalError, vec![])
    }

    /// Batch accepted: every member queued, sequences echoed
    pub fn batch_queued(sequences: &[u32]) -> Envelope {
        let entries = sequences
            .iter()
            .map(|sequence| {
                Entry::new(Resource::ClaimResult(ClaimResult {
                    claim_identifier: None,
                    outcome: ClaimOutcome::Queued,
                    decision: None,
                    disposition: None,
                    approved_amount: None,
                    sequence: Some(*sequence),
                }))
            })
            .collect();
        Self::envelope(EventKind::BatchRequest, ResponseCode::Ok, entries)
    }
}
