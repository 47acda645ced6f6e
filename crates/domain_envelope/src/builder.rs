//! Outbound envelope builders
//!
//! One builder per event kind. Builders are pure: the same inputs produce
//! the same envelope apart from generated message identifiers and the header
//! timestamp.

use chrono::Utc;
use uuid::Uuid;

use core_kernel::MessageId;

use crate::envelope::{Direction, Entry, Envelope, EventKind, MessageHeader, Resource};
use crate::resources::{
    ClaimResource, CommunicationResource, CommunicationStatus, EligibilityRequest, TaskCode,
    TaskResource, TaskStatus,
};

/// Builds request envelopes for one sender/receiver pair
///
/// Sender and receiver identities come from the participant directory; the
/// builder never resolves them itself.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    sender: String,
    receiver: String,
}

impl RequestBuilder {
    /// Creates a builder for the given sender and receiver identities
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }

    fn header(&self, event: EventKind) -> MessageHeader {
        MessageHeader {
            id: MessageId::new_v7(),
            event,
            direction: Direction::Request,
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            response_code: None,
            in_response_to: None,
            timestamp: Utc::now(),
        }
    }

    fn envelope(&self, event: EventKind, payload_entries: Vec<Entry>) -> Envelope {
        let mut entries = Vec::with_capacity(payload_entries.len() + 1);
        entries.push(Entry::new(Resource::Header(self.header(event))));
        entries.extend(payload_entries);
        Envelope::new(entries)
    }

    /// Builds an eligibility check envelope
    pub fn eligibility(&self, request: &EligibilityRequest) -> Envelope {
        self.envelope(
            EventKind::EligibilityRequest,
            vec![Entry::new(Resource::EligibilityRequest(request.clone()))],
        )
    }

    /// Builds a prior-authorization envelope
    pub fn priorauth(&self, claim: &ClaimResource) -> Envelope {
        self.envelope(
            EventKind::PriorauthRequest,
            vec![Entry::new(Resource::Claim(claim.clone()))],
        )
    }

    /// Builds a single-claim submission envelope
    pub fn claim(&self, claim: &ClaimResource) -> Envelope {
        self.envelope(
            EventKind::ClaimRequest,
            vec![Entry::new(Resource::Claim(claim.clone()))],
        )
    }

    /// Builds a batch submission envelope
    ///
    /// Each member entry carries its 1-based sequence number so the exchange
    /// can echo it on per-claim results.
    pub fn batch(&self, members: &[(u32, ClaimResource)]) -> Envelope {
        let entries = members
            .iter()
            .map(|(sequence, claim)| {
                Entry::with_sequence(Resource::Claim(claim.clone()), *sequence)
            })
            .collect();
        self.envelope(EventKind::BatchRequest, entries)
    }

    /// Builds a cancel envelope for a previously submitted focal resource
    pub fn cancel(&self, focal: Uuid, reason: &str) -> Envelope {
        let task = TaskResource {
            focal_identifier: Some(focal),
            code: TaskCode::Cancel,
            status: TaskStatus::Requested,
            reason: Some(reason.to_string()),
            count: None,
            outputs: vec![],
        };
        self.envelope(EventKind::CancelRequest, vec![Entry::new(Resource::Task(task))])
    }

    /// Builds a status-check envelope scoped to one submission
    pub fn status_check(&self, focal: Uuid) -> Envelope {
        let task = TaskResource {
            focal_identifier: Some(focal),
            code: TaskCode::StatusCheck,
            status: TaskStatus::Requested,
            reason: None,
            count: None,
            outputs: vec![],
        };
        self.envelope(EventKind::StatusCheck, vec![Entry::new(Resource::Task(task))])
    }

    /// Builds a poll envelope
    ///
    /// With a focal identifier the poll is narrowed to one submission or
    /// batch; without one it retrieves all outstanding items for the sender.
    pub fn poll(&self, focal: Option<Uuid>, count: Option<u32>) -> Envelope {
        let task = TaskResource {
            focal_identifier: focal,
            code: TaskCode::Poll,
            status: TaskStatus::Requested,
            reason: None,
            count,
            outputs: vec![],
        };
        self.envelope(EventKind::PollRequest, vec![Entry::new(Resource::Task(task))])
    }

    /// Builds an outbound communication envelope
    ///
    /// Solicited replies set `in_response_to` to the exchange-issued
    /// information-request identifier.
    pub fn communication(
        &self,
        identifier: Uuid,
        about: Option<Uuid>,
        payloads: Vec<String>,
        in_response_to: Option<Uuid>,
    ) -> Envelope {
        let communication = CommunicationResource {
            identifier,
            about,
            in_response_to,
            status: CommunicationStatus::InProgress,
            payloads,
        };
        self.envelope(
            EventKind::Communication,
            vec![Entry::new(Resource::Communication(communication))],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResourceType;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn builder() -> RequestBuilder {
        RequestBuilder::new("PR-0001", "INS-0042")
    }

    fn claim(identifier: Uuid) -> ClaimResource {
        ClaimResource {
            identifier,
            kind: crate::resources::ClaimKind::Professional,
            patient_ref: "patient/7".to_string(),
            coverage_ref: "coverage/9".to_string(),
            provider_ref: "provider/1".to_string(),
            insurer_ref: "insurer/42".to_string(),
            total: Money::new(dec!(350), Currency::SAR),
            items: vec![],
        }
    }

    #[test]
    fn test_claim_envelope_header_first() {
        let env = builder().claim(&claim(Uuid::new_v4()));
        let header = env.header().expect("header at entry 0");
        assert_eq!(header.event, EventKind::ClaimRequest);
        assert_eq!(header.direction, Direction::Request);
        assert_eq!(header.sender, "PR-0001");
        assert_eq!(header.receiver, "INS-0042");
        assert!(header.response_code.is_none());
    }

    #[test]
    fn test_batch_entries_carry_sequences() {
        let members = vec![
            (1, claim(Uuid::new_v4())),
            (2, claim(Uuid::new_v4())),
            (3, claim(Uuid::new_v4())),
        ];
        let env = builder().batch(&members);
        assert_eq!(env.header().unwrap().event, EventKind::BatchRequest);
        let sequences: Vec<_> = env
            .entries
            .iter()
            .skip(1)
            .map(|e| e.sequence.unwrap())
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_payload_is_requested_task() {
        let focal = Uuid::new_v4();
        let env = builder().cancel(focal, "entered in error");
        match &env.entries[1].resource {
            Resource::Task(task) => {
                assert_eq!(task.code, TaskCode::Cancel);
                assert_eq!(task.status, TaskStatus::Requested);
                assert_eq!(task.focal_identifier, Some(focal));
                assert_eq!(task.reason.as_deref(), Some("entered in error"));
            }
            other => panic!("expected Task, got {:?}", other.resource_type()),
        }
    }

    #[test]
    fn test_unfocused_poll_has_no_focal_identifier() {
        let env = builder().poll(None, Some(50));
        match &env.entries[1].resource {
            Resource::Task(task) => {
                assert!(task.focal_identifier.is_none());
                assert_eq!(task.count, Some(50));
            }
            other => panic!("expected Task, got {:?}", other.resource_type()),
        }
    }

    #[test]
    fn test_same_inputs_differ_only_in_generated_fields() {
        let request = EligibilityRequest {
            identifier: Uuid::new_v4(),
            patient_ref: "patient/7".to_string(),
            coverage_ref: "coverage/9".to_string(),
            provider_ref: "provider/1".to_string(),
            insurer_ref: "insurer/42".to_string(),
            service_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        let a = builder().eligibility(&request);
        let b = builder().eligibility(&request);
        // Payload entries are byte-identical; only header id/timestamp differ.
        assert_eq!(a.entries[1], b.entries[1]);
        assert_eq!(a.entries.len(), b.entries.len());
        assert_eq!(
            a.header().unwrap().event,
            b.header().unwrap().event
        );
    }

    #[test]
    fn test_communication_builder_resource_type() {
        let env = builder().communication(Uuid::new_v4(), None, vec!["attached".to_string()], None);
        assert_eq!(
            env.entries[1].resource.resource_type(),
            ResourceType::Communication
        );
    }
}
