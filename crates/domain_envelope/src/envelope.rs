//! Envelope and header model
//!
//! An envelope is an ordered sequence of typed resources. The first entry is
//! always a [`MessageHeader`] carrying the event-kind tag, sender/receiver
//! identity, and (on responses) a response code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::MessageId;

use crate::resources::{
    ClaimResource, ClaimResult, CommunicationRequest, CommunicationResource, EligibilityRequest,
    EligibilityResult, OperationOutcome, TaskResource,
};

/// Event-kind tag carried on every message header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "eligibility-request")]
    EligibilityRequest,
    #[serde(rename = "priorauth-request")]
    PriorauthRequest,
    #[serde(rename = "claim-request")]
    ClaimRequest,
    #[serde(rename = "batch-request")]
    BatchRequest,
    #[serde(rename = "cancel-request")]
    CancelRequest,
    #[serde(rename = "poll-request")]
    PollRequest,
    #[serde(rename = "status-check")]
    StatusCheck,
    #[serde(rename = "communication")]
    Communication,
}

impl EventKind {
    /// Returns the wire tag for this event kind
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::EligibilityRequest => "eligibility-request",
            EventKind::PriorauthRequest => "priorauth-request",
            EventKind::ClaimRequest => "claim-request",
            EventKind::BatchRequest => "batch-request",
            EventKind::CancelRequest => "cancel-request",
            EventKind::PollRequest => "poll-request",
            EventKind::StatusCheck => "status-check",
            EventKind::Communication => "communication",
        }
    }

    /// The payload type a successful response to this event must contain
    pub fn expected_payload(&self) -> ResourceType {
        match self {
            EventKind::EligibilityRequest => ResourceType::EligibilityResult,
            EventKind::PriorauthRequest => ResourceType::ClaimResult,
            EventKind::ClaimRequest => ResourceType::ClaimResult,
            EventKind::BatchRequest => ResourceType::ClaimResult,
            EventKind::CancelRequest => ResourceType::Task,
            EventKind::PollRequest => ResourceType::Task,
            EventKind::StatusCheck => ResourceType::Task,
            EventKind::Communication => ResourceType::Communication,
        }
    }
}

/// Message direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

/// Response code carried on response headers
///
/// `transient-error` and `fatal-error` force business failure regardless of
/// transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "transient-error")]
    TransientError,
    #[serde(rename = "fatal-error")]
    FatalError,
}

impl ResponseCode {
    /// Returns true if the header itself reports a failure
    pub fn is_error(&self) -> bool {
        !matches!(self, ResponseCode::Ok)
    }
}

/// Header resource; always entry 0 of an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub id: MessageId,
    pub event: EventKind,
    pub direction: Direction,
    pub sender: String,
    pub receiver: String,
    /// Set on responses only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<ResponseCode>,
    /// Identifier of the request message this responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<MessageId>,
    pub timestamp: DateTime<Utc>,
}

/// Discriminant for resource types, used by parsers and the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Header,
    EligibilityRequest,
    EligibilityResult,
    Claim,
    ClaimResult,
    Task,
    Communication,
    CommunicationRequest,
    OperationOutcome,
    Envelope,
    Unknown,
}

/// A typed resource inside an envelope entry
///
/// Poll responses wrap answers inside their own message envelopes, so an
/// envelope is itself a valid resource. Resource types introduced by the
/// exchange after this build are deserialized as `Unknown` and skipped by
/// parsers rather than failing the whole envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Header(MessageHeader),
    EligibilityRequest(EligibilityRequest),
    EligibilityResult(EligibilityResult),
    Claim(ClaimResource),
    ClaimResult(ClaimResult),
    Task(TaskResource),
    Communication(CommunicationResource),
    CommunicationRequest(CommunicationRequest),
    OperationOutcome(OperationOutcome),
    Envelope(Envelope),
    #[serde(other)]
    Unknown,
}

impl Resource {
    /// Returns the discriminant for this resource
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Header(_) => ResourceType::Header,
            Resource::EligibilityRequest(_) => ResourceType::EligibilityRequest,
            Resource::EligibilityResult(_) => ResourceType::EligibilityResult,
            Resource::Claim(_) => ResourceType::Claim,
            Resource::ClaimResult(_) => ResourceType::ClaimResult,
            Resource::Task(_) => ResourceType::Task,
            Resource::Communication(_) => ResourceType::Communication,
            Resource::CommunicationRequest(_) => ResourceType::CommunicationRequest,
            Resource::OperationOutcome(_) => ResourceType::OperationOutcome,
            Resource::Envelope(_) => ResourceType::Envelope,
            Resource::Unknown => ResourceType::Unknown,
        }
    }
}

/// One envelope entry: a resource plus batch metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub resource: Resource,
    /// 1-based member ordinal, set on batch request entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

impl Entry {
    /// Creates an entry without batch metadata
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            sequence: None,
        }
    }

    /// Creates a batch member entry with its sequence number
    pub fn with_sequence(resource: Resource, sequence: u32) -> Self {
        Self {
            resource,
            sequence: Some(sequence),
        }
    }
}

/// The outer message document: an ordered sequence of typed resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: MessageId,
    #[serde(rename = "entry")]
    pub entries: Vec<Entry>,
}

impl Envelope {
    /// Creates an envelope from ordered entries
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            id: MessageId::new_v7(),
            entries,
        }
    }

    /// Returns the header, if entry 0 is one
    ///
    /// A header anywhere else does not count: the invariant is positional.
    pub fn header(&self) -> Option<&MessageHeader> {
        match self.entries.first().map(|e| &e.resource) {
            Some(Resource::Header(header)) => Some(header),
            _ => None,
        }
    }

    /// Returns the response code from the header, if present
    pub fn response_code(&self) -> Option<ResponseCode> {
        self.header().and_then(|h| h.response_code)
    }

    /// Serializes to the opaque audit-trail representation
    ///
    /// Engine logic never re-parses this value; it exists for dispute
    /// resolution alongside the structured fields.
    pub fn to_raw(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Parses an envelope from a wire document
    pub fn from_json(body: &str) -> Result<Self, crate::error::CodecError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Serializes to the wire document sent to the exchange
    pub fn to_json(&self) -> Result<String, crate::error::CodecError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_header() -> MessageHeader {
        MessageHeader {
            id: MessageId::new_v7(),
            event: EventKind::ClaimRequest,
            direction: Direction::Request,
            sender: "PR-0001".to_string(),
            receiver: "INS-0042".to_string(),
            response_code: None,
            in_response_to: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_header_must_be_entry_zero() {
        let env = Envelope::new(vec![
            Entry::new(Resource::OperationOutcome(OperationOutcome { issues: vec![] })),
            Entry::new(Resource::Header(request_header())),
        ]);
        assert!(env.header().is_none());
    }

    #[test]
    fn test_header_at_entry_zero_is_found() {
        let env = Envelope::new(vec![Entry::new(Resource::Header(request_header()))]);
        assert_eq!(env.header().unwrap().sender, "PR-0001");
    }

    #[test]
    fn test_event_kind_wire_tags() {
        let json = serde_json::to_string(&EventKind::EligibilityRequest).unwrap();
        assert_eq!(json, r#""eligibility-request""#);
        let json = serde_json::to_string(&EventKind::StatusCheck).unwrap();
        assert_eq!(json, r#""status-check""#);
    }

    #[test]
    fn test_response_code_wire_names() {
        let json = serde_json::to_string(&ResponseCode::FatalError).unwrap();
        assert_eq!(json, r#""fatal-error""#);
        assert!(ResponseCode::TransientError.is_error());
        assert!(!ResponseCode::Ok.is_error());
    }

    #[test]
    fn test_unknown_resource_type_deserializes() {
        let json = r#"{"resourceType":"FutureThing","payload":123}"#;
        let resource: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.resource_type(), ResourceType::Unknown);
    }

    #[test]
    fn test_envelope_serde_round_trip() {
        let env = Envelope::new(vec![Entry::new(Resource::Header(request_header()))]);
        let json = serde_json::to_string(&env).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(env, back);
    }
}
