//! Message Envelope Domain
//!
//! This crate implements the envelope format the exchange speaks: an ordered
//! bundle whose first entry is always a message header, followed by one or
//! more payload resources. It provides:
//!
//! - builders producing outbound envelopes for each event kind
//! - structural parsers that extract the header and interesting payloads,
//!   tolerating resources nested one level inside an embedded sub-envelope
//! - the response validator that decides *business* success independently of
//!   transport status
//!
//! No I/O happens here; everything is pure data transformation.

pub mod envelope;
pub mod resources;
pub mod builder;
pub mod parser;
pub mod validate;
pub mod error;

pub use envelope::{
    Direction, Entry, Envelope, EventKind, MessageHeader, Resource, ResourceType, ResponseCode,
};
pub use resources::{
    AdjudicationDecision, ClaimItem, ClaimKind, ClaimOutcome, ClaimResource, ClaimResult,
    CommunicationRequest, CommunicationResource, CommunicationStatus, EligibilityRequest,
    EligibilityResult, OperationOutcome, OutcomeIssue, TaskCode, TaskOutput, TaskOutputKind,
    TaskResource, TaskStatus,
};
pub use builder::RequestBuilder;
pub use validate::{validate_response, ValidatedResponse};
pub use error::CodecError;
