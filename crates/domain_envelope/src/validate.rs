//! Business-level response validation
//!
//! Transport success and business success are independent: the exchange can
//! answer 200 and still reject the operation inside the envelope. This
//! module decides business success from the envelope alone and must never be
//! approximated by transport status.

use core_kernel::ErrorRecord;

use crate::envelope::{Envelope, EventKind, Resource, ResourceType, ResponseCode};

/// Outcome of validating a successfully-transported response envelope
#[derive(Debug, Clone)]
pub struct ValidatedResponse {
    /// Business success, independent of transport status
    pub success: bool,
    /// First payload of the expected type, when present
    pub payload: Option<Resource>,
    /// Every extracted error record, in reported order
    pub errors: Vec<ErrorRecord>,
    /// Response code from the header, when present
    pub response_code: Option<ResponseCode>,
}

impl ValidatedResponse {
    fn failure(errors: Vec<ErrorRecord>, response_code: Option<ResponseCode>) -> Self {
        Self {
            success: false,
            payload: None,
            errors,
            response_code,
        }
    }
}

/// Validates a response envelope for the given request event kind
///
/// Rules, in order:
/// 1. entry 0 must be a header, otherwise structural failure
/// 2. a `fatal-error`/`transient-error` header response code forces failure
/// 3. a terminal task payload with failure-typed outputs forces failure
/// 4. a structural-error payload forces failure unless the expected payload
///    type is also present (warning-level outcomes may accompany a result)
/// 5. otherwise, presence of the expected payload type means success
pub fn validate_response(event: EventKind, envelope: &Envelope) -> ValidatedResponse {
    let Some(_header) = envelope.header() else {
        return ValidatedResponse::failure(
            vec![ErrorRecord::structural(
                "invalid-envelope",
                "first entry is not a message header",
            )],
            None,
        );
    };
    let response_code = envelope.response_code();

    let outcome_records: Vec<ErrorRecord> = envelope
        .resources_of(ResourceType::OperationOutcome)
        .into_iter()
        .flat_map(|resource| match resource {
            Resource::OperationOutcome(outcome) => outcome.error_records(),
            _ => vec![],
        })
        .collect();

    // Header-level rejection wins over everything in the body.
    if matches!(
        response_code,
        Some(ResponseCode::FatalError) | Some(ResponseCode::TransientError)
    ) {
        let mut errors = vec![ErrorRecord::business(
            header_error_code(response_code),
            "exchange reported a header-level error",
        )];
        errors.extend(outcome_records);
        return ValidatedResponse::failure(errors, response_code);
    }

    let expected = event.expected_payload();
    let payload = envelope.first_of(expected).cloned();

    // A terminal task carrying error outputs is a business failure even when
    // the task itself is the expected payload.
    if let Some(Resource::Task(task)) = envelope.first_of(ResourceType::Task) {
        let failure_records = task.failure_records();
        if !failure_records.is_empty() {
            let mut errors = failure_records;
            errors.extend(outcome_records);
            return ValidatedResponse::failure(errors, response_code);
        }
    }

    if !outcome_records.is_empty() && payload.is_none() {
        return ValidatedResponse::failure(outcome_records, response_code);
    }

    match payload {
        Some(payload) => ValidatedResponse {
            success: true,
            payload: Some(payload),
            // Warning-level issues ride along without forcing failure.
            errors: outcome_records,
            response_code,
        },
        None => ValidatedResponse::failure(
            vec![ErrorRecord::structural(
                "missing-payload",
                format!(
                    "response to {} carries no expected payload",
                    event.tag()
                ),
            )],
            response_code,
        ),
    }
}

fn header_error_code(code: Option<ResponseCode>) -> &'static str {
    match code {
        Some(ResponseCode::FatalError) => "fatal-error",
        Some(ResponseCode::TransientError) => "transient-error",
        _ => "unknown-error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Direction, Entry, MessageHeader};
    use crate::resources::{
        ClaimOutcome, ClaimResult, OperationOutcome, OutcomeIssue, TaskCode, TaskOutput,
        TaskOutputKind, TaskResource, TaskStatus,
    };
    use chrono::Utc;
    use core_kernel::{ErrorKind, ErrorSeverity, MessageId};

    fn response_envelope(
        event: EventKind,
        code: ResponseCode,
        payload_entries: Vec<Entry>,
    ) -> Envelope {
        let header = MessageHeader {
            id: MessageId::new_v7(),
            event,
            direction: Direction::Response,
            sender: "INS-0042".to_string(),
            receiver: "PR-0001".to_string(),
            response_code: Some(code),
            in_response_to: Some(MessageId::new_v7()),
            timestamp: Utc::now(),
        };
        let mut entries = vec![Entry::new(Resource::Header(header))];
        entries.extend(payload_entries);
        Envelope::new(entries)
    }

    fn complete_result() -> Entry {
        Entry::new(Resource::ClaimResult(ClaimResult {
            claim_identifier: None,
            outcome: ClaimOutcome::Complete,
            decision: None,
            disposition: Some("approved".to_string()),
            approved_amount: None,
            sequence: None,
        }))
    }

    #[test]
    fn test_missing_header_is_structural_failure() {
        let envelope = Envelope::new(vec![complete_result()]);
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(!validated.success);
        assert_eq!(validated.errors[0].kind, ErrorKind::StructuralDefect);
        assert!(validated.response_code.is_none());
    }

    #[test]
    fn test_fatal_error_header_beats_present_payload() {
        let envelope = response_envelope(
            EventKind::ClaimRequest,
            ResponseCode::FatalError,
            vec![complete_result()],
        );
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(!validated.success);
        assert_eq!(validated.response_code, Some(ResponseCode::FatalError));
        assert_eq!(validated.errors[0].code, "fatal-error");
    }

    #[test]
    fn test_transient_error_header_is_failure() {
        let envelope = response_envelope(
            EventKind::EligibilityRequest,
            ResponseCode::TransientError,
            vec![],
        );
        let validated = validate_response(EventKind::EligibilityRequest, &envelope);
        assert!(!validated.success);
        assert_eq!(validated.errors[0].code, "transient-error");
    }

    #[test]
    fn test_task_failure_outputs_force_failure() {
        let task = TaskResource {
            focal_identifier: None,
            code: TaskCode::Cancel,
            status: TaskStatus::Rejected,
            reason: None,
            count: None,
            outputs: vec![TaskOutput {
                kind: TaskOutputKind::Error,
                code: "GE-110".to_string(),
                message: Some("submission already paid".to_string()),
            }],
        };
        let envelope = response_envelope(
            EventKind::CancelRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::Task(task))],
        );
        let validated = validate_response(EventKind::CancelRequest, &envelope);
        assert!(!validated.success);
        assert_eq!(validated.errors.len(), 1);
        assert_eq!(validated.errors[0].code, "GE-110");
    }

    #[test]
    fn test_operation_outcome_without_payload_is_failure() {
        let outcome = OperationOutcome {
            issues: vec![OutcomeIssue {
                severity: ErrorSeverity::Error,
                code: "BV-017".to_string(),
                details: Some("member not covered".to_string()),
                expression: None,
            }],
        };
        let envelope = response_envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::OperationOutcome(outcome))],
        );
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(!validated.success);
        assert_eq!(validated.errors.len(), 1);
        assert_eq!(validated.errors[0].code, "BV-017");
    }

    #[test]
    fn test_warning_outcome_with_payload_is_success() {
        let outcome = OperationOutcome {
            issues: vec![OutcomeIssue {
                severity: ErrorSeverity::Warning,
                code: "W-004".to_string(),
                details: Some("deprecated service code".to_string()),
                expression: None,
            }],
        };
        let envelope = response_envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::OperationOutcome(outcome)), complete_result()],
        );
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(validated.success);
        assert!(validated.payload.is_some());
        // The warning is still surfaced.
        assert_eq!(validated.errors.len(), 1);
        assert_eq!(validated.errors[0].code, "W-004");
    }

    #[test]
    fn test_expected_payload_present_is_success() {
        let envelope = response_envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![complete_result()],
        );
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(validated.success);
        assert!(validated.errors.is_empty());
    }

    #[test]
    fn test_missing_expected_payload_is_failure() {
        let envelope = response_envelope(EventKind::ClaimRequest, ResponseCode::Ok, vec![]);
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(!validated.success);
        assert_eq!(validated.errors[0].code, "missing-payload");
    }

    #[test]
    fn test_payload_nested_in_sub_envelope_is_found() {
        let inner = response_envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![complete_result()],
        );
        let envelope = response_envelope(
            EventKind::ClaimRequest,
            ResponseCode::Ok,
            vec![Entry::new(Resource::Envelope(inner))],
        );
        let validated = validate_response(EventKind::ClaimRequest, &envelope);
        assert!(validated.success);
        assert!(matches!(validated.payload, Some(Resource::ClaimResult(_))));
    }
}
