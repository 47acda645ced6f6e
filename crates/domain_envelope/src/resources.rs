//! Payload resources carried inside envelopes
//!
//! Shapes follow the exchange wire vocabulary: camelCase field names,
//! lowercase coded values, optional fields omitted when absent. Result
//! resources echo the focal identifier of the request they answer, which is
//! the correlation key the poll engine matches on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ErrorRecord, ErrorSeverity, Money};

/// Eligibility check request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    /// Focal identifier assigned by the submitter
    pub identifier: Uuid,
    pub patient_ref: String,
    pub coverage_ref: String,
    pub provider_ref: String,
    pub insurer_ref: String,
    pub service_date: NaiveDate,
}

/// Eligibility check result payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    /// Echo of the request's focal identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_identifier: Option<Uuid>,
    /// True when the coverage is in force for the service date
    pub inforce: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
}

/// Claim type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimKind {
    Professional,
    Institutional,
    Pharmacy,
    Oral,
    Vision,
}

/// One billed line on a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimItem {
    /// 1-based line ordinal
    pub sequence: u32,
    pub service_code: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Claim (or prior-authorization) request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResource {
    /// Focal identifier assigned by the submitter
    pub identifier: Uuid,
    pub kind: ClaimKind,
    pub patient_ref: String,
    pub coverage_ref: String,
    pub provider_ref: String,
    pub insurer_ref: String,
    pub total: Money,
    pub items: Vec<ClaimItem>,
}

/// Business outcome reported on a claim result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimOutcome {
    /// Accepted; adjudication deferred - poll later
    Queued,
    /// Terminal adjudication present
    Complete,
    /// Terminal with mixed line-level results
    Partial,
    /// The exchange could not process the claim
    Error,
}

/// Terminal adjudication decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjudicationDecision {
    Approved,
    #[serde(rename = "partially-approved")]
    PartiallyApproved,
    Denied,
}

/// Claim / prior-authorization adjudication result payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResult {
    /// Echo of the claim's focal identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_identifier: Option<Uuid>,
    pub outcome: ClaimOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<AdjudicationDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<Money>,
    /// Batch member ordinal, echoed on results for batch submissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

impl ClaimResult {
    /// Returns true if this result is a terminal adjudication
    pub fn is_terminal(&self) -> bool {
        !matches!(self.outcome, ClaimOutcome::Queued)
    }
}

/// Coded purpose of a task resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCode {
    Poll,
    Cancel,
    #[serde(rename = "status-check")]
    StatusCheck,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Requested,
    Accepted,
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
    Failed,
    Rejected,
}

impl TaskStatus {
    /// Returns true when the task reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Rejected
        )
    }
}

/// Kind of a task output entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutputKind {
    Error,
    Status,
    Reference,
}

/// One output entry on a task resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutput {
    pub kind: TaskOutputKind,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskOutput {
    /// Converts a failure-typed output into a normalized error record
    pub fn to_error_record(&self) -> Option<ErrorRecord> {
        if self.kind != TaskOutputKind::Error {
            return None;
        }
        Some(ErrorRecord::business(
            self.code.clone(),
            self.message.clone().unwrap_or_else(|| self.code.clone()),
        ))
    }
}

/// Task payload used by cancel, status-check, and poll flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    /// Focal identifier of the submission this task concerns, if scoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_identifier: Option<Uuid>,
    pub code: TaskCode,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Maximum result count requested on a poll
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TaskOutput>,
}

impl TaskResource {
    /// Extracts every failure-typed output as an error record
    pub fn failure_records(&self) -> Vec<ErrorRecord> {
        self.outputs
            .iter()
            .filter_map(TaskOutput::to_error_record)
            .collect()
    }
}

/// Communication delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStatus {
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
}

/// Free-form communication payload, outbound or acknowledgment
///
/// Acknowledgments from the exchange set `in_response_to` to the local
/// communication identifier they confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationResource {
    pub identifier: Uuid,
    /// Submission or claim this communication concerns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<Uuid>,
    pub status: CommunicationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payloads: Vec<String>,
}

impl CommunicationResource {
    /// Returns true if this is an acknowledgment of an earlier communication
    pub fn is_acknowledgment(&self) -> bool {
        self.in_response_to.is_some()
    }
}

/// Exchange-issued request for additional material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationRequest {
    /// Exchange-issued request identifier - the idempotence key
    pub identifier: Uuid,
    /// Submission or claim the request concerns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payloads: Vec<String>,
}

/// One issue inside a structural-error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeIssue {
    pub severity: ErrorSeverity,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Path locating the offending element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl OutcomeIssue {
    /// Converts to a normalized error record, preserving severity and path
    pub fn to_error_record(&self) -> ErrorRecord {
        let mut record = ErrorRecord::business(
            self.code.clone(),
            self.details.clone().unwrap_or_else(|| self.code.clone()),
        )
        .with_severity(self.severity);
        if let Some(expression) = &self.expression {
            record = record.with_expression(expression.clone());
        }
        record
    }
}

/// Explicit structural-error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(default)]
    pub issues: Vec<OutcomeIssue>,
}

impl OperationOutcome {
    /// Extracts every issue as an error record, in reported order
    pub fn error_records(&self) -> Vec<ErrorRecord> {
        self.issues.iter().map(OutcomeIssue::to_error_record).collect()
    }

    /// Returns true if any issue is of failure severity
    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_claim_result_terminality() {
        let queued = ClaimResult {
            claim_identifier: None,
            outcome: ClaimOutcome::Queued,
            decision: None,
            disposition: None,
            approved_amount: None,
            sequence: None,
        };
        assert!(!queued.is_terminal());

        let complete = ClaimResult {
            outcome: ClaimOutcome::Complete,
            decision: Some(AdjudicationDecision::Approved),
            approved_amount: Some(Money::new(dec!(100), Currency::SAR)),
            ..queued.clone()
        };
        assert!(complete.is_terminal());
    }

    #[test]
    fn test_task_failure_records_only_from_error_outputs() {
        let task = TaskResource {
            focal_identifier: None,
            code: TaskCode::StatusCheck,
            status: TaskStatus::Failed,
            reason: None,
            count: None,
            outputs: vec![
                TaskOutput {
                    kind: TaskOutputKind::Status,
                    code: "queued".to_string(),
                    message: None,
                },
                TaskOutput {
                    kind: TaskOutputKind::Error,
                    code: "GE-042".to_string(),
                    message: Some("submission not found".to_string()),
                },
            ],
        };
        let records = task.failure_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "GE-042");
    }

    #[test]
    fn test_outcome_issue_preserves_expression() {
        let issue = OutcomeIssue {
            severity: ErrorSeverity::Error,
            code: "BV-007".to_string(),
            details: Some("service date in the future".to_string()),
            expression: Some("Claim.item[2].servicedDate".to_string()),
        };
        let record = issue.to_error_record();
        assert_eq!(record.expression.as_deref(), Some("Claim.item[2].servicedDate"));
        assert_eq!(record.severity, ErrorSeverity::Error);
    }

    #[test]
    fn test_warning_only_outcome_has_no_failures() {
        let outcome = OperationOutcome {
            issues: vec![OutcomeIssue {
                severity: ErrorSeverity::Warning,
                code: "W-001".to_string(),
                details: None,
                expression: None,
            }],
        };
        assert!(!outcome.has_failures());
        assert_eq!(outcome.error_records().len(), 1);
    }

    #[test]
    fn test_acknowledgment_detection() {
        let ack = CommunicationResource {
            identifier: Uuid::new_v4(),
            about: None,
            in_response_to: Some(Uuid::new_v4()),
            status: CommunicationStatus::Completed,
            payloads: vec![],
        };
        assert!(ack.is_acknowledgment());
    }

    #[test]
    fn test_decision_wire_names() {
        let json = serde_json::to_string(&AdjudicationDecision::PartiallyApproved).unwrap();
        assert_eq!(json, r#""partially-approved""#);
    }
}
