//! Test data builders
//!
//! Builder patterns for request payloads with sensible defaults; tests
//! specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Currency, Money};
use domain_envelope::{ClaimItem, ClaimKind, ClaimResource, EligibilityRequest};

use crate::generators;

/// Builder for claim request payloads
pub struct TestClaimBuilder {
    identifier: Uuid,
    kind: ClaimKind,
    patient_ref: String,
    coverage_ref: String,
    provider_ref: String,
    insurer_ref: String,
    total: Money,
    items: Vec<ClaimItem>,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    /// Creates a builder with generated references and one default line
    pub fn new() -> Self {
        Self {
            identifier: Uuid::new_v4(),
            kind: ClaimKind::Professional,
            patient_ref: generators::patient_ref(),
            coverage_ref: generators::coverage_ref(),
            provider_ref: generators::provider_ref(),
            insurer_ref: "insurer/42".to_string(),
            total: Money::new(dec!(350), Currency::SAR),
            items: vec![ClaimItem {
                sequence: 1,
                service_code: generators::service_code(),
                quantity: 1,
                unit_price: Money::new(dec!(350), Currency::SAR),
            }],
        }
    }

    /// Sets the focal identifier
    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.identifier = identifier;
        self
    }

    /// Sets the claim kind
    pub fn with_kind(mut self, kind: ClaimKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the insurer reference
    pub fn with_insurer_ref(mut self, insurer_ref: impl Into<String>) -> Self {
        self.insurer_ref = insurer_ref.into();
        self
    }

    /// Sets the claim total
    pub fn with_total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    /// Appends one billed line
    pub fn with_item(mut self, service_code: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        let sequence = self.items.len() as u32 + 1;
        self.items.push(ClaimItem {
            sequence,
            service_code: service_code.into(),
            quantity,
            unit_price,
        });
        self
    }

    /// Builds the claim resource
    pub fn build(self) -> ClaimResource {
        ClaimResource {
            identifier: self.identifier,
            kind: self.kind,
            patient_ref: self.patient_ref,
            coverage_ref: self.coverage_ref,
            provider_ref: self.provider_ref,
            insurer_ref: self.insurer_ref,
            total: self.total,
            items: self.items,
        }
    }
}

/// Builder for eligibility request payloads
pub struct TestEligibilityBuilder {
    identifier: Uuid,
    patient_ref: String,
    coverage_ref: String,
    provider_ref: String,
    insurer_ref: String,
    service_date: NaiveDate,
}

impl Default for TestEligibilityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEligibilityBuilder {
    /// Creates a builder with generated references
    pub fn new() -> Self {
        Self {
            identifier: Uuid::new_v4(),
            patient_ref: generators::patient_ref(),
            coverage_ref: generators::coverage_ref(),
            provider_ref: generators::provider_ref(),
            insurer_ref: "insurer/42".to_string(),
            service_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
    }

    /// Sets the focal identifier
    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.identifier = identifier;
        self
    }

    /// Sets the insurer reference
    pub fn with_insurer_ref(mut self, insurer_ref: impl Into<String>) -> Self {
        self.insurer_ref = insurer_ref.into();
        self
    }

    /// Sets the service date
    pub fn with_service_date(mut self, service_date: NaiveDate) -> Self {
        self.service_date = service_date;
        self
    }

    /// Builds the eligibility request
    pub fn build(self) -> EligibilityRequest {
        EligibilityRequest {
            identifier: self.identifier,
            patient_ref: self.patient_ref,
            coverage_ref: self.coverage_ref,
            provider_ref: self.provider_ref,
            insurer_ref: self.insurer_ref,
            service_date: self.service_date,
        }
    }
}
