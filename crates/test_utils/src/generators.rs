//! Fake data generators for test payloads

use fake::faker::number::en::NumberWithFormat;
use fake::Fake;

/// Generates a patient reference
pub fn patient_ref() -> String {
    format!("patient/{}", NumberWithFormat("^######").fake::<String>())
}

/// Generates a coverage reference
pub fn coverage_ref() -> String {
    format!("coverage/{}", NumberWithFormat("^######").fake::<String>())
}

/// Generates a provider reference
pub fn provider_ref() -> String {
    format!("provider/{}", NumberWithFormat("^####").fake::<String>())
}

/// Generates a service code
pub fn service_code() -> String {
    NumberWithFormat("8346##-00-##").fake::<String>()
}
