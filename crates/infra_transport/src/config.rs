//! Transport configuration

use serde::Deserialize;

/// Exchange endpoint configuration
///
/// Retry and timeout defaults follow the exchange onboarding guidance:
/// three attempts, one-second base backoff capped at ten seconds, and a
/// sixty-second request timeout (doubled for batch submissions by the
/// client).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Exchange endpoint URL
    pub endpoint_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of attempts for retryable failures
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub backoff_base_ms: u64,
    /// Backoff cap in milliseconds
    pub backoff_cap_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:8080/exchange".to_string(),
            timeout_secs: 60,
            retry_attempts: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 10_000,
        }
    }
}

impl ExchangeConfig {
    /// Loads configuration from `EXCHANGE_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        config::Config::builder()
            .add_source(config::Environment::with_prefix("EXCHANGE").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
