//! HTTP client for the exchange endpoint
//!
//! One endpoint, one fixed media type. The client never inspects payload
//! semantics: a 200 carrying a business rejection is still a transport
//! success here and is classified by the response validator downstream.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use core_kernel::{EnginePort, TransportError};
use domain_envelope::Envelope;
use domain_submission::{ExchangeTransport, SendOptions};

use crate::config::ExchangeConfig;
use crate::retry::backoff_delay;

/// Fixed content type for every exchange call
pub const MEDIA_TYPE: &str = "application/fhir+json";

/// Reqwest-backed transport adapter
#[derive(Debug, Clone)]
pub struct HttpExchangeTransport {
    http: reqwest::Client,
    endpoint: Url,
    config: ExchangeConfig,
}

impl HttpExchangeTransport {
    /// Creates a transport from configuration
    pub fn new(config: ExchangeConfig) -> Result<Self, TransportError> {
        let endpoint = Url::parse(&config.endpoint_url)
            .map_err(|e| TransportError::Request(format!("invalid endpoint url: {e}")))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Request(format!("client init: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Request timeout for one attempt
    ///
    /// Batch submissions carry up to 200 embedded claims, so their timeout
    /// is doubled.
    pub fn request_timeout(&self, options: SendOptions) -> Duration {
        let base = Duration::from_secs(self.config.timeout_secs);
        if options.batch {
            base * 2
        } else {
            base
        }
    }

    async fn attempt(&self, body: &str, timeout: Duration) -> Result<Envelope, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, MEDIA_TYPE)
            .header(reqwest::header::ACCEPT, MEDIA_TYPE)
            .timeout(timeout)
            .body(body.to_string())
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::NoResponse(format!("body read failed: {e}")))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        // A success status with an unparseable body is "no usable response":
        // retryable, since flaky intermediaries produce exactly this.
        Envelope::from_json(&text)
            .map_err(|e| TransportError::NoResponse(format!("unparseable response envelope: {e}")))
    }
}

fn classify_send_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::Request(error.to_string())
    } else {
        TransportError::NoResponse(error.to_string())
    }
}

impl EnginePort for HttpExchangeTransport {}

#[async_trait]
impl ExchangeTransport for HttpExchangeTransport {
    /// Sends one envelope with bounded retry
    ///
    /// 4xx answers are terminal on the first attempt; 5xx and missing
    /// responses retry up to `retry_attempts` with exponential backoff.
    async fn send(
        &self,
        envelope: &Envelope,
        options: SendOptions,
    ) -> Result<Envelope, TransportError> {
        let body = envelope
            .to_json()
            .map_err(|e| TransportError::Request(format!("envelope serialization: {e}")))?;
        let timeout = self.request_timeout(options);
        let base = Duration::from_millis(self.config.backoff_base_ms);
        let cap = Duration::from_millis(self.config.backoff_cap_ms);
        let attempts = self.config.retry_attempts.max(1);

        let mut last: Option<TransportError> = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = backoff_delay(attempt - 1, base, cap);
                debug!(attempt, ?delay, "retrying exchange call");
                tokio::time::sleep(delay).await;
            }
            match self.attempt(&body, timeout).await {
                Ok(response) => return Ok(response),
                Err(err) if !err.is_retryable() => {
                    warn!(attempt, error = %err, "terminal transport failure");
                    return Err(err);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "retryable transport failure");
                    last = Some(err);
                }
            }
        }
        Err(TransportError::Exhausted {
            attempts,
            last: Box::new(
                last.unwrap_or_else(|| TransportError::NoResponse("no attempt made".to_string())),
            ),
        })
    }
}
