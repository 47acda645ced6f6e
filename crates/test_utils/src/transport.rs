//! Scriptable transport stub
//!
//! Models post-retry transport outcomes: each scripted entry is what the
//! real client would return after its own retry loop finished. Every
//! envelope handed to `send` is recorded, so tests can assert on call
//! counts and on the documents that went out.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use core_kernel::{EnginePort, TransportError};
use domain_envelope::Envelope;
use domain_submission::{ExchangeTransport, SendOptions};

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Deliver this response envelope
    Respond(Envelope),
    /// Terminal HTTP failure (e.g. 404)
    HttpError { status: u16, body: String },
    /// Retry exhaustion after connection failures
    Exhausted,
}

/// Transport double that replays scripted outcomes in order
#[derive(Default)]
pub struct StubTransport {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    sent: Mutex<Vec<(Envelope, SendOptions)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response
    pub async fn respond_with(&self, envelope: Envelope) {
        self.script
            .lock()
            .await
            .push_back(ScriptedOutcome::Respond(envelope));
    }

    /// Scripts a terminal HTTP failure
    pub async fn fail_with_http(&self, status: u16, body: impl Into<String>) {
        self.script.lock().await.push_back(ScriptedOutcome::HttpError {
            status,
            body: body.into(),
        });
    }

    /// Scripts a retry-exhausted connection failure
    pub async fn fail_exhausted(&self) {
        self.script.lock().await.push_back(ScriptedOutcome::Exhausted);
    }

    /// Number of envelopes sent through this transport
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Every envelope sent, with its options, in order
    pub async fn sent(&self) -> Vec<(Envelope, SendOptions)> {
        self.sent.lock().await.clone()
    }
}

impl EnginePort for StubTransport {}

#[async_trait]
impl ExchangeTransport for StubTransport {
    async fn send(
        &self,
        envelope: &Envelope,
        options: SendOptions,
    ) -> Result<Envelope, TransportError> {
        self.sent.lock().await.push((envelope.clone(), options));
        match self.script.lock().await.pop_front() {
            Some(ScriptedOutcome::Respond(response)) => Ok(response),
            Some(ScriptedOutcome::HttpError { status, body }) => {
                Err(TransportError::Http { status, body })
            }
            Some(ScriptedOutcome::Exhausted) => Err(TransportError::Exhausted {
                attempts: 3,
                last: Box::new(TransportError::NoResponse("scripted failure".to_string())),
            }),
            None => Err(TransportError::NoResponse(
                "transport script exhausted".to_string(),
            )),
        }
    }
}
