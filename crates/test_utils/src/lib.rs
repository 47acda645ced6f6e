//! Shared test utilities for the exchange engine workspace
//!
//! Provides deterministic fixtures for response envelopes, builders for
//! request payloads, a scriptable transport stub, and a static participant
//! directory - everything the engine tests need to run without a live
//! exchange.

pub mod builders;
pub mod directory;
pub mod fixtures;
pub mod generators;
pub mod transport;

pub use builders::{TestClaimBuilder, TestEligibilityBuilder};
pub use directory::StaticDirectory;
pub use fixtures::ResponseFixtures;
pub use transport::{ScriptedOutcome, StubTransport};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Initialises test tracing once per process
///
/// Controlled by `RUST_LOG`; silent by default.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}
