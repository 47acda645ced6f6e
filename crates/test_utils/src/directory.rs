//! Static participant directory

use std::collections::HashMap;

use core_kernel::EnginePort;
use domain_submission::ParticipantDirectory;

/// Directory backed by a fixed receiver map
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    sender: String,
    receivers: HashMap<String, String>,
}

impl StaticDirectory {
    /// Creates a directory with the given sender identity
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receivers: HashMap::new(),
        }
    }

    /// Registers a receiver identity for an insurer reference
    pub fn with_receiver(
        mut self,
        insurer_ref: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        self.receivers.insert(insurer_ref.into(), receiver.into());
        self
    }
}

impl EnginePort for StaticDirectory {}

impl ParticipantDirectory for StaticDirectory {
    fn sender(&self) -> String {
        self.sender.clone()
    }

    fn receiver(&self, insurer_ref: &str) -> Option<String> {
        self.receivers.get(insurer_ref).cloned()
    }
}
