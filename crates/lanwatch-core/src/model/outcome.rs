// ── Batch command outcomes ──

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// Result of one block/unblock request inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub mac: MacAddress,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn succeeded(mac: MacAddress) -> Self {
        Self {
            mac,
            success: true,
            error: None,
        }
    }

    pub fn failed(mac: MacAddress, error: impl Into<String>) -> Self {
        Self {
            mac,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Full per-device report of a batch run. Partial failure is a normal
/// outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<CommandOutcome>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}
