// ── Batch command executor ──
//
// Applies one command to many clients strictly in order, pausing between
// items so the controller never sees a burst. Per-item failures are
// captured, never propagated.

use std::time::Duration;

use strum::Display;
use tracing::{info, warn};

use crate::gateway::Gateway;
use crate::model::{BatchReport, CommandOutcome, MacAddress};

pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(300);

/// The command a batch applies to every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BatchCommand {
    Block,
    Unblock,
}

#[derive(Clone)]
pub struct BatchExecutor {
    gateway: Gateway,
    delay: Duration,
}

impl BatchExecutor {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Override the pause between consecutive items.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn block_many(&self, macs: &[MacAddress]) -> BatchReport {
        self.run(BatchCommand::Block, macs).await
    }

    pub async fn unblock_many(&self, macs: &[MacAddress]) -> BatchReport {
        self.run(BatchCommand::Unblock, macs).await
    }

    /// Apply `command` to each address in order, one report entry per item.
    pub async fn run(&self, command: BatchCommand, macs: &[MacAddress]) -> BatchReport {
        let mut outcomes = Vec::with_capacity(macs.len());

        for (index, mac) in macs.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.delay).await;
            }

            let result = match command {
                BatchCommand::Block => self.gateway.block(mac).await,
                BatchCommand::Unblock => self.gateway.unblock(mac).await,
            };

            let outcome = match result {
                Ok(()) => CommandOutcome::succeeded(mac.clone()),
                Err(e) => {
                    warn!(%command, %mac, error = %e, "batch item failed");
                    CommandOutcome::failed(mac.clone(), e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport { outcomes };
        info!(
            %command,
            total = macs.len(),
            succeeded = report.success_count(),
            failed = report.failure_count(),
            "batch finished"
        );
        report
    }
}
