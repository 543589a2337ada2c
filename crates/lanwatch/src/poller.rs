// ── Background poll loop ──
//
// One pass per tick: fetch → reconcile → notify → refresh sightings. A
// failed pass is logged and the loop carries on; only cancellation ends it.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use lanwatch_core::{CoreError, Gateway, ReconcileReport, Reconciler};

pub struct Poller {
    gateway: Gateway,
    reconciler: Reconciler,
    interval: Duration,
}

impl Poller {
    pub fn new(gateway: Gateway, reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            gateway,
            reconciler,
            interval,
        }
    }

    /// Run until `cancel` fires, then log out of the controller.
    /// Returns the number of completed passes.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut passes = 0;

        info!(interval_secs = self.interval.as_secs(), "poller started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // A pass in flight is finished before cancellation is seen.
                    let _ = self.poll_once().await;
                    passes += 1;
                }
            }
        }

        self.gateway.logout().await;
        info!(passes, "poller stopped");
        passes
    }

    /// One pass. Errors are logged here and returned for callers that
    /// want them (`lanwatch poll`).
    pub async fn poll_once(&self) -> Result<ReconcileReport, CoreError> {
        match self.reconciler.poll(&self.gateway).await {
            Ok(report) => {
                debug!(
                    observed = report.observed,
                    inserted = report.inserted,
                    refreshed = report.refreshed,
                    "poll pass finished"
                );
                Ok(report)
            }
            Err(e @ CoreError::Storage(_)) => {
                error!(error = %e, "poll pass failed: device store unavailable");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "poll pass failed");
                Err(e)
            }
        }
    }
}
