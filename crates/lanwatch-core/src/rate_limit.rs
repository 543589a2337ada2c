// ── Process-wide request pacing ──
//
// One `RateLimiter` is built at startup and shared by reference (`Arc`)
// with every gateway and session manager in the process. Callers reserve
// dispatch slots under a fair (FIFO) lock, then sleep outside the lock
// until their slot comes up, so a waiting caller never holds up callers
// that only need to compute their own slot.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;

/// Global minimum-spacing limiter with exponential backoff on throttling.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Earliest instant the next request may be dispatched.
    next_slot: Mutex<Instant>,
    /// Current backoff step; `None` when the controller is not throttling us.
    backoff: std::sync::Mutex<Option<Duration>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            next_slot: Mutex::new(Instant::now()),
            backoff: std::sync::Mutex::new(None),
        }
    }

    /// Convenience constructor for the usual shared handle.
    pub fn shared(config: RateLimitConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait for the next dispatch slot and return the instant it was granted.
    ///
    /// The slot is reserved before the caller starts waiting, so two callers
    /// can never be handed the same slot, and slots are handed out in lock
    /// acquisition order.
    pub async fn acquire(&self) -> Instant {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.config.min_interval;
            slot
        };

        if slot > Instant::now() {
            debug!(
                wait_ms = u64::try_from((slot - Instant::now()).as_millis()).unwrap_or(u64::MAX),
                "rate limiter: waiting for dispatch slot"
            );
            tokio::time::sleep_until(slot).await;
        }
        slot
    }

    /// Record a throttling response and escalate the backoff.
    ///
    /// Doubles the previous step (starting at `initial_backoff`), honours a
    /// larger `retry_after` hint, caps at `max_backoff`, and pushes the next
    /// dispatch slot out by the result. Returns the delay the caller should
    /// wait before surfacing the throttling error.
    pub async fn throttled(&self, retry_after: Option<Duration>) -> Duration {
        let step = {
            let mut backoff = self.backoff.lock().unwrap_or_else(PoisonError::into_inner);
            let step = backoff
                .map_or(self.config.initial_backoff, |prev| prev.saturating_mul(2))
                .min(self.config.max_backoff);
            *backoff = Some(step);
            step
        };
        let delay = retry_after.map_or(step, |hint| hint.max(step)).min(self.config.max_backoff);

        {
            let mut next = self.next_slot.lock().await;
            let earliest = Instant::now() + delay;
            if *next < earliest {
                *next = earliest;
            }
        }

        warn!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "controller throttled request, backing off"
        );
        delay
    }

    /// Reset the backoff after a request went through.
    pub fn record_success(&self) {
        let mut backoff = self.backoff.lock().unwrap_or_else(PoisonError::into_inner);
        if backoff.take().is_some() {
            debug!("rate limiter: backoff reset");
        }
    }

    /// The backoff step currently in force, if any.
    pub fn current_backoff(&self) -> Option<Duration> {
        *self.backoff.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
