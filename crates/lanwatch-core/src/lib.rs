//! Device reconciliation and rate-limited controller access for lanwatch.
//!
//! This crate owns everything between the raw controller client in
//! `lanwatch-api` and the daemon:
//!
//! - **[`Gateway`]**: Typed controller operations (fetch clients, fetch
//!   blocked clients, block, unblock). Every call goes through the
//!   [`SessionManager`] for authentication and the shared [`RateLimiter`]
//!   for dispatch spacing. An incomplete configuration yields a gateway
//!   that is "not configured" rather than an error at startup.
//!
//! - **[`RateLimiter`]**: Process-wide FIFO spacing of outgoing requests
//!   plus exponential backoff after throttling responses. Injected as an
//!   `Arc`, never global.
//!
//! - **[`DeviceStore`]**: SQLite persistence of known devices and their
//!   acknowledgment state, keyed by hardware address.
//!
//! - **[`Reconciler`]**: Diffs an observation against the store, classifies
//!   unseen addresses through a [`Classifier`] and hands inserted records to
//!   a [`Notifier`].
//!
//! - **[`BatchExecutor`]**: Sequential block/unblock over many addresses
//!   with per-item outcomes.

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod notify;
pub mod rate_limit;
pub mod reconcile;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use batch::{BatchCommand, BatchExecutor, DEFAULT_BATCH_DELAY};
pub use classify::{Classifier, HeuristicClassifier};
pub use config::{ConnectionTarget, ControllerConfig, RateLimitConfig, TlsVerification};
pub use error::CoreError;
pub use gateway::Gateway;
pub use notify::{LogNotifier, Notifier};
pub use rate_limit::RateLimiter;
pub use reconcile::{ReconcileReport, Reconciler};
pub use session::SessionManager;
pub use store::DeviceStore;

pub use model::{
    BatchReport, CommandOutcome, DeviceAttributes, DeviceKind, DeviceRecord, DeviceStats,
    MacAddress, NewDevice, RawClient, Sighting,
};

// The controller platform is part of the configuration surface.
pub use lanwatch_api::ControllerPlatform;
