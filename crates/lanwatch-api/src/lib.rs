//! Async HTTP client for the UniFi controller's station endpoints.
//!
//! Covers the small slice of the legacy JSON API that `lanwatch` needs:
//! cookie-session login/logout, listing online and blocked clients, and the
//! `block-sta` / `unblock-sta` commands. Every response is unwrapped from
//! the `{ meta: { rc, msg }, data: [...] }` envelope and HTTP failures are
//! mapped onto [`Error`] so callers can branch on 401 / 403 / 429.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod stations;
pub mod transport;

pub use auth::ControllerPlatform;
pub use client::ControllerClient;
pub use error::Error;
pub use models::{ApiResponse, StationEntry};
pub use transport::{TlsMode, TransportConfig};
