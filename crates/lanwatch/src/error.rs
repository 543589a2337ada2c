//! Daemon error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use lanwatch_config::ConfigError;
use lanwatch_core::{BatchCommand, CoreError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const RATE_LIMITED: i32 = 6;
    pub const STORAGE: i32 = 7;
    pub const PARTIAL: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum DaemonError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(lanwatch::config),
        help("Check the config file (--config) and LANWATCH_* environment variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Controller is not configured: {message}")]
    #[diagnostic(
        code(lanwatch::not_configured),
        help("Set host, username and password (or LANWATCH_HOST, LANWATCH_USERNAME, LANWATCH_PASSWORD).")
    )]
    NotConfigured { message: String },

    // ── Controller ───────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(lanwatch::auth_failed),
        help("Verify the controller username and password.")
    )]
    AuthFailed { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(lanwatch::permission),
        help("The controller account needs admin rights on this site.")
    )]
    Permission { message: String },

    #[error("Controller is throttling requests (retry after {retry_after_secs}s)")]
    #[diagnostic(
        code(lanwatch::rate_limited),
        help("Wait a moment, or raise min_request_interval_ms.")
    )]
    RateLimited { retry_after_secs: u64 },

    #[error("Controller operation failed: {message}")]
    #[diagnostic(code(lanwatch::operation))]
    Operation { message: String },

    // ── Store ────────────────────────────────────────────────────────
    #[error("Device '{mac}' is not recorded")]
    #[diagnostic(
        code(lanwatch::not_found),
        help("Run: lanwatch devices --all to see recorded devices")
    )]
    NotFound { mac: String },

    #[error("Device store error: {message}")]
    #[diagnostic(
        code(lanwatch::storage),
        help("Check that db_path is writable and not locked by another process.")
    )]
    Storage { message: String },

    // ── Batches ──────────────────────────────────────────────────────
    #[error("{failed} of {total} {command} requests failed")]
    #[diagnostic(code(lanwatch::partial_failure))]
    PartialFailure {
        command: BatchCommand,
        failed: usize,
        total: usize,
    },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(lanwatch::json))]
    Json(#[from] serde_json::Error),
}

impl DaemonError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::NotConfigured { .. } => exit_code::USAGE,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Permission { .. } => exit_code::PERMISSION,
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::Storage { .. } => exit_code::STORAGE,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            Self::Operation { .. } | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → DaemonError mapping ──────────────────────────────────

impl From<CoreError> for DaemonError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration { message } => Self::NotConfigured { message },
            CoreError::Authentication { message } => Self::AuthFailed { message },
            CoreError::Permission { message } => Self::Permission { message },
            CoreError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            CoreError::NotFound { mac } => Self::NotFound { mac },
            CoreError::Operation { message } => Self::Operation { message },
            CoreError::Storage(e) => Self::Storage {
                message: e.to_string(),
            },
        }
    }
}
