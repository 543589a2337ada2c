// ── Core error types ──
//
// Domain errors from lanwatch-core. Callers never see HTTP status codes
// or SQL driver errors directly: `From<lanwatch_api::Error>` and
// `From<sqlx::Error>` translate them into this taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    /// Connection parameters are missing or invalid. Fatal for the
    /// operation, never for the process.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Controller session ───────────────────────────────────────────
    /// Bad credentials or an expired/invalidated session.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Authenticated, but not allowed to perform the mutation.
    #[error("Permission denied: {message}")]
    Permission { message: String },

    /// The controller is throttling us; retry once the backoff elapsed.
    #[error("Rate limited by controller -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Device not found: {mac}")]
    NotFound { mac: String },

    // ── Operations ───────────────────────────────────────────────────
    /// Unclassified remote failure; the message is kept for diagnostics.
    #[error("Operation failed: {message}")]
    Operation { message: String },

    /// Device Store failure. Any open transaction has been rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CoreError {
    /// Returns `true` for errors that should force a fresh login.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if retrying later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Authentication { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lanwatch_api::Error> for CoreError {
    fn from(err: lanwatch_api::Error) -> Self {
        match err {
            lanwatch_api::Error::Authentication { message } => {
                CoreError::Authentication { message }
            }
            lanwatch_api::Error::PermissionDenied { message } => CoreError::Permission { message },
            lanwatch_api::Error::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            lanwatch_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid controller URL: {e}"),
            },
            lanwatch_api::Error::Tls(msg) => CoreError::Configuration {
                message: format!("TLS setup failed: {msg}"),
            },
            lanwatch_api::Error::Transport(e) => CoreError::Operation {
                message: e.to_string(),
            },
            lanwatch_api::Error::Controller { message } => CoreError::Operation { message },
            lanwatch_api::Error::Deserialization { message, body: _ } => CoreError::Operation {
                message: format!("unexpected controller response: {message}"),
            },
        }
    }
}
