use thiserror::Error;

/// Top-level error type for the `lanwatch-api` crate.
///
/// Keeps the controller's HTTP status semantics visible (401 / 403 / 429)
/// so `lanwatch-core` can translate them into its domain taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or the session cookie is no longer accepted (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Authenticated, but the account lacks the privilege (HTTP 403).
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // ── Throttling ──────────────────────────────────────────────────
    /// The controller asked us to slow down (HTTP 429).
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller ──────────────────────────────────────────────────
    /// Error reported by the controller (non-`ok` envelope or unexpected status).
    #[error("Controller error: {message}")]
    Controller { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session should be dropped and re-established.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }
}
