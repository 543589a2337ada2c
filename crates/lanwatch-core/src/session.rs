// ── Controller session lifecycle ──
//
// The session flag and last-login instant live here and nowhere else.
// Gateway calls that see a 401 call `invalidate()`; the next caller to
// `ensure_authenticated()` logs in again. The state lock is held across
// the login request so concurrent callers share a single re-login.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use lanwatch_api::ControllerClient;

use crate::config::ConnectionTarget;
use crate::error::CoreError;
use crate::rate_limit::RateLimiter;

#[derive(Debug, Default)]
struct SessionState {
    logged_in: bool,
    last_login: Option<Instant>,
}

impl SessionState {
    fn is_valid(&self, validity: Duration) -> bool {
        self.logged_in
            && self
                .last_login
                .is_some_and(|at| at.elapsed() < validity)
    }
}

/// Owns the authenticated session with the controller.
pub struct SessionManager {
    client: Arc<ControllerClient>,
    username: String,
    password: SecretString,
    validity: Duration,
    limiter: Arc<RateLimiter>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(
        client: Arc<ControllerClient>,
        target: &ConnectionTarget,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            username: target.username.clone(),
            password: target.password.clone(),
            validity: target.session_validity,
            limiter,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn client(&self) -> &Arc<ControllerClient> {
        &self.client
    }

    /// Make sure a valid session exists, logging in if it is missing,
    /// invalidated, or older than the validity window.
    pub async fn ensure_authenticated(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if state.is_valid(self.validity) {
            return Ok(());
        }
        if state.logged_in {
            debug!("session older than validity window, re-authenticating");
        }
        self.login_locked(&mut state).await
    }

    /// Perform a fresh login regardless of the cached state.
    pub async fn login(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        self.login_locked(&mut state).await
    }

    async fn login_locked(&self, state: &mut SessionState) -> Result<(), CoreError> {
        state.logged_in = false;
        self.limiter.acquire().await;

        match self.client.login(&self.username, &self.password).await {
            Ok(()) => {
                self.limiter.record_success();
                state.logged_in = true;
                state.last_login = Some(Instant::now());
                info!(user = %self.username, site = self.client.site(), "controller login succeeded");
                Ok(())
            }
            Err(lanwatch_api::Error::RateLimited { retry_after_secs }) => {
                let delay = self
                    .limiter
                    .throttled(Some(Duration::from_secs(retry_after_secs)))
                    .await;
                tokio::time::sleep(delay).await;
                Err(CoreError::RateLimited { retry_after_secs })
            }
            Err(e) => {
                warn!(error = %e, "controller login failed");
                Err(e.into())
            }
        }
    }

    /// Drop the cached session so the next call re-authenticates.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if state.logged_in {
            debug!("session invalidated");
        }
        state.logged_in = false;
    }

    /// Whether a call made right now would reuse the cached session.
    pub async fn is_valid(&self) -> bool {
        self.state.lock().await.is_valid(self.validity)
    }

    /// End the remote session (best-effort) and forget it locally.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        if !state.logged_in {
            return;
        }
        state.logged_in = false;
        self.limiter.acquire().await;
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
    }
}
