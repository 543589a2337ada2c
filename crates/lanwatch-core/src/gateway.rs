// ── Controller gateway ──
//
// Typed controller operations built on the session manager and the shared
// rate limiter. Every call authenticates first, then waits for a dispatch
// slot, then translates failures into `CoreError` and applies their side
// effects (401 invalidates the session, 429 backs off).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use lanwatch_api::ControllerClient;

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::model::{MacAddress, RawClient};
use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;

/// Entry point for everything that talks to the controller.
///
/// Cheaply cloneable. A gateway built from an incomplete configuration is
/// permanently "not configured": every operation fails fast with
/// [`CoreError::Configuration`] and nothing is sent over the network.
#[derive(Clone)]
pub struct Gateway {
    inner: Result<Arc<GatewayInner>, Arc<str>>,
    limiter: Arc<RateLimiter>,
}

struct GatewayInner {
    session: SessionManager,
}

impl Gateway {
    /// Build a gateway. Validation failures are logged once and leave the
    /// gateway in the "not configured" state instead of failing.
    pub fn new(config: &ControllerConfig, limiter: Arc<RateLimiter>) -> Self {
        let inner = config
            .validate()
            .and_then(|target| {
                let client = ControllerClient::new(
                    target.base_url.clone(),
                    target.site.clone(),
                    target.platform,
                    &target.transport,
                )?;
                let session = SessionManager::new(Arc::new(client), &target, Arc::clone(&limiter));
                Ok(Arc::new(GatewayInner { session }))
            })
            .map_err(|e| {
                warn!(error = %e, "controller gateway not configured");
                match e {
                    CoreError::Configuration { message } => Arc::<str>::from(message),
                    other => Arc::<str>::from(other.to_string()),
                }
            });

        Self { inner, limiter }
    }

    /// Build a gateway around an existing client (tests, custom transports).
    pub fn with_client(
        client: ControllerClient,
        config: &ControllerConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, CoreError> {
        let target = config.validate()?;
        let session = SessionManager::new(Arc::new(client), &target, Arc::clone(&limiter));
        Ok(Self {
            inner: Ok(Arc::new(GatewayInner { session })),
            limiter,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_ok()
    }

    /// The session manager, when configured.
    pub fn session(&self) -> Option<&SessionManager> {
        self.inner.as_ref().ok().map(|inner| &inner.session)
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Currently connected clients, in controller order. Empty when none.
    pub async fn fetch_clients(&self) -> Result<Vec<RawClient>, CoreError> {
        let clients = self
            .call("fetch_clients", ControllerClient::list_clients)
            .await?;
        debug!(count = clients.len(), "fetched online clients");
        Ok(clients)
    }

    /// Hardware addresses currently blocked at the controller.
    ///
    /// Best-effort: any remote failure is logged and yields an empty list.
    /// Only a missing configuration is reported as an error.
    pub async fn fetch_blocked_clients(&self) -> Result<Vec<MacAddress>, CoreError> {
        match self
            .call("fetch_blocked_clients", ControllerClient::list_blocked_clients)
            .await
        {
            Ok(macs) => Ok(macs.into_iter().map(MacAddress::new).collect()),
            Err(e @ CoreError::Configuration { .. }) => Err(e),
            Err(e) => {
                warn!(error = %e, "blocked client query failed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Block a client. Succeeds only if the controller confirms it.
    pub async fn block(&self, mac: &MacAddress) -> Result<(), CoreError> {
        let mac_str = mac.as_str();
        let confirmation = self
            .call("block", |client| client.block_client(mac_str))
            .await?;
        require_confirmation("block", mac, &confirmation)?;
        info!(%mac, "client blocked");
        Ok(())
    }

    /// Unblock a client. Succeeds only if the controller confirms it.
    pub async fn unblock(&self, mac: &MacAddress) -> Result<(), CoreError> {
        let mac_str = mac.as_str();
        let confirmation = self
            .call("unblock", |client| client.unblock_client(mac_str))
            .await?;
        require_confirmation("unblock", mac, &confirmation)?;
        info!(%mac, "client unblocked");
        Ok(())
    }

    /// End the controller session, if one is open.
    pub async fn logout(&self) {
        if let Ok(inner) = &self.inner {
            inner.session.logout().await;
        }
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    fn require_configured(&self) -> Result<&GatewayInner, CoreError> {
        self.inner
            .as_deref()
            .map_err(|reason| CoreError::Configuration {
                message: reason.to_string(),
            })
    }

    async fn call<'a, T, F, Fut>(&'a self, operation: &'static str, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&'a ControllerClient) -> Fut,
        Fut: Future<Output = Result<T, lanwatch_api::Error>>,
    {
        let inner = self.require_configured()?;
        inner.session.ensure_authenticated().await?;
        self.limiter.acquire().await;

        match f(inner.session.client().as_ref()).await {
            Ok(value) => {
                self.limiter.record_success();
                Ok(value)
            }
            Err(e) => Err(self.handle_failure(inner, operation, e).await),
        }
    }

    async fn handle_failure(
        &self,
        inner: &GatewayInner,
        operation: &'static str,
        err: lanwatch_api::Error,
    ) -> CoreError {
        let transient = err.is_transient();
        let err = CoreError::from(err);
        match &err {
            CoreError::Authentication { .. } => {
                warn!(operation, "controller rejected session, forcing re-login");
                inner.session.invalidate().await;
            }
            CoreError::RateLimited { retry_after_secs } => {
                let delay = self
                    .limiter
                    .throttled(Some(Duration::from_secs(*retry_after_secs)))
                    .await;
                tokio::time::sleep(delay).await;
            }
            _ => debug!(operation, transient, error = %err, "controller call failed"),
        }
        err
    }
}

/// An empty confirmation means the controller did not apply the command.
fn require_confirmation(
    command: &str,
    mac: &MacAddress,
    confirmation: &[serde_json::Value],
) -> Result<(), CoreError> {
    if confirmation.is_empty() {
        return Err(CoreError::Operation {
            message: format!("controller returned no confirmation for {command} of {mac}"),
        });
    }
    Ok(())
}
