// Controller authentication
//
// Cookie-based session login/logout. The login endpoint sets a session
// cookie in the client's jar; subsequent requests use it automatically.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::{ControllerClient, preview, status_error};
use crate::error::Error;

/// The platform type of the UniFi controller.
///
/// Determines URL prefixes and login paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerPlatform {
    /// Standalone Network Application (Java) -- port 8443, no prefix.
    #[default]
    Classic,
    /// UniFi OS device (UDM, UCG, etc.) -- port 443, `/proxy/network/` prefix.
    UnifiOs,
}

impl ControllerPlatform {
    /// The path prefix for site-scoped API endpoints.
    pub fn api_prefix(self) -> &'static str {
        match self {
            Self::Classic => "",
            Self::UnifiOs => "/proxy/network",
        }
    }

    /// The login endpoint path.
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Classic => "/api/login",
            Self::UnifiOs => "/api/auth/login",
        }
    }

    /// The logout endpoint path.
    pub fn logout_path(self) -> &'static str {
        match self {
            Self::Classic => "/api/logout",
            Self::UnifiOs => "/api/auth/logout",
        }
    }
}

impl ControllerClient {
    /// Authenticate with the controller using username/password.
    ///
    /// On success the session cookie is stored in the client's cookie jar.
    /// A 429 surfaces as [`Error::RateLimited`]; any other non-success
    /// status means the credentials were rejected.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.base_url().join(self.platform().login_path())?;

        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(status_error(status, resp.headers()).unwrap_or(Error::RateLimited {
                retry_after_secs: 1,
            }));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = format!("login failed (HTTP {status}): {}", preview(&body));
            return Err(if is_credential_rejection(status, &body) {
                Error::Authentication { message }
            } else {
                Error::Controller { message }
            });
        }

        // UniFi OS requires this token on every mutating request.
        if let Some(token) = resp
            .headers()
            .get("X-CSRF-Token")
            .or_else(|| resp.headers().get("x-csrf-token"))
            .and_then(|v| v.to_str().ok())
        {
            self.set_csrf_token(token.to_owned());
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.base_url().join(self.platform().logout_path())?;

        debug!("logging out at {}", url);

        let _resp = self
            .http()
            .post(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        self.clear_csrf_token();
        debug!("logout complete");
        Ok(())
    }
}

/// Bad credentials come back as 400/401/403 or carry `api.err.Invalid`;
/// anything else is the controller failing, not the login.
fn is_credential_rejection(status: StatusCode, body: &str) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    ) || body.contains("api.err.Invalid")
}
