// Controller HTTP client
//
// Wraps `reqwest::Client` with UniFi-specific URL construction, envelope
// unwrapping, and platform-aware path prefixing. Endpoint groups (auth,
// stations) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::ControllerPlatform;
use crate::error::Error;
use crate::models::ApiResponse;
use crate::transport::TransportConfig;

/// Retry hint used when a 429 arrives without a parseable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// UniFi OS wraps some errors as `{"error":{"code":N,"message":"..."}}` with HTTP 200.
#[derive(serde::Deserialize)]
struct UnifiOsError {
    error: Option<UnifiOsErrorInner>,
}

#[derive(serde::Deserialize)]
struct UnifiOsErrorInner {
    code: u16,
    message: Option<String>,
}

/// Raw HTTP client for the controller API.
///
/// Handles the `{ data: [], meta: { rc, msg } }` envelope, site-scoped
/// URL construction, and platform-aware path prefixing. All methods return
/// unwrapped `data` payloads -- the envelope is stripped before the caller
/// sees it.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    site: String,
    platform: ControllerPlatform,
    /// CSRF token for UniFi OS. Required on every POST through the
    /// `/proxy/network/` path. Captured at login and rotated via
    /// `X-Updated-CSRF-Token`.
    csrf_token: RwLock<Option<String>>,
}

impl ControllerClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// A cookie jar is added if the config doesn't carry one; session auth
    /// depends on it. `base_url` is the controller root, e.g.
    /// `https://192.168.1.1` (UniFi OS) or `https://controller:8443`.
    pub fn new(
        base_url: Url,
        site: String,
        platform: ControllerPlatform,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, site, platform))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        site: String,
        platform: ControllerPlatform,
    ) -> Self {
        Self {
            http,
            base_url,
            site,
            platform,
            csrf_token: RwLock::new(None),
        }
    }

    /// The current site identifier.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The controller platform.
    pub fn platform(&self) -> ControllerPlatform {
        self.platform
    }

    // ── CSRF token management ─────────────────────────────────────────

    /// Store a CSRF token (captured from login response headers).
    pub(crate) fn set_csrf_token(&self, token: String) {
        debug!("storing CSRF token");
        *self
            .csrf_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Forget the CSRF token (logout or session reset).
    pub(crate) fn clear_csrf_token(&self) {
        *self
            .csrf_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Update CSRF token if the response contains a rotated value.
    fn update_csrf_from_response(&self, headers: &HeaderMap) {
        let new_token = headers
            .get("X-Updated-CSRF-Token")
            .or_else(|| headers.get("x-csrf-token"))
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if let Some(token) = new_token {
            trace!("CSRF token rotated");
            *self
                .csrf_token
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(token);
        }
    }

    /// Apply the stored CSRF token to a request builder.
    fn apply_csrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self
            .csrf_token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(token) => builder.header("X-CSRF-Token", token),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a site-scoped URL: `{base}{prefix}/api/s/{site}/{path}`.
    pub(crate) fn site_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let prefix = self.platform.api_prefix().trim_end_matches('/');
        let full = format!("{base}{prefix}/api/s/{}/{path}", self.site);
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        self.parse_envelope(resp).await
    }

    /// Send a POST request with JSON body and unwrap the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<T>, Error> {
        debug!("POST {}", url);

        let builder = self.apply_csrf(self.http.post(url).json(body));
        let resp = builder.send().await.map_err(Error::Transport)?;

        self.parse_envelope(resp).await
    }

    /// Parse the `{ meta, data }` envelope, returning `data` on success.
    ///
    /// HTTP 401 / 403 / 429 map onto `Authentication`, `PermissionDenied`
    /// and `RateLimited`. UniFi OS error bodies returned with HTTP 200
    /// (`{"error": {"code": 403, ...}}`) get the same treatment.
    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Vec<T>, Error> {
        let status = resp.status();

        // Capture any CSRF token rotation before consuming the response.
        self.update_csrf_from_response(resp.headers());

        if let Some(err) = status_error(status, resp.headers()) {
            return Err(err);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Controller {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if let Ok(wrapper) = serde_json::from_str::<UnifiOsError>(&body) {
            if let Some(err) = wrapper.error {
                let message = err.message.unwrap_or_default();
                return Err(match err.code {
                    401 => Error::Authentication { message },
                    403 => Error::PermissionDenied { message },
                    429 => Error::RateLimited {
                        retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
                    },
                    code => Error::Controller {
                        message: format!("UniFi OS error {code}: {message}"),
                    },
                });
            }
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        if envelope.meta.rc == "ok" {
            return Ok(envelope.data);
        }

        let message = envelope
            .meta
            .msg
            .unwrap_or_else(|| format!("rc={}", envelope.meta.rc));
        Err(classify_envelope_error(message))
    }
}

/// Map the status codes the controller uses for session, privilege and
/// throttling failures. `None` for everything else.
pub(crate) fn status_error(status: StatusCode, headers: &HeaderMap) -> Option<Error> {
    match status {
        StatusCode::UNAUTHORIZED => Some(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        }),
        StatusCode::FORBIDDEN => Some(Error::PermissionDenied {
            message: "insufficient permissions (HTTP 403)".into(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Some(Error::RateLimited {
            retry_after_secs: retry_after_secs(headers),
        }),
        _ => None,
    }
}

fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Classic controllers report session and privilege failures inside an
/// `rc: "error"` envelope rather than through the status code.
fn classify_envelope_error(message: String) -> Error {
    match message.as_str() {
        "api.err.LoginRequired" => Error::Authentication { message },
        "api.err.NoPermission" => Error::PermissionDenied { message },
        _ => Error::Controller { message },
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
