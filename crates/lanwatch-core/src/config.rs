// ── Runtime connection configuration ──
//
// These types describe *how* to reach the controller and how hard we are
// allowed to hit it. They never touch disk: lanwatch-config builds a
// `ControllerConfig` and hands it in. Required fields are optional here on
// purpose so an incomplete configuration yields a "not configured" gateway
// instead of a startup failure.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lanwatch_api::transport::{TlsMode, TransportConfig};
use lanwatch_api::ControllerPlatform;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs). Default for local controllers.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller site.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Hostname or IP, optionally with a scheme (`https://10.0.0.1`).
    pub host: Option<String>,
    /// Defaults to the platform's port (8443 classic, 443 UniFi OS).
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Site to operate on (defaults to "default").
    pub site: String,
    pub platform: ControllerPlatform,
    pub tls: TlsVerification,
    /// Request timeout, enforced by the HTTP transport.
    pub timeout: Duration,
    /// How long a successful login is trusted before re-authenticating.
    pub session_validity: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            username: None,
            password: None,
            site: "default".into(),
            platform: ControllerPlatform::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            session_validity: Duration::from_secs(300),
        }
    }
}

/// A fully validated controller target.
#[derive(Debug, Clone)]
pub struct ConnectionTarget {
    pub base_url: Url,
    pub site: String,
    pub username: String,
    pub password: SecretString,
    pub platform: ControllerPlatform,
    pub transport: TransportConfig,
    pub session_validity: Duration,
}

impl ControllerConfig {
    /// Check that every required connection parameter is present and
    /// resolve them into a [`ConnectionTarget`].
    pub fn validate(&self) -> Result<ConnectionTarget, CoreError> {
        let host = required(self.host.as_deref(), "host")?;
        let username = required(self.username.as_deref(), "username")?;
        let site = required(Some(self.site.as_str()), "site")?;
        let password = self.password.clone().ok_or_else(|| missing("password"))?;

        let base_url = self.base_url(host)?;

        Ok(ConnectionTarget {
            base_url,
            site: site.to_owned(),
            username: username.to_owned(),
            password,
            platform: self.platform,
            transport: TransportConfig {
                tls: tls_to_transport(&self.tls),
                timeout: self.timeout,
                cookie_jar: None,
            },
            session_validity: self.session_validity,
        })
    }

    fn base_url(&self, host: &str) -> Result<Url, CoreError> {
        let raw = if host.contains("://") {
            host.to_owned()
        } else {
            format!("https://{host}")
        };
        let mut url = Url::parse(&raw).map_err(|e| CoreError::Configuration {
            message: format!("invalid controller host '{host}': {e}"),
        })?;

        let port = self.port.or_else(|| url.port()).unwrap_or(match self.platform {
            ControllerPlatform::Classic => 8443,
            ControllerPlatform::UnifiOs => 443,
        });
        url.set_port(Some(port)).map_err(|()| CoreError::Configuration {
            message: format!("controller host '{host}' cannot carry a port"),
        })?;
        Ok(url)
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, CoreError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> CoreError {
    CoreError::Configuration {
        message: format!("controller {field} is not configured"),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

// ── Request pacing ──────────────────────────────────────────────────

/// Pacing and backoff parameters for the shared [`RateLimiter`](crate::RateLimiter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Minimum spacing between any two dispatched requests.
    pub min_interval: Duration,
    /// First backoff step after a throttling response.
    pub initial_backoff: Duration,
    /// Upper bound for the exponential backoff.
    pub max_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(200),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete() -> ControllerConfig {
        ControllerConfig {
            host: Some("192.168.1.2".into()),
            username: Some("admin".into()),
            password: Some(SecretString::from("hunter2".to_string())),
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn classic_defaults_to_port_8443() {
        let target = complete().validate().unwrap();
        assert_eq!(target.base_url.as_str(), "https://192.168.1.2:8443/");
        assert_eq!(target.site, "default");
    }

    #[test]
    fn explicit_scheme_and_port_are_kept() {
        let config = ControllerConfig {
            host: Some("http://127.0.0.1".into()),
            port: Some(9000),
            ..complete()
        };
        let target = config.validate().unwrap();
        assert_eq!(target.base_url.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn unifi_os_defaults_to_443() {
        let config = ControllerConfig {
            platform: ControllerPlatform::UnifiOs,
            ..complete()
        };
        let target = config.validate().unwrap();
        assert_eq!(target.base_url.port_or_known_default(), Some(443));
    }

    #[test]
    fn missing_fields_are_configuration_errors() {
        for config in [
            ControllerConfig {
                host: None,
                ..complete()
            },
            ControllerConfig {
                username: Some("  ".into()),
                ..complete()
            },
            ControllerConfig {
                password: None,
                ..complete()
            },
            ControllerConfig {
                site: String::new(),
                ..complete()
            },
        ] {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, CoreError::Configuration { .. }), "got {err:?}");
        }
    }
}
