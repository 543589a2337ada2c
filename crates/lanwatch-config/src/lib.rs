//! Configuration for the lanwatch daemon.
//!
//! Layered with figment: built-in defaults, then a TOML file (platform
//! config dir or an explicit path), then `LANWATCH_*` environment
//! variables. Translation into `lanwatch_core` types never fails on
//! missing credentials; the gateway decides whether it is configured.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lanwatch_core::{ControllerConfig, ControllerPlatform, RateLimitConfig, TlsVerification};

pub const ENV_PREFIX: &str = "LANWATCH_";

/// Keys read from the environment verbatim. Figment's env provider would
/// parse `LANWATCH_PASSWORD=0123` as the integer 123.
const TEXT_KEYS: &[&str] = &["host", "username", "password", "site"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Everything the daemon reads from file and environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Controller hostname or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Controller port. Platform default when unset (8443 classic).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Plaintext password (prefer `LANWATCH_PASSWORD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_site")]
    pub site: String,

    #[serde(default)]
    pub platform: ControllerPlatform,

    /// Accept self-signed controller certificates.
    #[serde(default = "default_true")]
    pub insecure: bool,

    /// Path to a custom CA certificate. Takes precedence over `insecure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// SQLite database location. Platform data dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// Seconds between polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Seconds a login is trusted before re-authenticating.
    #[serde(default = "default_session_validity")]
    pub session_validity: u64,

    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            username: None,
            password: None,
            site: default_site(),
            platform: ControllerPlatform::default(),
            insecure: true,
            ca_cert: None,
            timeout: default_timeout(),
            db_path: None,
            poll_interval: default_poll_interval(),
            session_validity: default_session_validity(),
            min_request_interval_ms: default_min_request_interval_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

fn default_site() -> String {
    "default".into()
}
fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    60
}
fn default_session_validity() -> u64 {
    300
}
fn default_min_request_interval_ms() -> u64 {
    200
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    5000
}
fn default_batch_delay_ms() -> u64 {
    300
}

impl Config {
    /// Reject values that would make the daemon spin or never time out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timeout", self.timeout),
            ("poll_interval", self.poll_interval),
            ("session_validity", self.session_validity),
            ("initial_backoff_ms", self.initial_backoff_ms),
            ("max_backoff_ms", self.max_backoff_ms),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Validation {
                field: (*field).into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::Validation {
                field: "initial_backoff_ms".into(),
                reason: format!("must not exceed max_backoff_ms ({})", self.max_backoff_ms),
            });
        }
        if self.site.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "site".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Translate into the core connection config. Missing host or
    /// credentials are passed through as `None`.
    pub fn to_controller_config(&self) -> ControllerConfig {
        let tls = if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        };

        ControllerConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone().map(SecretString::from),
            site: self.site.clone(),
            platform: self.platform,
            tls,
            timeout: Duration::from_secs(self.timeout),
            session_validity: Duration::from_secs(self.session_validity),
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            min_interval: Duration::from_millis(self.min_request_interval_ms),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Configured database path, or `devices.db` in the platform data dir.
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "lanwatch", "lanwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default SQLite location via XDG / platform conventions.
pub fn default_db_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share").join("devices.db"),
        |dirs| dirs.data_dir().join("devices.db"),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("lanwatch");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load configuration from defaults, TOML and environment.
///
/// With `explicit` the file must exist; otherwise the platform config file
/// is used when present and silently skipped when not.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };

    let config: Config = figment(&path).extract()?;
    config.validate()?;
    Ok(config)
}

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(TEXT_KEYS))
        .merge(Serialized::defaults(text_env()))
}

fn text_env() -> BTreeMap<String, String> {
    Env::prefixed(ENV_PREFIX)
        .only(TEXT_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
        .collect()
}
