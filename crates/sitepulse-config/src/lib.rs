//! Persistent configuration for sitepulse.
//!
//! One TOML file holds UI defaults, last-used directories, the service
//! account identity, API endpoints and the report settings (metrics,
//! interface rule table, retry schedule). Secrets are resolved from an env
//! var, the system keyring, or plaintext, in that order. The CLI layers
//! its flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use sitepulse_core::{
    ApiConfig, DEFAULT_AUTH_URL, DEFAULT_BASE_URL, InterfaceFilter, MetricSpec, ReportConfig,
    RetryPolicy, TlsMode, filter::DEFAULT_INTERFACE_PATTERN,
};

/// Keyring service name for remembered secrets.
pub const KEYRING_SERVICE: &str = "sitepulse";

/// Longest report window accepted by the monitoring API.
pub const MAX_DURATION_DAYS: u32 = 90;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured")]
    NoCredentials { what: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub report: ReportSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            ui: UiConfig::default(),
            paths: PathsConfig::default(),
            auth: AuthConfig::default(),
            api: ApiSection::default(),
            report: ReportSection::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UiConfig {
    /// Keep the service account between runs.
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub defaults: TaskDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskDefaults {
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
    #[serde(default)]
    pub generate_plots: bool,
    /// Also write logs to a file in the config directory.
    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            duration_days: default_duration_days(),
            generate_plots: false,
            debug_mode: false,
        }
    }
}

fn default_duration_days() -> u32 {
    MAX_DURATION_DAYS
}

/// Directories remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathsConfig {
    pub last_open_dir: Option<PathBuf>,
    pub last_export_dir: Option<PathBuf>,
    pub last_import_dir: Option<PathBuf>,
    pub last_import_file: Option<PathBuf>,
}

/// Service account identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// OAuth client id (service account name).
    pub username: Option<String>,
    /// Tenant service group id.
    pub tsg_id: Option<String>,
    /// Client secret (plaintext; prefer keyring or env var).
    pub secret: Option<String>,
    /// Environment variable holding the client secret.
    pub secret_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// `X-PANW-Region` header value for monitoring queries.
    #[serde(default = "default_region")]
    pub region: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Extra CA certificate (PEM), for TLS-intercepting proxies.
    pub ca_cert: Option<PathBuf>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_url: default_auth_url(),
            region: default_region(),
            timeout: default_timeout(),
            ca_cert: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.into()
}
#[allow(clippy::unnecessary_wraps)]
fn default_region() -> Option<String> {
    Some("sg".into())
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportSection {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Interface-name pattern for sites no rule matches.
    #[serde(default = "default_interface")]
    pub default_interface: String,
    #[serde(default = "default_true")]
    pub resolve_addresses: bool,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricEntry>,
    /// Ordered site-name → interface-name patterns; first match wins.
    #[serde(default = "default_interface_rules")]
    pub interface_rules: Vec<InterfaceRuleEntry>,
    #[serde(default)]
    pub retry: RetrySection,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            interval: default_interval(),
            default_interface: default_interface(),
            resolve_addresses: true,
            metrics: default_metrics(),
            interface_rules: default_interface_rules(),
            retry: RetrySection::default(),
        }
    }
}

fn default_workers() -> usize {
    4
}
fn default_interval() -> String {
    "1day".into()
}
fn default_interface() -> String {
    DEFAULT_INTERFACE_PATTERN.into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricEntry {
    pub name: String,
    pub unit: String,
    #[serde(default = "default_statistics")]
    pub statistics: Vec<String>,
}

fn default_statistics() -> Vec<String> {
    vec!["average".into()]
}

fn default_metrics() -> Vec<MetricEntry> {
    sitepulse_core::config::default_metrics()
        .into_iter()
        .map(|m| MetricEntry {
            name: m.name,
            unit: m.unit,
            statistics: m.statistics,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InterfaceRuleEntry {
    /// Regex matched against the site name.
    pub site: String,
    /// Regex matched against interface names.
    pub interfaces: String,
}

fn default_interface_rules() -> Vec<InterfaceRuleEntry> {
    InterfaceFilter::default()
        .rules()
        .iter()
        .map(|r| InterfaceRuleEntry {
            site: r.site_pattern().into(),
            interfaces: r.interface_pattern().into(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    7
}
fn default_min_delay() -> u64 {
    5
}
fn default_max_delay() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Directory holding the config file (and debug logs).
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("io", "sitepulse", "sitepulse").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("sitepulse");
            p
        },
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path`, layered over defaults and under `SITEPULSE_*` env vars.
///
/// Nested keys use a double underscore: `SITEPULSE_API__BASE_URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SITEPULSE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when unreadable.
pub fn load_config_or_default(path: &Path) -> Config {
    load_config_from(path).unwrap_or_else(|e| {
        debug!(error = %e, "using default config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize to TOML and replace `path` atomically (temp file + rename).
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, toml_str)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(username: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, &format!("{username}/secret"))?)
}

/// Resolve the client secret: env var named by `secret_env`, then the
/// keyring entry for `username`, then plaintext.
pub fn resolve_secret(auth: &AuthConfig) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(ref env_name) = auth.secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(ref username) = auth.username {
        if let Ok(secret) = keyring_entry(username).and_then(|e| Ok(e.get_password()?)) {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref secret) = auth.secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        what: "client secret".into(),
    })
}

/// Store `secret` in the keyring under `username`.
pub fn remember_secret(username: &str, secret: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(username)?.set_password(secret.expose_secret())?;
    Ok(())
}

/// Remove a remembered secret. Missing entries are not an error.
pub fn forget_secret(username: &str) -> Result<(), ConfigError> {
    match keyring_entry(username)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation to pipeline config ──────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL {raw:?}: {e}"),
    })
}

impl Config {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let days = self.ui.defaults.duration_days;
        if !(1..=MAX_DURATION_DAYS).contains(&days) {
            return Err(ConfigError::Validation {
                field: "ui.defaults.duration_days".into(),
                reason: format!("must be between 1 and {MAX_DURATION_DAYS}, got {days}"),
            });
        }
        if self.report.workers == 0 {
            return Err(ConfigError::Validation {
                field: "report.workers".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.report.metrics.is_empty() {
            return Err(ConfigError::Validation {
                field: "report.metrics".into(),
                reason: "at least one metric is required".into(),
            });
        }
        self.interface_filter()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let r = &self.report.retry;
        RetryPolicy {
            max_attempts: r.max_attempts,
            min_delay: Duration::from_secs(r.min_delay_secs),
            max_delay: Duration::from_secs(r.max_delay_secs),
            ..RetryPolicy::default()
        }
    }

    /// Endpoints, timeout and retry schedule.
    pub fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        let mut api = ApiConfig::new(
            parse_url("api.base_url", &self.api.base_url)?,
            parse_url("api.auth_url", &self.api.auth_url)?,
        );
        api.region.clone_from(&self.api.region);
        api.timeout = Duration::from_secs(self.api.timeout);
        api.tls = self
            .api
            .ca_cert
            .clone()
            .map_or(TlsMode::System, TlsMode::CustomCa);
        api.retry = self.retry_policy();
        Ok(api)
    }

    /// The configured rule table, compiled.
    pub fn interface_filter(&self) -> Result<InterfaceFilter, ConfigError> {
        InterfaceFilter::from_patterns(
            self.report
                .interface_rules
                .iter()
                .map(|r| (r.site.as_str(), r.interfaces.as_str())),
            &self.report.default_interface,
        )
        .map_err(|e| ConfigError::Validation {
            field: "report.interface_rules".into(),
            reason: e.to_string(),
        })
    }

    /// Metrics, interval and interface filter for a report run.
    pub fn report_config(&self) -> Result<ReportConfig, ConfigError> {
        Ok(ReportConfig {
            metrics: self
                .report
                .metrics
                .iter()
                .map(|m| MetricSpec {
                    name: m.name.clone(),
                    statistics: m.statistics.clone(),
                    unit: m.unit.clone(),
                })
                .collect(),
            interval: self.report.interval.clone(),
            filter: self.interface_filter()?,
            resolve_addresses: self.report.resolve_addresses,
        })
    }
}
