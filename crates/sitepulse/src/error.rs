//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use sitepulse_config::ConfigError;
use sitepulse_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const UPSTREAM: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(sitepulse::connection_failed),
        help(
            "Check network access to the API gateway.\n\
             Behind a TLS-intercepting proxy, set api.ca_cert in the config."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(sitepulse::timeout),
        help("Increase the timeout with --timeout or api.timeout in the config.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sitepulse::auth_failed),
        help(
            "Verify the client id, secret and tenant service group id.\n\
             Run: sitepulse config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No {what} configured")]
    #[diagnostic(
        code(sitepulse::no_credentials),
        help(
            "Configure the service account with: sitepulse config init\n\
             Or pass --client-id, --secret and --tsg-id \
             (SITEPULSE_CLIENT_ID, SITEPULSE_SECRET, SITEPULSE_TSG_ID)."
        )
    )]
    NoCredentials { what: String },

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Upstream returned HTTP {status} for {endpoint}")]
    #[diagnostic(code(sitepulse::upstream))]
    Upstream { status: u16, endpoint: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(sitepulse::invalid_response))]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sitepulse::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(sitepulse::config),
        help("Inspect the file with: sitepulse config show")
    )]
    Config { message: String },

    // ── Output ───────────────────────────────────────────────────────
    #[error("Failed to write CSV: {0}")]
    #[diagnostic(code(sitepulse::csv))]
    Csv(#[from] csv::Error),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(sitepulse::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Upstream { .. } | Self::InvalidResponse { .. } => exit_code::UPSTREAM,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Upstream { status, endpoint } => CliError::Upstream { status, endpoint },
            CoreError::InvalidResponse { message } => CliError::InvalidResponse { message },
            CoreError::Reduce(e) => CliError::InvalidResponse {
                message: e.to_string(),
            },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { what } => CliError::NoCredentials { what },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
