//! CLI-side configuration: picks the config file, layers flag overrides
//! on top of it, and resolves the service-account credentials.
//!
//! `sitepulse-config` owns the file format; this module only decides
//! which file and which flags win.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use sitepulse_config::{AuthConfig, Config};
use sitepulse_core::{ApiConfig, Credentials};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(sitepulse_config::config_path)
}

/// Load the config file in effect, layered over defaults and env.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_file(global);
    debug!(path = %path.display(), "loading config");
    Ok(sitepulse_config::load_config_from(&path)?)
}

/// Whether the config asks for a debug log file. Unreadable configs say no.
pub fn debug_mode(global: &GlobalOpts) -> bool {
    sitepulse_config::load_config_or_default(&config_file(global))
        .ui
        .defaults
        .debug_mode
}

/// Loaded config plus the file it came from.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub path: PathBuf,
}

impl Context {
    /// Load and validate the config in effect.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = config_file(global);
        let config = load(global)?;
        config.validate()?;
        Ok(Self { config, path })
    }

    /// Write the config back to the file it came from.
    pub fn save(&self) -> Result<(), CliError> {
        sitepulse_config::save_config_to(&self.config, &self.path)?;
        Ok(())
    }

    /// Service-account credentials: flags first, then the config file.
    ///
    /// The secret falls back to `auth.secret_env`, the keyring entry of the
    /// resolved client id, then plaintext.
    pub fn credentials(&self, global: &GlobalOpts) -> Result<Credentials, CliError> {
        let auth = &self.config.auth;

        let client_id = global
            .client_id
            .clone()
            .or_else(|| auth.username.clone())
            .ok_or_else(|| CliError::NoCredentials {
                what: "client id".into(),
            })?;

        let tsg_id = global
            .tsg_id
            .clone()
            .or_else(|| auth.tsg_id.clone())
            .ok_or_else(|| CliError::NoCredentials {
                what: "tenant service group id".into(),
            })?;

        let secret = match global.secret {
            Some(ref s) => SecretString::from(s.clone()),
            None => sitepulse_config::resolve_secret(&AuthConfig {
                username: Some(client_id.clone()),
                ..auth.clone()
            })?,
        };

        Ok(Credentials {
            client_id,
            secret,
            tsg_id,
        })
    }

    /// Endpoints and tuning with `--base-url`, `--auth-url` and `--timeout` applied.
    pub fn api_config(&self, global: &GlobalOpts) -> Result<ApiConfig, CliError> {
        let mut api = self.config.api_config()?;
        if let Some(ref raw) = global.base_url {
            api.base_url = parse_url("base-url", raw)?;
        }
        if let Some(ref raw) = global.auth_url {
            api.auth_url = parse_url("auth-url", raw)?;
        }
        if let Some(secs) = global.timeout {
            api.timeout = Duration::from_secs(secs);
        }
        Ok(api)
    }
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL {raw:?}: {e}"),
    })
}
