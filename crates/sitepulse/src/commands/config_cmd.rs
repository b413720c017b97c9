//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;
use toml::Value;

use sitepulse_config::{Config, MAX_DURATION_DAYS};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util::prompt_err;
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);

    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            eprintln!("sitepulse configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            let mut cfg = sitepulse_config::load_config_or_default(&path);

            // 1. Service account
            let username: String = Input::new()
                .with_prompt("Client id (service account)")
                .with_initial_text(cfg.auth.username.clone().unwrap_or_default())
                .interact_text()
                .map_err(prompt_err)?;
            let tsg_id: String = Input::new()
                .with_prompt("Tenant service group id")
                .with_initial_text(cfg.auth.tsg_id.clone().unwrap_or_default())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Secret
            let secret = rpassword::prompt_password("Client secret: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "client secret cannot be empty".into(),
                });
            }

            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
                "Do not store (pass --secret or SITEPULSE_SECRET)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the client secret?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            cfg.auth.secret = None;
            match store_selection {
                0 => {
                    sitepulse_config::remember_secret(&username, &SecretString::from(secret))?;
                    cfg.ui.remember_me = true;
                    eprintln!("   ✓ Secret stored in system keyring");
                }
                1 => {
                    cfg.auth.secret = Some(secret);
                    cfg.ui.remember_me = true;
                }
                _ => cfg.ui.remember_me = false,
            }
            cfg.auth.username = Some(username);
            cfg.auth.tsg_id = Some(tsg_id);

            // 3. Task defaults
            let days: u32 = Input::new()
                .with_prompt(format!("Report window in days (1-{MAX_DURATION_DAYS})"))
                .default(cfg.ui.defaults.duration_days)
                .interact_text()
                .map_err(prompt_err)?;
            cfg.ui.defaults.duration_days = days;
            cfg.validate()?;

            // 4. Write config
            sitepulse_config::save_config_to(&cfg, &path)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("\n  Test it: sitepulse login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(config::load(global)?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| {
                    toml::to_string_pretty(c)
                        .unwrap_or_else(|e| format!("<cannot render config: {e}>"))
                },
                |_| path.display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let cfg = config::load(global)?;
            let updated = set_key(&cfg, &key, &value)?;
            updated.validate()?;
            sitepulse_config::save_config_to(&updated, &path)?;
            if !global.quiet {
                eprintln!("✓ Set {key}");
            }
            Ok(())
        }

        // ── SetSecret ───────────────────────────────────────────────
        ConfigCommand::SetSecret => {
            let mut cfg = config::load(global)?;
            let username = account(global, &cfg)?;

            let secret = rpassword::prompt_password(format!("Client secret for '{username}': "))
                .map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "client secret cannot be empty".into(),
                });
            }

            sitepulse_config::remember_secret(&username, &SecretString::from(secret))?;
            cfg.auth.username = Some(username);
            cfg.auth.secret = None;
            cfg.ui.remember_me = true;
            sitepulse_config::save_config_to(&cfg, &path)?;
            eprintln!("✓ Secret stored in system keyring");
            Ok(())
        }

        // ── ForgetSecret ────────────────────────────────────────────
        ConfigCommand::ForgetSecret => {
            let mut cfg = config::load(global)?;
            let username = account(global, &cfg)?;
            sitepulse_config::forget_secret(&username)?;
            cfg.ui.remember_me = false;
            sitepulse_config::save_config_to(&cfg, &path)?;
            eprintln!("✓ Secret for '{username}' removed from system keyring");
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn account(global: &GlobalOpts, cfg: &Config) -> Result<String, CliError> {
    global
        .client_id
        .clone()
        .or_else(|| cfg.auth.username.clone())
        .ok_or_else(|| CliError::NoCredentials {
            what: "client id".into(),
        })
}

fn redacted(mut cfg: Config) -> Config {
    if cfg.auth.secret.is_some() {
        cfg.auth.secret = Some(REDACTED.into());
    }
    cfg
}

fn unknown_key(key: &str) -> CliError {
    CliError::Validation {
        field: key.into(),
        reason: "unknown config key (see: sitepulse config show)".into(),
    }
}

/// Set a dot-separated `key` to `value`, typed after the existing field.
///
/// Unset optional fields are accepted as long as the result still
/// deserializes and the key survives a round trip.
fn set_key(cfg: &Config, key: &str, value: &str) -> Result<Config, CliError> {
    let segments: Vec<&str> = key.split('.').collect();
    let (leaf, parents) = segments
        .split_last()
        .filter(|(leaf, _)| !leaf.is_empty())
        .ok_or_else(|| unknown_key(key))?;

    let doc = Value::try_from(cfg).map_err(|e| CliError::Config {
        message: e.to_string(),
    })?;
    if lookup(&doc, parents).and_then(Value::as_table).is_none() {
        return Err(unknown_key(key));
    }

    let candidates = match lookup(&doc, &segments) {
        Some(existing) => vec![typed_like(existing, key, value)?],
        None => vec![guess_type(value), Value::String(value.to_owned())],
    };

    for candidate in candidates {
        let mut next = doc.clone();
        let table = table_at(&mut next, parents).ok_or_else(|| unknown_key(key))?;
        table.insert((*leaf).to_owned(), candidate);
        let parsed: Result<Config, _> = next.try_into();
        if let Ok(updated) = parsed {
            return if has_key(&updated, &segments) {
                Ok(updated)
            } else {
                Err(unknown_key(key))
            };
        }
    }

    Err(CliError::Validation {
        field: key.into(),
        reason: format!("{value:?} is not a valid value"),
    })
}

fn lookup<'a>(doc: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(doc, |node, segment| node.get(*segment))
}

fn table_at<'a>(doc: &'a mut Value, segments: &[&str]) -> Option<&'a mut toml::Table> {
    let mut table = doc.as_table_mut()?;
    for segment in segments {
        table = table.get_mut(*segment)?.as_table_mut()?;
    }
    Some(table)
}

fn has_key(cfg: &Config, segments: &[&str]) -> bool {
    Value::try_from(cfg).is_ok_and(|doc| lookup(&doc, segments).is_some())
}

fn typed_like(existing: &Value, key: &str, raw: &str) -> Result<Value, CliError> {
    let invalid = |expected: &str| CliError::Validation {
        field: key.into(),
        reason: format!("expected {expected}, got {raw:?}"),
    };
    match existing {
        Value::String(_) => Ok(Value::String(raw.to_owned())),
        Value::Integer(_) => raw
            .parse()
            .map(Value::Integer)
            .map_err(|_| invalid("an integer")),
        Value::Float(_) => raw.parse().map(Value::Float).map_err(|_| invalid("a number")),
        Value::Boolean(_) => raw
            .parse()
            .map(Value::Boolean)
            .map_err(|_| invalid("true or false")),
        Value::Datetime(_) | Value::Array(_) | Value::Table(_) => Err(CliError::Validation {
            field: key.into(),
            reason: "only scalar keys can be set; edit the config file for lists".into(),
        }),
    }
}

fn guess_type(raw: &str) -> Value {
    if let Ok(b) = raw.parse() {
        Value::Boolean(b)
    } else if let Ok(i) = raw.parse() {
        Value::Integer(i)
    } else {
        Value::String(raw.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sets_existing_scalars_with_their_type() {
        let cfg = Config::default();
        let cfg = set_key(&cfg, "ui.defaults.duration_days", "30").unwrap();
        let cfg = set_key(&cfg, "ui.defaults.generate_plots", "true").unwrap();
        let cfg = set_key(&cfg, "api.base_url", "https://api.example.test").unwrap();
        assert_eq!(cfg.ui.defaults.duration_days, 30);
        assert!(cfg.ui.defaults.generate_plots);
        assert_eq!(cfg.api.base_url, "https://api.example.test");
    }

    #[test]
    fn unset_optional_string_keeps_digits_as_text() {
        let cfg = set_key(&Config::default(), "auth.tsg_id", "1234567").unwrap();
        assert_eq!(cfg.auth.tsg_id.as_deref(), Some("1234567"));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let cfg = Config::default();
        assert!(matches!(
            set_key(&cfg, "ui.defaults.nope", "1"),
            Err(CliError::Validation { .. })
        ));
        assert!(set_key(&cfg, "missing.section", "x").is_err());
        assert!(set_key(&cfg, "report.workers", "many").is_err());
        assert!(set_key(&cfg, "report.metrics", "x").is_err());
    }

    #[test]
    fn show_redacts_plaintext_secret() {
        let mut cfg = Config::default();
        cfg.auth.secret = Some("hunter2".into());
        assert_eq!(redacted(cfg).auth.secret.as_deref(), Some(REDACTED));
    }
}
