//! Shared helpers for command handlers.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use sitepulse_core::{MetricWindow, Session};

use crate::cli::{ExportArgs, GlobalOpts, WindowArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::report;

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| CliError::Validation {
        field: "end-date".into(),
        reason: format!("expected YYYY-MM-DD, got {raw:?}: {e}"),
    })
}

/// Query window from `--end-date` / `--days`, falling back to today and
/// the configured duration.
pub fn window(args: &WindowArgs, ctx: &Context) -> Result<MetricWindow, CliError> {
    let today = Utc::now().date_naive();
    let end = args.end_date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    let days = args.days.unwrap_or(ctx.config.ui.defaults.duration_days);
    let window = MetricWindow::ending_on(end, days, ctx.config.report.interval.clone(), today)?;
    debug!(start = %window.start_time(), end = %window.end_time(), "query window");
    Ok(window)
}

/// Authenticate with the resolved credentials.
pub async fn connect(ctx: &Context, global: &GlobalOpts) -> Result<Session, CliError> {
    let credentials = ctx.credentials(global)?;
    let api = ctx.api_config(global)?;
    Ok(Session::connect(&api, &credentials).await?)
}

/// Export directory: `--out`, else the last one used, else the working directory.
pub fn export_dir(args: &ExportArgs, ctx: &Context) -> PathBuf {
    args.out
        .clone()
        .or_else(|| ctx.config.paths.last_export_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Export file name, timestamped unless `--no-timestamp`.
pub fn export_name(name: &str, args: &ExportArgs) -> String {
    if args.no_timestamp {
        name.to_owned()
    } else {
        report::timestamped(name, chrono::Local::now())
    }
}

/// Persist `dir` as the last export directory. Failures are only logged.
pub fn remember_export_dir(ctx: &mut Context, dir: &Path) {
    let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    if ctx.config.paths.last_export_dir.as_ref() == Some(&dir) {
        return;
    }
    ctx.config.paths.last_export_dir = Some(dir);
    if let Err(e) = ctx.save() {
        warn!(error = %e, "could not remember export directory");
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date("2024-05-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
        );
        assert!(matches!(
            parse_date("10/05/2024"),
            Err(CliError::Validation { .. })
        ));
    }
}
