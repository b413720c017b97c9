//! `login`: verify the service account, optionally remember it.

use tracing::info;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: LoginArgs, mut ctx: Context, global: &GlobalOpts) -> Result<(), CliError> {
    let credentials = ctx.credentials(global)?;
    let api = ctx.api_config(global)?;
    let session = sitepulse_core::Session::connect(&api, &credentials).await?;

    let color = output::should_color(&global.color);
    let lifetime = session
        .expires_in()
        .map(|d| format!(" (token valid for {})", humantime::format_duration(d)))
        .unwrap_or_default();
    if !global.quiet {
        eprintln!(
            "{} Authenticated as {} in tenant {}{lifetime}",
            output::ok("✓", color),
            credentials.client_id,
            credentials.tsg_id
        );
    }

    if args.remember {
        sitepulse_config::remember_secret(&credentials.client_id, &credentials.secret)?;
        let auth = &mut ctx.config.auth;
        auth.username = Some(credentials.client_id.clone());
        auth.tsg_id = Some(credentials.tsg_id.clone());
        auth.secret = None;
        ctx.config.ui.remember_me = true;
        ctx.save()?;
        info!(path = %ctx.path.display(), "credentials remembered");
        if !global.quiet {
            eprintln!("  Secret stored in the system keyring");
        }
    }

    Ok(())
}
