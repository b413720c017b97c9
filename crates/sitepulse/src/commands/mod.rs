//! Command dispatch: bridges CLI args -> core pipeline -> output formatting.

pub mod config_cmd;
pub mod inventory;
pub mod login;
pub mod metrics;
pub mod report;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::handle(args, ctx, global).await,
        Command::Sites(args) => inventory::handle_sites(args, ctx, global).await,
        Command::Elements(args) => inventory::handle_elements(args, ctx, global).await,
        Command::Report(args) => report::handle(args, ctx, global).await,
        Command::Metrics(args) => metrics::handle(args, &ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a session".into(),
        )),
    }
}
