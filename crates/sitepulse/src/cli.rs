//! Clap derive structures for the `sitepulse` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitepulse -- bulk SD-WAN site metric reports
#[derive(Debug, Parser)]
#[command(
    name = "sitepulse",
    version,
    about = "Collect SD-WAN site inventory and resource metrics from the command line",
    long_about = "Collect SD-WAN site inventory and resource metrics.\n\n\
        Authenticates with a service account, lists the element inventory,\n\
        and averages CPU, memory, disk and interface bandwidth per site over\n\
        a date window. Results are exported as CSV with optional PNG charts.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "SITEPULSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// API gateway URL (overrides config)
    #[arg(long, env = "SITEPULSE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Identity service URL (overrides config)
    #[arg(long, env = "SITEPULSE_AUTH_URL", global = true)]
    pub auth_url: Option<String>,

    /// Service account client id
    #[arg(long, env = "SITEPULSE_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Service account client secret
    #[arg(long, env = "SITEPULSE_SECRET", global = true, hide_env_values = true)]
    pub secret: Option<String>,

    /// Tenant service group id
    #[arg(long, env = "SITEPULSE_TSG_ID", global = true)]
    pub tsg_id: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SITEPULSE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "SITEPULSE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Also write debug logs to this file
    #[arg(long, env = "SITEPULSE_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify the service account and optionally remember it
    Login(LoginArgs),

    /// Site inventory
    Sites(InventoryArgs),

    /// Element inventory (the report's site list)
    #[command(alias = "el")]
    Elements(InventoryArgs),

    /// Average resource metrics for every site and export them
    #[command(alias = "automate")]
    Report(ReportArgs),

    /// Collect and reduce metrics for a single element
    Metrics(MetricsArgs),

    /// Manage configuration and stored credentials
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Save the client id and tenant, and keep the secret in the system keyring
    #[arg(long)]
    pub remember: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INVENTORY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InventoryArgs {
    #[command(subcommand)]
    pub command: InventoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// Print the inventory
    #[command(alias = "ls")]
    List,

    /// Write the inventory to a CSV file
    Export(InventoryExportArgs),
}

#[derive(Debug, Args)]
pub struct InventoryExportArgs {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Write sites and elements together as `<stamp>-inventory-{sites,elements}.csv`
    #[arg(long)]
    pub workbook: bool,
}

/// Shared export destination arguments.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output directory (defaults to the last export directory)
    #[arg(long, short = 'd')]
    pub out: Option<PathBuf>,

    /// Do not prefix file names with a timestamp
    #[arg(long)]
    pub no_timestamp: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Query window arguments.
#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Last day of the window, exclusive (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Window length in days (1-90, defaults to config)
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Number of concurrent workers (defaults to config)
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Render a PNG chart per site and metric
    #[arg(long)]
    pub plots: bool,

    /// Only report sites whose name matches this regex
    #[arg(long)]
    pub site_filter: Option<String>,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// Site id
    #[arg(long)]
    pub site_id: String,

    /// Element id
    #[arg(long)]
    pub element_id: String,

    /// Site name used for interface rule matching (defaults to the element name)
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub window: WindowArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value
    Set {
        /// Config key (dot-separated path, e.g., "ui.defaults.duration_days")
        key: String,

        /// Value to set
        value: String,
    },

    /// Store the client secret in the system keyring
    SetSecret,

    /// Remove the client secret from the system keyring
    ForgetSecret,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
