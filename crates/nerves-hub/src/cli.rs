//! Clap derive structures for the `nerves-hub` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nerves-hub -- manage NervesHub devices from the command line
#[derive(Debug, Parser)]
#[command(
    name = "nerves-hub",
    version,
    about = "Manage NervesHub devices and device certificates",
    long_about = "Command-line client for the NervesHub device management API.\n\n\
        Settings come from a TOML config file and NERVES_HUB_* environment\n\
        variables. Authenticate with a client certificate and key, or with a\n\
        user access token.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Organization (overrides NERVES_HUB_ORG and the config file)
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Product (overrides NERVES_HUB_PRODUCT and the config file)
    #[arg(long, global = true)]
    pub product: Option<String>,

    /// API base URL (overrides NERVES_HUB_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

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
    /// Plain text, one identifier per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage devices in the product
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage per-device certificates
    #[command(alias = "cert")]
    Certs(CertsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List,

    /// Register a new device
    Create {
        /// Unique device identifier (usually the serial number)
        identifier: String,

        /// Free-form description
        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag", short = 't', value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Delete a device
    #[command(alias = "rm")]
    Delete {
        /// Device identifier
        identifier: String,
    },
}

#[derive(Debug, Args)]
pub struct CertsArgs {
    #[command(subcommand)]
    pub command: CertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CertsCommand {
    /// List certificates for a device
    #[command(alias = "ls")]
    List {
        /// Device identifier
        identifier: String,
    },

    /// Upload a PEM certificate for a device
    Create {
        /// Device identifier
        identifier: String,

        /// Path to the PEM-encoded certificate
        #[arg(value_name = "CERT_PEM")]
        cert: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
