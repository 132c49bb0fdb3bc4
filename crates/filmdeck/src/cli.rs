//! Clap derive structures for the `filmdeck` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// filmdeck -- remote control for a networked film scanner
#[derive(Debug, Parser)]
#[command(
    name = "filmdeck",
    version,
    about = "Control a film scanner from the command line",
    long_about = "Drive a networked film scanner: watch its live state, toggle the\n\
        light, advance and zoom, and run scans.\n\n\
        State comes from the scanner's event stream; commands are sent\n\
        without predicting their effect.",
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
    /// Scanner profile to use
    #[arg(long, short = 'p', env = "FILMDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Scanner URL (overrides profile)
    #[arg(long, short = 'd', env = "FILMDECK_DEVICE", global = true)]
    pub device: Option<String>,

    /// Backend route prefix (overrides profile)
    #[arg(long, env = "FILMDECK_PREFIX", global = true)]
    pub prefix: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FILMDECK_OUTPUT",
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

    /// Connect timeout in seconds (overrides profile)
    #[arg(long, env = "FILMDECK_CONNECT_TIMEOUT", global = true)]
    pub connect_timeout: Option<u64>,
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
    /// Plain text (scripting)
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
    /// Show the scanner's current state
    #[command(alias = "st")]
    Status,

    /// Follow the scanner's live state until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Advance the film by one frame
    #[command(alias = "next")]
    Advance,

    /// Toggle the backlight
    Light,

    /// Toggle fast-forward winding
    #[command(alias = "ff")]
    FastForward,

    /// Toggle focus zoom
    Zoom,

    /// Start or stop a scan
    Scan(ScanArgs),

    /// Dismiss the result of the last scan
    Dismiss,

    /// Power the scanner off
    Poweroff,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit once the current scan finishes
    #[arg(long)]
    pub until_done: bool,

    /// Hide the scan progress bar
    #[arg(long)]
    pub no_progress: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCAN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(subcommand)]
    pub command: ScanCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScanCommand {
    /// Start scanning a roll
    Start {
        /// Directory on the scanner to write frames to
        #[arg(value_name = "DIR")]
        output_directory: String,

        /// Number of frames to scan
        #[arg(long, short = 'n', value_name = "COUNT")]
        frames: u32,
    },

    /// Stop the running scan
    Stop,
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
    /// Create or extend the config file with a scanner profile
    Init {
        /// Scanner URL (prompted for when omitted)
        #[arg(long)]
        url: Option<String>,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Backend route prefix
        #[arg(long, default_value = "backend")]
        route_prefix: String,

        /// Event stream endpoint, or `per-resource`
        #[arg(long, default_value = "dashboard-sse")]
        stream: String,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
