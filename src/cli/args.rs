//! CLI argument definitions
//!
//! All Clap derive structs for `moodharmony` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Guided emotional transition sessions.
#[derive(Parser, Debug)]
#[command(name = "moodharmony", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "MOODHARMONY_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "MOODHARMONY_LOG_FORMAT"
    )]
    pub log_format: OutputFormat,

    /// Expose Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, global = true, env = "MOODHARMONY_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and validate transition catalogs.
    Catalog(CatalogCommand),

    /// Run or resume a transition session.
    Session(SessionCommand),

    /// Display version and build information.
    Version(VersionArgs),
}

// ============================================================================
// Catalog Command
// ============================================================================

/// Catalog commands.
#[derive(Args, Debug)]
pub struct CatalogCommand {
    /// Catalog subcommand.
    #[command(subcommand)]
    pub subcommand: CatalogSubcommand,
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// List emotions and predefined transitions.
    List(CatalogListArgs),

    /// Show the transition a session between two emotions would run.
    Show(CatalogShowArgs),

    /// Validate catalog files.
    Validate(CatalogValidateArgs),
}

/// Arguments for `catalog list`.
#[derive(Args, Debug)]
pub struct CatalogListArgs {
    /// Catalog file; the built-in catalog is used when omitted.
    #[arg(short, long, env = "MOODHARMONY_CATALOG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `catalog show`.
#[derive(Args, Debug)]
pub struct CatalogShowArgs {
    /// Source emotion id.
    pub from: String,

    /// Target emotion id; suggested from the catalog when omitted.
    pub to: Option<String>,

    /// Catalog file; the built-in catalog is used when omitted.
    #[arg(short, long, env = "MOODHARMONY_CATALOG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `catalog validate`.
#[derive(Args, Debug)]
pub struct CatalogValidateArgs {
    /// Catalog files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Session Command
// ============================================================================

/// Session commands.
#[derive(Args, Debug)]
pub struct SessionCommand {
    /// Session subcommand.
    #[command(subcommand)]
    pub subcommand: SessionSubcommand,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionSubcommand {
    /// Start a new session, driven by commands read from stdin.
    Run(SessionRunArgs),

    /// Restore saved progress and continue it.
    Resume(SessionResumeArgs),
}

/// Arguments for `session run`.
#[derive(Args, Debug)]
pub struct SessionRunArgs {
    /// Emotion to move away from.
    #[arg(long)]
    pub from: String,

    /// Emotion to move toward; the catalog suggests one when omitted.
    #[arg(long)]
    pub to: Option<String>,

    /// Shared session options.
    #[command(flatten)]
    pub runtime: SessionRuntimeArgs,
}

/// Arguments for `session resume`.
#[derive(Args, Debug)]
pub struct SessionResumeArgs {
    /// Shared session options.
    #[command(flatten)]
    pub runtime: SessionRuntimeArgs,
}

/// Options shared by session commands.
#[derive(Args, Debug, Default)]
pub struct SessionRuntimeArgs {
    /// Catalog file; the built-in catalog is used when omitted.
    #[arg(short, long, env = "MOODHARMONY_CATALOG")]
    pub config: Option<PathBuf>,

    /// Saved-progress file.
    #[arg(long, env = "MOODHARMONY_STORE")]
    pub store: Option<PathBuf>,

    /// Evaluation journal file (JSONL).
    #[arg(long, env = "MOODHARMONY_JOURNAL")]
    pub journal: Option<PathBuf>,

    /// Write every session event to this JSONL file.
    #[arg(long, env = "MOODHARMONY_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Wall-clock milliseconds per tick.
    #[arg(long, env = "MOODHARMONY_TICK_MS")]
    pub tick_ms: Option<u64>,
}

// ============================================================================
// Version
// ============================================================================

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}
