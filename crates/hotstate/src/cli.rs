//! Clap derive structures for the `hotstate` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hotstate -- drive shared-state screen controllers from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "hotstate",
    version,
    about = "Run demo screens backed by shared async state controllers",
    long_about = "Each command builds one screen controller over in-memory services,\n\
        performs its scripted interaction and prints every state the\n\
        controller publishes.",
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
    #[arg(long, env = "HOTSTATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the config file's setting)
    #[arg(long, short = 'o', env = "HOTSTATE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Grace period in milliseconds before an unobserved upstream stops
    #[arg(long, global = true)]
    pub grace_ms: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per state
    Text,
    /// One JSON object per state
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Observe the user preferences store until it has loaded
    Session,

    /// Show the profile, then sign out
    Profile(ProfileArgs),

    /// Fill in the sign-in form and submit it
    #[command(alias = "login")]
    SignIn(SignInArgs),

    /// Fill in the sign-up form and create the account
    #[command(alias = "register")]
    SignUp(SignUpArgs),

    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Make the auth service refuse to sign out
    #[arg(long)]
    pub fail_sign_out: bool,
}

#[derive(Debug, Args)]
pub struct SignInArgs {
    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Account password
    #[arg(long, short = 'p', env = "HOTSTATE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Make the auth service reject the credentials
    #[arg(long)]
    pub reject: bool,
}

#[derive(Debug, Args)]
pub struct SignUpArgs {
    /// Full name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Account password
    #[arg(long, short = 'p', env = "HOTSTATE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Make the auth service refuse the registration
    #[arg(long)]
    pub reject: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
