// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! WarpBar CLI - Warp AI quota from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Current usage card
//! warpbar
//!
//! # Just the label, for status bars
//! warpbar status --label
//!
//! # JSON output
//! warpbar --format json --pretty
//!
//! # Live view, reloading on every write to Warp's preferences
//! warpbar watch --interval 5
//!
//! # Which preferences file is read
//! warpbar locate
//! ```

mod alerts;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use warpbar_core::LoadError;
use warpbar_store::{LogLevel, SettingsStore};

use commands::{config, locate, status, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// WarpBar CLI - Warp AI usage monitoring.
#[derive(Parser)]
#[command(name = "warpbar")]
#[command(about = "Warp AI request quota monitor")]
#[command(long_about = r#"
WarpBar reads the AI request quota that the Warp terminal stores in its
macOS preferences and shows how much of it has been used.

Examples:
  warpbar                        # Usage card
  warpbar status --label         # One-line label
  warpbar --format json          # JSON output
  warpbar watch                  # Live view
  warpbar locate                 # Show the preferences file in use
"#)]
#[command(version)]
#[command(author = "WarpBar Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'status' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Load usage once and print it (default if no command specified).
    #[command(visible_alias = "s")]
    Status(status::StatusArgs),

    /// Keep refreshing and redraw on every change.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Show which Warp preferences file is read.
    #[command(visible_alias = "l")]
    Locate,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Usage data could not be loaded.
    Unavailable = 2,
}

impl ExitCode {
    fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<LoadError>().is_some() {
            ExitCode::Unavailable
        } else {
            ExitCode::Error
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("warpbar=debug,info")
    } else {
        EnvFilter::new(format!("warpbar={level}"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_store = SettingsStore::load_default().await?;
    let settings = settings_store.get().await;

    setup_logging(cli.verbose, cli.quiet, settings.log_level);

    let result = match &cli.command {
        Some(Commands::Status(args)) => status::run(args, &cli, &settings).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli, &settings).await,
        Some(Commands::Locate) => locate::run(&cli, &settings),
        Some(Commands::Config(args)) => config::run(args, &cli, &settings_store).await,
        None => status::run(&status::StatusArgs::default(), &cli, &settings).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
