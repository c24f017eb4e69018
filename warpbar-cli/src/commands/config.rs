//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;
use warpbar_store::{SettingsStore, default_config_dir};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the refresh interval.
    SetInterval {
        /// Seconds between refreshes (at least 1).
        seconds: u64,
    },

    /// Set the number of attempts per load.
    SetRetries {
        /// Attempts including the first (at least 1).
        attempts: u32,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, store).await,
        ConfigAction::Path => show_paths(cli, store).await,
        ConfigAction::SetInterval { seconds } => set_interval(*seconds, store).await,
        ConfigAction::SetRetries { attempts } => set_retries(*attempts, store).await,
        ConfigAction::Reset => reset_config(store).await,
    }
}

async fn show_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_settings(&settings));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&settings)?);
        }
    }

    Ok(())
}

async fn show_paths(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = store.path();
    let preferences_dir = store.get().await.locator().directory().to_path_buf();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:      {}", config_dir.display());
            println!("Settings file:   {}", settings_path.display());
            println!("Preferences dir: {}", preferences_dir.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "preferences_dir": preferences_dir.display().to_string(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&paths)?);
        }
    }

    Ok(())
}

async fn set_interval(seconds: u64, store: &SettingsStore) -> Result<()> {
    store.set_refresh_interval_secs(seconds).await;
    store.save().await?;

    info!(seconds, "Refresh interval updated");
    println!("Refresh interval set to: {seconds}s");

    Ok(())
}

async fn set_retries(attempts: u32, store: &SettingsStore) -> Result<()> {
    store.set_retry_attempts(attempts).await;
    store.save().await?;

    info!(attempts, "Retry attempts updated");
    println!("Retry attempts set to: {attempts}");

    Ok(())
}

async fn reset_config(store: &SettingsStore) -> Result<()> {
    let path = store.path();

    if path.exists() {
        tokio::fs::remove_file(path).await?;
        store.reset().await;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
