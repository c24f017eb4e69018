//! Status command - load once and print the result.

use anyhow::{Result, anyhow};
use clap::Args;
use warpbar_store::{LoadState, Settings, UsageStateStore};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the status command.
#[derive(Args, Default)]
pub struct StatusArgs {
    /// Print only the one-line label.
    #[arg(long, short)]
    pub label: bool,

    /// Make a single attempt instead of retrying.
    #[arg(long)]
    pub no_retry: bool,
}

fn settled(state: &LoadState) -> bool {
    !state.is_loading && (state.snapshot.is_some() || state.last_error.is_some())
}

/// Runs the status command.
pub async fn run(args: &StatusArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let mut settings = settings.clone();
    settings.watch_file = false;
    if args.no_retry {
        settings.retry_attempts = 1;
    }

    let store = UsageStateStore::from_settings(&settings);
    let mut rx = store.subscribe();
    store.load(true)?;

    let state = rx
        .wait_for(settled)
        .await
        .map_err(|_| anyhow!("usage store stopped unexpectedly"))?
        .clone();
    store.shutdown().await;

    let unavailable = state.last_error.as_ref().filter(|_| !state.has_data());

    match cli.format {
        OutputFormat::Text => {
            if let Some(error) = unavailable {
                return Err(error.clone().into());
            }
            let formatter =
                TextFormatter::new(!cli.no_color).with_thresholds(settings.status_thresholds);
            if args.label || cli.quiet {
                println!("{}", formatter.format_label(&state));
            } else {
                println!("{}", formatter.format_card(&state));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty).with_thresholds(settings.status_thresholds);
            println!("{}", formatter.format_state(&state)?);
            if let Some(error) = unavailable {
                return Err(error.clone().into());
            }
        }
    }

    Ok(())
}
