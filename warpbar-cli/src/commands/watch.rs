//! Watch command - live usage display.
//!
//! Keeps a store running, reloads on a timer and on file writes, and redraws
//! whenever the published state changes.

use anyhow::Result;
use clap::Args;
use std::io::{Write, stdout};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::info;
use warpbar_store::{LoadState, Settings, UsageStateStore};

use crate::alerts::{Alert, AlertTracker};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds. Defaults to the configured interval.
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Only refresh on the timer, not on preference file writes.
    #[arg(long)]
    pub no_file_watch: bool,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let refresh_interval = args
        .interval
        .unwrap_or(settings.refresh_interval_secs)
        .max(1);
    let mut settings = settings.clone();
    if args.no_file_watch {
        settings.watch_file = false;
    }
    let force_on_tick = !settings.skip_unchanged;

    info!(interval = refresh_interval, force_on_tick, "Starting watch mode");

    let store = UsageStateStore::from_settings(&settings);
    let mut rx = store.subscribe();
    let mut alerts = AlertTracker::new(settings.status_thresholds);
    let text = TextFormatter::new(!cli.no_color).with_thresholds(settings.status_thresholds);
    let json = JsonFormatter::new(cli.pretty).with_thresholds(settings.status_thresholds);

    store.load(true)?;

    let mut ticker = interval(Duration::from_secs(refresh_interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately; the forced load above covers it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => store.load(force_on_tick)?,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                let alert = if settings.alerts_enabled {
                    state.snapshot.as_ref().and_then(|s| alerts.check(s))
                } else {
                    None
                };
                match cli.format {
                    OutputFormat::Json => println!("{}", json.format_state(&state)?),
                    OutputFormat::Text if cli.quiet => println!("{}", text.format_label(&state)),
                    OutputFormat::Text => {
                        redraw(&text, &state, alert.as_ref(), refresh_interval)?;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    store.shutdown().await;
    Ok(())
}

fn redraw(
    formatter: &TextFormatter,
    state: &LoadState,
    alert: Option<&Alert>,
    refresh_interval: u64,
) -> Result<()> {
    print!("\x1b[2J\x1b[H");
    stdout().flush()?;

    let now = chrono::Local::now();
    println!(
        "WarpBar Watch Mode - {} (refresh: {}s)",
        now.format("%H:%M:%S"),
        refresh_interval
    );
    println!("{}", formatter.format_label(state));
    println!();
    println!("{}", formatter.format_card(state));

    if let Some(alert) = alert {
        println!();
        println!("{}", formatter.format_alert(alert));
    }

    println!();
    println!("Press Ctrl+C to exit");
    Ok(())
}
