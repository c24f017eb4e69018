//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Local, Utc};
use std::path::Path;
use warpbar_core::{StatusThresholds, UsageSnapshot, UsageStatus};
use warpbar_store::{LoadState, Settings};

use crate::alerts::{Alert, AlertLevel};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    thresholds: StatusThresholds,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            thresholds: StatusThresholds::default(),
            bar_width: 10,
        }
    }

    /// Colors by custom status thresholds.
    pub fn with_thresholds(mut self, thresholds: StatusThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// One-line label, the menu bar equivalent.
    pub fn format_label(&self, state: &LoadState) -> String {
        match (&state.snapshot, &state.last_error) {
            (Some(snapshot), _) => self.color_for_status(
                snapshot.status_with(&self.thresholds),
                &snapshot.display_text(),
            ),
            (None, _) if state.is_loading => "Loading...".to_string(),
            (None, Some(error)) => format!("⚠️ {}", self.dim(&error.message)),
            (None, None) => "⚠️".to_string(),
        }
    }

    /// Detailed card with usage, plan, reset time and any errors.
    pub fn format_card(&self, state: &LoadState) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold("Warp AI Usage"));
        lines.push("─".repeat(40));

        if let Some(snapshot) = &state.snapshot {
            lines.extend(self.format_snapshot(snapshot));
        }

        if let Some(updated) = state.last_update_time {
            lines.push(format!(
                "Last updated: {}",
                self.dim(&updated.with_timezone(&Local).format("%H:%M:%S").to_string())
            ));
        }

        if state.is_retrying() {
            lines.push(self.yellow(&format!(
                "Retrying... (attempt {})",
                state.retry_attempt + 1
            )));
        } else if state.is_loading {
            lines.push(self.dim("Loading..."));
        }

        if let Some(error) = &state.last_error {
            lines.push(format!("{} {}", self.red("Error:"), error.message));
        }

        if let Some(error) = &state.watch_error {
            lines.push(self.dim(&format!("Live updates unavailable: {}", error.message)));
        }

        if state.snapshot.is_none() && state.last_error.is_none() && !state.is_loading {
            lines.push(self.dim("No usage data yet"));
        }

        lines.join("\n")
    }

    fn format_snapshot(&self, snapshot: &UsageSnapshot) -> Vec<String> {
        let status = snapshot.status_with(&self.thresholds);
        let mut lines = vec![
            format!(
                "Usage:  {}",
                self.color_for_status(status, &snapshot.display_text())
            ),
            format!("Plan:   {}", self.blue(snapshot.plan_display_name())),
        ];

        if !snapshot.is_unlimited {
            let ratio = snapshot.usage_ratio();
            #[allow(clippy::cast_possible_truncation)]
            let percent = (ratio * 100.0) as i64;
            lines.push(format!(
                "        {} {}",
                self.progress_bar(ratio, status),
                self.color_for_status(status, &format!("{percent}%"))
            ));
        }

        lines.push(format!(
            "Resets: {}",
            self.dim(&format_reset_time(snapshot.next_refresh_time))
        ));
        lines
    }

    /// Bracketed bar with one cell per tenth of the quota used.
    pub fn progress_bar(&self, ratio: f64, status: UsageStatus) -> String {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let filled = (ratio * self.bar_width as f64)
            .floor()
            .clamp(0.0, self.bar_width as f64) as usize;
        let empty = self.bar_width - filled;

        let bar = format!(
            "[{}{}]",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_status(status, &bar)
    }

    /// Formats a threshold alert.
    pub fn format_alert(&self, alert: &Alert) -> String {
        let title = match alert.level {
            AlertLevel::Critical => self.red(alert.title()),
            _ => self.yellow(alert.title()),
        };
        format!("{}\n{}", self.bold(&title), alert.body())
    }

    /// Lists candidate preference files, marking which exist.
    pub fn format_locate(
        &self,
        directory: &Path,
        candidates: &[(String, bool)],
        selected: Option<&Path>,
    ) -> String {
        let mut lines = vec![
            self.bold("Warp Preferences"),
            "─".repeat(40),
            format!("Directory: {}", directory.display()),
            String::new(),
        ];

        for (name, exists) in candidates {
            let mark = if *exists {
                self.green("✓")
            } else {
                self.dim("−")
            };
            let chosen = selected
                .and_then(Path::file_name)
                .is_some_and(|f| f.to_string_lossy() == name.as_str());
            let suffix = if chosen { self.bold(" (selected)") } else { String::new() };
            lines.push(format!("  {mark} {name}{suffix}"));
        }

        lines.join("\n")
    }

    /// Formats settings for `config show`.
    pub fn format_settings(&self, settings: &Settings) -> String {
        let dir = settings.locator().directory().display().to_string();
        let lines = [
            self.bold("WarpBar Configuration"),
            "─".repeat(40),
            format!("Refresh interval:  {}s", settings.refresh_interval_secs),
            format!("Retry attempts:    {}", settings.retry_attempts),
            format!("Base delay:        {}ms", settings.base_delay_ms),
            format!("Max delay:         {}s", settings.max_delay_secs),
            format!("Skip unchanged:    {}", settings.skip_unchanged),
            format!("Watch file:        {}", settings.watch_file),
            format!("Preferences dir:   {dir}"),
            format!("Candidates:        {}", settings.candidates.join(", ")),
            format!(
                "Status thresholds: warning {:.0}%, critical {:.0}%",
                settings.status_thresholds.warning * 100.0,
                settings.status_thresholds.critical * 100.0
            ),
            format!("Alerts:            {}", settings.alerts_enabled),
            format!("Log level:         {}", settings.log_level),
        ];
        lines.join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_status(&self, status: UsageStatus, text: &str) -> String {
        match status {
            UsageStatus::Healthy | UsageStatus::Unlimited => self.green(text),
            UsageStatus::Warning => self.yellow(text),
            UsageStatus::Critical => self.red(text),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }
}

/// Reset time in local time, e.g. `Mar 1, 2025 at 9:00 AM`.
fn format_reset_time(resets_at: DateTime<Utc>) -> String {
    resets_at
        .with_timezone(&Local)
        .format("%b %-d, %Y at %-I:%M %p")
        .to_string()
}
