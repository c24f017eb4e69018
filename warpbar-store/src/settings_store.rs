//! User preferences store.
//!
//! Manages user settings with persistence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};
use warpbar_core::{StatusThresholds, TierThresholds};
use warpbar_fetch::{DEFAULT_CANDIDATES, PlistLocator, RetryStrategy, UsageSnapshotParser};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json_or_default, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ========================================================================
    // Refresh
    // ========================================================================
    /// Seconds between timer-driven refreshes.
    pub refresh_interval_secs: u64,

    /// Attempts per load cycle, including the first.
    pub retry_attempts: u32,

    /// Backoff before the second attempt; doubles for each later one.
    pub base_delay_ms: u64,

    /// Upper bound on any single backoff.
    pub max_delay_secs: u64,

    /// Skip timer refreshes when the preferences file has not changed.
    pub skip_unchanged: bool,

    /// Reload as soon as Warp writes its preferences.
    pub watch_file: bool,

    // ========================================================================
    // Source
    // ========================================================================
    /// Directory to search instead of `~/Library/Preferences`.
    pub preferences_dir: Option<PathBuf>,

    /// Preference file names, highest priority first.
    pub candidates: Vec<String>,

    // ========================================================================
    // Classification
    // ========================================================================
    /// Limits used to infer the subscription tier.
    pub tier_thresholds: TierThresholds,

    /// Usage ratios for warning and critical status.
    pub status_thresholds: StatusThresholds,

    // ========================================================================
    // Misc
    // ========================================================================
    /// Print threshold alerts in `watch` mode.
    pub alerts_enabled: bool,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 1,
            retry_attempts: 3,
            base_delay_ms: 1000,
            max_delay_secs: 60,
            skip_unchanged: true,
            watch_file: true,
            preferences_dir: None,
            candidates: DEFAULT_CANDIDATES.iter().map(|s| (*s).to_string()).collect(),
            tier_thresholds: TierThresholds::default(),
            status_thresholds: StatusThresholds::default(),
            alerts_enabled: true,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Timer cadence.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Retry policy for load cycles.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.retry_attempts)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_secs(self.max_delay_secs))
    }

    /// Locator over the configured directory and candidates.
    pub fn locator(&self) -> PlistLocator {
        let directory = self
            .preferences_dir
            .clone()
            .unwrap_or_else(PlistLocator::default_directory);
        PlistLocator::new(directory, self.candidates.clone())
    }

    /// Parser using the configured tier thresholds.
    pub fn parser(&self) -> UsageSnapshotParser {
        UsageSnapshotParser::new(self.tier_thresholds.clone())
    }

    /// Checks that the settings describe a usable configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.refresh_interval_secs == 0 {
            return Err(StoreError::Config(
                "refresh_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.retry_attempts == 0 {
            return Err(StoreError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.candidates.is_empty() {
            return Err(StoreError::Config(
                "candidates must name at least one preferences file".to_string(),
            ));
        }
        self.tier_thresholds.validate()?;
        self.status_thresholds.validate()?;
        Ok(())
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store holding defaults, backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Currently infallible; unreadable files fall back to defaults.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// Missing, corrupt, or invalid files fall back to defaults.
    ///
    /// # Errors
    ///
    /// Currently infallible; reserved for stricter loading.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let mut settings: Settings = load_json_or_default(&path).await;
        if let Err(e) = settings.validate() {
            warn!(path = %path.display(), error = %e, "Invalid settings, using defaults");
            settings = Settings::default();
        }

        Ok(Self::with_settings(path, settings))
    }

    /// Path the store saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in memory. Call [`save`](Self::save) to persist.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Restores defaults.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` if the settings are invalid, or an IO
    /// error if they cannot be written.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        settings.validate()?;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Sets the timer cadence in seconds.
    pub async fn set_refresh_interval_secs(&self, secs: u64) {
        self.update(|s| s.refresh_interval_secs = secs).await;
    }

    /// Sets the number of attempts per load cycle.
    pub async fn set_retry_attempts(&self, attempts: u32) {
        self.update(|s| s.retry_attempts = attempts).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
