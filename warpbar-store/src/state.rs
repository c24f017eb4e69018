//! Published load state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use warpbar_core::{LoadError, StatusThresholds, UsageSnapshot, UsageStatus};

/// Everything consumers need to render the current quota.
///
/// Only the store's owner task writes this; readers get clones through a
/// `watch` channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadState {
    /// Last successfully parsed snapshot. Kept when a later cycle fails.
    pub snapshot: Option<UsageSnapshot>,
    /// A cycle is running.
    pub is_loading: bool,
    /// Failure of the most recent cycle, cleared on success.
    pub last_error: Option<LoadError>,
    /// When the last successful cycle finished.
    pub last_update_time: Option<DateTime<Utc>>,
    /// Failed attempts so far in the running cycle; 0 when idle.
    pub retry_attempt: u32,
    /// File watch failure. Refreshes still work without the watch.
    pub watch_error: Option<LoadError>,
    /// Preferences file being read, if one was found.
    pub source_path: Option<PathBuf>,
}

impl LoadState {
    /// Returns true if a snapshot is available.
    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Returns true while a cycle is backing off between attempts.
    pub fn is_retrying(&self) -> bool {
        self.is_loading && self.retry_attempt > 0
    }

    /// Status of the current snapshot.
    pub fn status(&self, thresholds: &StatusThresholds) -> Option<UsageStatus> {
        self.snapshot.as_ref().map(|s| s.status_with(thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpbar_core::{ErrorKind, SubscriptionTier};

    fn snapshot(used: i64, limit: i64) -> UsageSnapshot {
        UsageSnapshot::new(used, limit, Utc::now(), false, SubscriptionTier::Free)
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = LoadState::default();
        assert!(!state.has_data());
        assert!(!state.is_loading);
        assert!(!state.is_retrying());
        assert_eq!(state.retry_attempt, 0);
        assert!(state.status(&StatusThresholds::default()).is_none());
    }

    #[test]
    fn test_status_follows_snapshot() {
        let state = LoadState {
            snapshot: Some(snapshot(95, 100)),
            ..LoadState::default()
        };
        assert_eq!(
            state.status(&StatusThresholds::default()),
            Some(UsageStatus::Critical)
        );
    }

    #[test]
    fn test_retrying_requires_loading() {
        let mut state = LoadState {
            retry_attempt: 2,
            ..LoadState::default()
        };
        assert!(!state.is_retrying());
        state.is_loading = true;
        assert!(state.is_retrying());
    }

    #[test]
    fn test_serializes_error_kind() {
        let state = LoadState {
            last_error: Some(LoadError::new(ErrorKind::RetriesExhausted, "gave up")),
            ..LoadState::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["last_error"]["kind"], "retries_exhausted");
        assert_eq!(json["is_loading"], false);
    }
}
