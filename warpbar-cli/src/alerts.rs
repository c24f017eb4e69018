//! Quota threshold alerts.
//!
//! Fires once when usage crosses into warning or critical and stays quiet
//! until usage drops back (the monthly quota reset).

use tracing::info;
use warpbar_core::{StatusThresholds, UsageSnapshot, UsageStatus};

/// Severity of an alert, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
    Critical,
}

impl From<UsageStatus> for AlertLevel {
    fn from(status: UsageStatus) -> Self {
        match status {
            UsageStatus::Warning => AlertLevel::Warning,
            UsageStatus::Critical => AlertLevel::Critical,
            UsageStatus::Healthy | UsageStatus::Unlimited => AlertLevel::None,
        }
    }
}

/// An alert ready to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub percent: i64,
}

impl Alert {
    pub fn title(&self) -> &'static str {
        match self.level {
            AlertLevel::Critical => "🚨 Warp AI Usage Critical",
            AlertLevel::Warning | AlertLevel::None => "⚠️ Warp AI Usage Warning",
        }
    }

    pub fn body(&self) -> String {
        let base = format!("You've used {}% of your monthly AI tokens.", self.percent);
        if self.level == AlertLevel::Critical {
            format!("{base} Consider upgrading your plan.")
        } else {
            base
        }
    }
}

/// Remembers the last level alerted on to avoid repeats.
#[derive(Debug, Default)]
pub struct AlertTracker {
    thresholds: StatusThresholds,
    last_level: AlertLevel,
}

impl AlertTracker {
    pub fn new(thresholds: StatusThresholds) -> Self {
        Self {
            thresholds,
            last_level: AlertLevel::None,
        }
    }

    /// Returns an alert if `snapshot` crossed into a higher level.
    pub fn check(&mut self, snapshot: &UsageSnapshot) -> Option<Alert> {
        let level = AlertLevel::from(snapshot.status_with(&self.thresholds));

        if level > self.last_level {
            self.last_level = level;
            #[allow(clippy::cast_possible_truncation)]
            let percent = (snapshot.usage_ratio() * 100.0) as i64;
            info!(level = ?level, percent, "Usage alert");
            return Some(Alert { level, percent });
        }

        // Usage dropped: re-arm lower levels.
        if level < self.last_level {
            self.last_level = level;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use warpbar_core::SubscriptionTier;

    fn snapshot(used: i64) -> UsageSnapshot {
        UsageSnapshot::new(used, 100, Utc::now(), false, SubscriptionTier::Free)
    }

    #[test]
    fn test_warning_fires_once() {
        let mut tracker = AlertTracker::default();

        assert!(tracker.check(&snapshot(50)).is_none());

        let alert = tracker.check(&snapshot(75)).unwrap();
        assert_eq!(alert.level, AlertLevel::Warning);
        assert_eq!(alert.percent, 75);
        assert_eq!(alert.body(), "You've used 75% of your monthly AI tokens.");

        assert!(tracker.check(&snapshot(80)).is_none());
    }

    #[test]
    fn test_escalates_to_critical() {
        let mut tracker = AlertTracker::default();
        tracker.check(&snapshot(75));

        let alert = tracker.check(&snapshot(92)).unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
        assert!(alert.title().contains("Critical"));
        assert!(alert.body().ends_with("Consider upgrading your plan."));
    }

    #[test]
    fn test_rearms_after_quota_reset() {
        let mut tracker = AlertTracker::default();
        assert!(tracker.check(&snapshot(95)).is_some());
        assert!(tracker.check(&snapshot(5)).is_none());
        assert_eq!(
            tracker.check(&snapshot(71)).map(|a| a.level),
            Some(AlertLevel::Warning)
        );
    }

    #[test]
    fn test_unlimited_never_alerts() {
        let mut tracker = AlertTracker::default();
        let unlimited = UsageSnapshot::new(5000, 100, Utc::now(), true, SubscriptionTier::Pro);
        assert!(tracker.check(&unlimited).is_none());
    }

    #[test]
    fn test_custom_thresholds() {
        let mut tracker = AlertTracker::new(StatusThresholds {
            warning: 0.5,
            critical: 0.6,
        });
        assert_eq!(
            tracker.check(&snapshot(55)).map(|a| a.level),
            Some(AlertLevel::Warning)
        );
    }
}
