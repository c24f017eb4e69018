//! Usage snapshot type.
//!
//! A [`UsageSnapshot`] is one fully parsed reading of Warp's AI request
//! quota. It is produced whole by the parser and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{StatusThresholds, UsageStatus};
use super::tier::SubscriptionTier;

// ============================================================================
// Usage Snapshot
// ============================================================================

/// A single reading of the AI request quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Requests consumed since the last quota refresh.
    pub requests_used: i64,
    /// Quota ceiling. Meaningless when `is_unlimited` is set.
    pub requests_limit: i64,
    /// When the quota window resets.
    pub next_refresh_time: DateTime<Utc>,
    /// Whether the account has no request ceiling.
    pub is_unlimited: bool,
    /// Classified subscription level.
    pub subscription_tier: SubscriptionTier,
}

impl UsageSnapshot {
    /// Creates a new snapshot.
    pub fn new(
        requests_used: i64,
        requests_limit: i64,
        next_refresh_time: DateTime<Utc>,
        is_unlimited: bool,
        subscription_tier: SubscriptionTier,
    ) -> Self {
        Self {
            requests_used,
            requests_limit,
            next_refresh_time,
            is_unlimited,
            subscription_tier,
        }
    }

    /// Fraction of the quota consumed.
    ///
    /// Exactly `used / limit`, unclamped, so it can exceed 1.0 or go
    /// negative. Returns 0 when the limit is zero or negative.
    #[allow(clippy::cast_precision_loss)]
    pub fn usage_ratio(&self) -> f64 {
        if self.requests_limit <= 0 {
            return 0.0;
        }
        self.requests_used as f64 / self.requests_limit as f64
    }

    /// Status level using the default 0.7 / 0.9 thresholds.
    pub fn status(&self) -> UsageStatus {
        self.status_with(&StatusThresholds::default())
    }

    /// Status level using custom thresholds.
    pub fn status_with(&self, thresholds: &StatusThresholds) -> UsageStatus {
        if self.is_unlimited {
            return UsageStatus::Unlimited;
        }
        thresholds.classify(self.usage_ratio())
    }

    /// Requests left before hitting the limit. Negative once over it.
    pub fn remaining(&self) -> i64 {
        self.requests_limit.saturating_sub(self.requests_used)
    }

    /// Compact `used/limit` text.
    pub fn display_text(&self) -> String {
        if self.is_unlimited {
            "∞/∞ (Unlimited)".to_string()
        } else {
            format!("{}/{}", self.requests_used, self.requests_limit)
        }
    }

    /// Plan name for display, noting unlimited accounts.
    pub fn plan_display_name(&self) -> &'static str {
        if self.is_unlimited {
            "Pro Plan (Unlimited)"
        } else {
            self.subscription_tier.display_name()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(used: i64, limit: i64) -> UsageSnapshot {
        UsageSnapshot::new(used, limit, Utc::now(), false, SubscriptionTier::Basic)
    }

    #[test]
    fn test_usage_ratio_is_plain_quotient() {
        assert!((snapshot(150, 2500).usage_ratio() - 0.06).abs() < f64::EPSILON);
        assert!((snapshot(-10, 100).usage_ratio() - (-0.1)).abs() < f64::EPSILON);
        assert!((snapshot(300, 200).usage_ratio() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_usage_ratio_zero_for_non_positive_limit() {
        assert_eq!(snapshot(50, 0).usage_ratio(), 0.0);
        assert_eq!(snapshot(50, -5).usage_ratio(), 0.0);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(snapshot(69, 100).status(), UsageStatus::Healthy);
        assert_eq!(snapshot(70, 100).status(), UsageStatus::Warning);
        assert_eq!(snapshot(89, 100).status(), UsageStatus::Warning);
        assert_eq!(snapshot(90, 100).status(), UsageStatus::Critical);
        assert_eq!(snapshot(120, 100).status(), UsageStatus::Critical);
    }

    #[test]
    fn test_unlimited_status_ignores_ratio() {
        let snap = UsageSnapshot::new(5000, 100, Utc::now(), true, SubscriptionTier::Pro);
        assert_eq!(snap.status(), UsageStatus::Unlimited);
        assert_eq!(snap.display_text(), "∞/∞ (Unlimited)");
        assert_eq!(snap.plan_display_name(), "Pro Plan (Unlimited)");
    }

    #[test]
    fn test_display_text_and_remaining() {
        let snap = snapshot(150, 2500);
        assert_eq!(snap.display_text(), "150/2500");
        assert_eq!(snap.remaining(), 2350);
        assert_eq!(snap.plan_display_name(), "Basic Plan");
    }

    #[test]
    fn test_remaining_saturates_on_extreme_values() {
        assert_eq!(snapshot(i64::MAX, -10).remaining(), i64::MIN);
        assert_eq!(snapshot(i64::MIN, 10).remaining(), i64::MAX);
        assert_eq!(snapshot(120, 100).remaining(), -20);
    }
}
