//! Subscription tier classification.
//!
//! Warp does not store the plan name in its preferences, so the tier is
//! inferred from the request limits in the usage payload. The thresholds
//! were observed from real accounts and are configuration, not protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Payload key holding the voice request ceiling.
pub const VOICE_REQUEST_LIMIT_KEY: &str = "voice_request_limit";
/// Payload key holding the codebase index ceiling.
pub const MAX_CODEBASE_INDICES_KEY: &str = "max_codebase_indices";

// ============================================================================
// Subscription Tier
// ============================================================================

/// Classified subscription level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SubscriptionTier {
    /// Free plan.
    #[default]
    Free,
    /// Basic plan.
    Basic,
    /// Standard plan.
    Standard,
    /// Pro plan.
    Pro,
}

impl SubscriptionTier {
    /// Returns the plan name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free Plan",
            SubscriptionTier::Basic => "Basic Plan",
            SubscriptionTier::Standard => "Standard Plan",
            SubscriptionTier::Pro => "Pro Plan",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTier::Free => write!(f, "Free"),
            SubscriptionTier::Basic => write!(f, "Basic"),
            SubscriptionTier::Standard => write!(f, "Standard"),
            SubscriptionTier::Pro => write!(f, "Pro"),
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Limits used to tell plans apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Minimum voice request limit of a Pro account.
    pub pro_voice_request_limit: i64,
    /// Minimum codebase index count of a Pro account.
    pub pro_codebase_indices: i64,
    /// Minimum request limit of a Standard (or Pro) account.
    pub standard_min_limit: i64,
    /// Request limits strictly above this are at least Basic.
    pub basic_limit_floor: i64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            pro_voice_request_limit: 999_999,
            pro_codebase_indices: 40,
            standard_min_limit: 2500,
            basic_limit_floor: 150,
        }
    }
}

impl TierThresholds {
    /// Checks that the tiers are ordered.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` when the Basic floor is not below
    /// the Standard minimum.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.basic_limit_floor >= self.standard_min_limit {
            return Err(CoreError::InvalidConfig(format!(
                "basic_limit_floor ({}) must be below standard_min_limit ({})",
                self.basic_limit_floor, self.standard_min_limit
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Inputs the classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierSignals {
    /// Request limit.
    pub limit: i64,
    /// Unlimited flag.
    pub is_unlimited: bool,
    /// Voice request limit (0 when absent).
    pub voice_request_limit: i64,
    /// Codebase index limit (0 when absent).
    pub max_codebase_indices: i64,
}

impl TierSignals {
    /// Builds signals from a decoded usage payload.
    ///
    /// Missing or non-integer `voice_request_limit` and
    /// `max_codebase_indices` count as 0.
    pub fn from_payload(payload: &Map<String, Value>, limit: i64, is_unlimited: bool) -> Self {
        let int = |key: &str| payload.get(key).and_then(Value::as_i64).unwrap_or(0);
        Self {
            limit,
            is_unlimited,
            voice_request_limit: int(VOICE_REQUEST_LIMIT_KEY),
            max_codebase_indices: int(MAX_CODEBASE_INDICES_KEY),
        }
    }
}

/// Derives a [`SubscriptionTier`] from usage limits.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionClassifier {
    thresholds: TierThresholds,
}

impl SubscriptionClassifier {
    /// Creates a classifier with custom thresholds.
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the thresholds in use.
    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Classifies a decoded usage payload.
    pub fn classify(
        &self,
        payload: &Map<String, Value>,
        limit: i64,
        is_unlimited: bool,
    ) -> SubscriptionTier {
        self.classify_signals(TierSignals::from_payload(payload, limit, is_unlimited))
    }

    /// Applies the ordered rules; the first match wins.
    pub fn classify_signals(&self, signals: TierSignals) -> SubscriptionTier {
        let t = &self.thresholds;

        if signals.is_unlimited {
            return SubscriptionTier::Pro;
        }

        if signals.voice_request_limit >= t.pro_voice_request_limit
            && signals.max_codebase_indices >= t.pro_codebase_indices
            && signals.limit >= t.standard_min_limit
        {
            return SubscriptionTier::Pro;
        }

        if signals.limit >= t.standard_min_limit {
            SubscriptionTier::Standard
        } else if signals.limit > t.basic_limit_floor {
            SubscriptionTier::Basic
        } else {
            SubscriptionTier::Free
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
