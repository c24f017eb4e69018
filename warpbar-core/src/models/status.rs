//! Usage status levels.
//!
//! - [`UsageStatus`] - Health of the quota derived from the usage ratio
//! - [`StatusThresholds`] - Ratio cut-offs for warning and critical

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Usage Status
// ============================================================================

/// How close the quota is to its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    /// Comfortably below the warning threshold.
    #[default]
    Healthy,
    /// At or above the warning threshold.
    Warning,
    /// At or above the critical threshold.
    Critical,
    /// No ceiling applies.
    Unlimited,
}

impl UsageStatus {
    /// Returns true for levels that deserve an alert.
    pub fn needs_attention(&self) -> bool {
        matches!(self, UsageStatus::Warning | UsageStatus::Critical)
    }
}

impl std::fmt::Display for UsageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageStatus::Healthy => write!(f, "healthy"),
            UsageStatus::Warning => write!(f, "warning"),
            UsageStatus::Critical => write!(f, "critical"),
            UsageStatus::Unlimited => write!(f, "unlimited"),
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Ratio cut-offs for status levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    /// Ratio at which usage becomes a warning.
    pub warning: f64,
    /// Ratio at which usage becomes critical.
    pub critical: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            warning: 0.7,
            critical: 0.9,
        }
    }
}

impl StatusThresholds {
    /// Maps a usage ratio to a status level.
    pub fn classify(&self, ratio: f64) -> UsageStatus {
        if ratio >= self.critical {
            UsageStatus::Critical
        } else if ratio >= self.warning {
            UsageStatus::Warning
        } else {
            UsageStatus::Healthy
        }
    }

    /// Checks that both thresholds are finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` for non-finite or inverted values.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.warning.is_finite() || !self.critical.is_finite() {
            return Err(CoreError::InvalidConfig(
                "status thresholds must be finite".to_string(),
            ));
        }
        if self.warning > self.critical {
            return Err(CoreError::InvalidConfig(format!(
                "warning threshold ({}) exceeds critical threshold ({})",
                self.warning, self.critical
            )));
        }
        Ok(())
    }
}
