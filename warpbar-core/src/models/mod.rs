//! Domain models for WarpBar.
//!
//! ## Submodules
//!
//! - [`usage`] - The usage snapshot (UsageSnapshot)
//! - [`tier`] - Subscription tiers and their classifier
//! - [`status`] - Usage status levels and thresholds

mod status;
mod tier;
mod usage;

pub use status::{StatusThresholds, UsageStatus};
pub use tier::{
    MAX_CODEBASE_INDICES_KEY, SubscriptionClassifier, SubscriptionTier, TierSignals,
    TierThresholds, VOICE_REQUEST_LIMIT_KEY,
};
pub use usage::UsageSnapshot;
