// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `WarpBar` Core
//!
//! Core types and classification rules for the `WarpBar` application.
//!
//! This crate provides the foundational abstractions used across all other
//! `WarpBar` crates, including:
//!
//! - The usage snapshot read from Warp's preferences
//! - Subscription tier classification
//! - Usage status levels
//! - Error categories shared by the loader and the store
//!
//! ## Key Types
//!
//! - [`UsageSnapshot`] - One fully parsed quota reading
//! - [`SubscriptionTier`] / [`SubscriptionClassifier`] - Plan inference
//! - [`UsageStatus`] / [`StatusThresholds`] - Healthy, warning, critical, unlimited
//! - [`ErrorKind`] / [`LoadError`] - Failure categories and published errors

pub mod error;
pub mod models;

// Re-export error types
pub use error::{CoreError, ErrorKind, LoadError};

// Re-export all model types
pub use models::{
    MAX_CODEBASE_INDICES_KEY, StatusThresholds, SubscriptionClassifier, SubscriptionTier,
    TierSignals, TierThresholds, UsageSnapshot, UsageStatus, VOICE_REQUEST_LIMIT_KEY,
};
