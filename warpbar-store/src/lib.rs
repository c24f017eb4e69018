// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # WarpBar Store
//!
//! State management for WarpBar.
//!
//! This crate provides:
//!
//! - **UsageStateStore**: Owner task for the published [`LoadState`]
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use warpbar_store::{SettingsStore, UsageStateStore};
//!
//! let settings = SettingsStore::load_default().await?.get().await;
//! let store = UsageStateStore::from_settings(&settings);
//!
//! store.load(true)?;
//!
//! let mut rx = store.subscribe();
//! while rx.changed().await.is_ok() {
//!     let state = rx.borrow_and_update().clone();
//!     println!("{:?}", state.snapshot);
//! }
//! ```

pub mod error;
pub mod persistence;
pub mod settings_store;
pub mod state;
pub mod usage_store;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, ensure_dir, load_json, load_json_or_default,
    save_json,
};
pub use settings_store::{LogLevel, Settings, SettingsStore};
pub use state::LoadState;
pub use usage_store::UsageStateStore;
