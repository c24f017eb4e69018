// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # WarpBar Fetch
//!
//! Reads Warp's AI quota out of its preferences file.
//!
//! ## Pipeline
//!
//! - [`locator::PlistLocator`] - Picks the preferences file by release channel
//! - [`parser::UsageSnapshotParser`] - Decodes plist, then the embedded JSON
//! - [`loader::RetryingLoader`] - Bounded retries with exponential backoff
//! - [`watcher::FileChangeWatcher`] - Fires on writes to the located file
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use warpbar_fetch::{PlistLocator, PlistSource, RetryStrategy, RetryingLoader, UsageSnapshotParser};
//!
//! let path = PlistLocator::default().locate();
//! let source = Arc::new(PlistSource::new(path, UsageSnapshotParser::default()));
//! let loader = RetryingLoader::new(source, RetryStrategy::default());
//!
//! let snapshot = loader.load().await?;
//! ```

pub mod error;
pub mod loader;
pub mod locator;
pub mod parser;
pub mod retry;
pub mod source;
pub mod watcher;

// Re-export key types at crate root

// Errors
pub use error::FetchError;

// Locating & parsing
pub use locator::{DEFAULT_CANDIDATES, PlistLocator};
pub use parser::{FALLBACK_LIMIT_INFO_KEY, LIMIT_INFO_KEY, LimitInfo, UsageSnapshotParser};
pub use source::{PlistSource, SnapshotSource};

// Retry & watch
pub use loader::{LoaderEvent, RetryingLoader, Sleeper, TokioSleeper};
pub use retry::RetryStrategy;
pub use watcher::{FileChangeWatcher, WatchEvent};
