//! Fetch error types.

use thiserror::Error;
use warpbar_core::{ErrorKind, LoadError};

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for locating, parsing, and watching the preferences file.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// No preferences file, or it could not be read or decoded.
    #[error("Warp preferences file not found: {0}")]
    SourceNotFound(String),

    /// The usage field is missing or its payload is not a JSON object.
    #[error("Unable to parse Warp usage data: {0}")]
    MalformedPayload(String),

    /// The file-change watch could not be established.
    #[error("Unable to monitor Warp preferences file for changes: {0}")]
    WatchSetupFailed(String),

    /// Every attempt of a load cycle failed.
    #[error("Failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the final attempt's error.
        last_error: String,
    },
}

impl FetchError {
    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::SourceNotFound(_) => ErrorKind::SourceNotFound,
            FetchError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            FetchError::WatchSetupFailed(_) => ErrorKind::WatchSetupFailed,
            FetchError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
        }
    }

    /// Converts into the error value published to consumers.
    pub fn to_load_error(&self) -> LoadError {
        LoadError::new(self.kind(), self.to_string())
    }
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        err.to_load_error()
    }
}
