//! Core error types for `WarpBar`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for `WarpBar` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// Error Kind
// ============================================================================

/// Category of a usage-acquisition failure.
///
/// Kept separate from the human-readable message so consumers can branch on
/// the failure without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No candidate preferences file exists, or it is unreadable/undecodable.
    SourceNotFound,
    /// The usage field is missing or its JSON payload cannot be decoded.
    MalformedPayload,
    /// The file-change watch could not be set up.
    WatchSetupFailed,
    /// Every attempt of a load cycle failed.
    RetriesExhausted,
}

impl ErrorKind {
    /// Short label for logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SourceNotFound => "source_not_found",
            ErrorKind::MalformedPayload => "malformed_payload",
            ErrorKind::WatchSetupFailed => "watch_setup_failed",
            ErrorKind::RetriesExhausted => "retries_exhausted",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Load Error
// ============================================================================

/// A published failure: the kind plus the message shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadError {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl LoadError {
    /// Creates a new load error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LoadError {}
