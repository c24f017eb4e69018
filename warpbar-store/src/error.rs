//! Store error types.

use thiserror::Error;
use warpbar_core::CoreError;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's owner task has stopped.
    #[error("Usage store is shut down")]
    ShutDown,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig(msg) => StoreError::Config(msg),
            CoreError::Serialization(e) => StoreError::Serialization(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_config_error_maps_to_config() {
        let err: StoreError = CoreError::InvalidConfig("warning above critical".into()).into();
        assert!(matches!(err, StoreError::Config(ref m) if m == "warning above critical"));
        assert_eq!(
            err.to_string(),
            "Configuration error: warning above critical"
        );
    }

    #[test]
    fn test_shut_down_message() {
        assert_eq!(StoreError::ShutDown.to_string(), "Usage store is shut down");
    }
}
