//! Settings file persistence.
//!
//! JSON files are written atomically and readable by the owner only.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/WarpBar`
/// - Linux: `~/.config/warpbar`
/// - Windows: `%APPDATA%\warpbar`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir().map_or_else(
            || PathBuf::from("."),
            |h| h.join("Library").join("Application Support").join("WarpBar"),
        )
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir().map_or_else(|| PathBuf::from("."), |c| c.join("warpbar"))
    }
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = format!("{mode:o}"), "Set permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Ensures a directory exists, creating it owner-only if missing.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_mode(path, 0o700).await?;
    }
    Ok(())
}

/// Saves data as pretty JSON.
///
/// Writes to a sibling temp file and renames it over the target, then
/// restricts the file to 0600 on Unix.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem step fails.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    tokio::fs::rename(&temp_path, path).await?;

    set_mode(path, 0o600).await?;
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or a serialization error
/// if its contents do not decode.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Loads data from a JSON file, returning the default if it is missing or
/// invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "File not found, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
