//! Preferences file change watcher.
//!
//! macOS rewrites preference files by atomic replace, which drops watches
//! placed on the file itself. The watcher therefore observes the parent
//! directory and filters events down to the target file name.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;

/// What the watcher reports to its callback.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The watched file was written or replaced.
    Changed,
    /// The OS reported an error after setup.
    Failed(FetchError),
}

/// Calls back whenever the watched file is written.
///
/// The OS handle lives exactly as long as this value: [`cancel`] or drop
/// releases it.
///
/// [`cancel`]: FileChangeWatcher::cancel
pub struct FileChangeWatcher {
    watcher: Option<RecommendedWatcher>,
    directory: PathBuf,
    path: PathBuf,
}

impl std::fmt::Debug for FileChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileChangeWatcher")
            .field("path", &self.path)
            .field("active", &self.watcher.is_some())
            .finish()
    }
}

impl FileChangeWatcher {
    /// Starts watching `path`, invoking `on_event` for each write.
    ///
    /// The callback runs on the watcher's own thread and should only hand
    /// the event off (for example by sending on a channel).
    ///
    /// # Errors
    ///
    /// Returns `FetchError::WatchSetupFailed` if the OS watch cannot be
    /// created.
    #[instrument(skip(on_event), fields(path = %path.display()))]
    pub fn start<F>(path: &Path, on_event: F) -> Result<Self, FetchError>
    where
        F: Fn(WatchEvent) + Send + 'static,
    {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| FetchError::WatchSetupFailed(format!("{} has no file name", path.display())))?;
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if is_write_to(&event, &file_name) {
                    debug!(kind = ?event.kind, "Preferences file changed");
                    on_event(WatchEvent::Changed);
                }
            }
            Err(e) => {
                warn!(error = %e, "File watch error");
                on_event(WatchEvent::Failed(FetchError::WatchSetupFailed(e.to_string())));
            }
        })
        .map_err(|e| FetchError::WatchSetupFailed(e.to_string()))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| FetchError::WatchSetupFailed(format!("{}: {e}", directory.display())))?;

        info!(dir = %directory.display(), "Watching preferences for changes");

        Ok(Self {
            watcher: Some(watcher),
            directory,
            path: path.to_path_buf(),
        })
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true until the watch is released.
    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stops watching and releases the OS handle.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.directory) {
                debug!(error = %e, "Unwatch failed, dropping watcher anyway");
            }
            debug!(path = %self.path.display(), "File watch released");
        }
    }
}

impl Drop for FileChangeWatcher {
    fn drop(&mut self) {
        self.release();
    }
}

/// Returns true for content or creation events touching `file_name`.
pub fn is_write_to(event: &Event, file_name: &OsString) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|name| name == file_name.as_os_str()))
}

// ============================================================================
// Tests
// ============================================================================
