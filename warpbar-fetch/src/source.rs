//! Snapshot sources.
//!
//! The loader reads through [`SnapshotSource`] so tests can substitute a
//! scripted source for the real preferences file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use warpbar_core::UsageSnapshot;

use crate::error::FetchError;
use crate::parser::UsageSnapshotParser;

/// Something that can produce a usage snapshot on demand.
///
/// `load` is blocking and is always called off the state owner's task.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Reads and parses one snapshot.
    ///
    /// # Errors
    ///
    /// Returns the parse failure for this attempt.
    fn load(&self) -> Result<UsageSnapshot, FetchError>;

    /// File backing this source, if any.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Modification time of the backing file, if it can be read.
    fn modified(&self) -> Option<SystemTime> {
        None
    }
}

/// Reads snapshots from a located preferences file.
#[derive(Debug, Clone)]
pub struct PlistSource {
    path: Option<PathBuf>,
    parser: UsageSnapshotParser,
}

impl PlistSource {
    /// Creates a source for a located file, or for none when nothing was found.
    pub fn new(path: Option<PathBuf>, parser: UsageSnapshotParser) -> Self {
        Self { path, parser }
    }
}

impl SnapshotSource for PlistSource {
    fn load(&self) -> Result<UsageSnapshot, FetchError> {
        match &self.path {
            Some(path) => self.parser.parse_file(path),
            None => Err(FetchError::SourceNotFound(
                "no Warp preferences file exists; ensure Warp is installed and has been run at least once"
                    .to_string(),
            )),
        }
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn modified(&self) -> Option<SystemTime> {
        let path = self.path.as_ref()?;
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocated_source_fails_with_source_not_found() {
        let source = PlistSource::new(None, UsageSnapshotParser::default());
        assert!(matches!(source.load(), Err(FetchError::SourceNotFound(_))));
        assert!(source.path().is_none());
        assert!(source.modified().is_none());
    }

    #[test]
    fn test_modified_reads_file_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.plist");
        std::fs::write(&path, "").unwrap();

        let source = PlistSource::new(Some(path.clone()), UsageSnapshotParser::default());
        assert_eq!(source.path(), Some(path.as_path()));
        assert!(source.modified().is_some());
    }
}
