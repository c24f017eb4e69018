//! Warp preferences file discovery.
//!
//! Warp writes its preferences under a different name per release channel.
//! The locator checks the candidates in priority order and returns the first
//! one that exists. It does not rank matches: stable wins over beta even if
//! the beta file is newer.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

/// Candidate file names, highest priority first (stable, beta, nightly, generic).
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "dev.warp.Warp-Stable.plist",
    "dev.warp.Warp-Beta.plist",
    "dev.warp.Warp-Nightly.plist",
    "dev.warp.Warp.plist",
];

/// Finds the preferences file among prioritized candidate names.
#[derive(Debug, Clone)]
pub struct PlistLocator {
    directory: PathBuf,
    candidates: Vec<String>,
}

impl Default for PlistLocator {
    fn default() -> Self {
        Self::new(
            Self::default_directory(),
            DEFAULT_CANDIDATES.iter().map(|s| (*s).to_string()).collect(),
        )
    }
}

impl PlistLocator {
    /// Creates a locator for a directory and ordered candidate names.
    pub fn new(directory: impl Into<PathBuf>, candidates: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            candidates,
        }
    }

    /// Returns the user preferences directory (`~/Library/Preferences`).
    pub fn default_directory() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Preferences"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Directory being searched.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Candidate names in priority order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Returns every candidate path, in priority order.
    pub fn candidate_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.candidates.iter().map(|name| self.directory.join(name))
    }

    /// Returns the first candidate that exists on disk.
    #[instrument(skip(self), fields(dir = %self.directory.display()))]
    pub fn locate(&self) -> Option<PathBuf> {
        for path in self.candidate_paths() {
            if path.is_file() {
                debug!(path = %path.display(), "Found Warp preferences");
                return Some(path);
            }
        }
        debug!("No Warp preferences file found");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.plist"), "").unwrap();
        std::fs::write(dir.path().join("D.plist"), "").unwrap();

        let locator = PlistLocator::new(
            dir.path(),
            names(&["A.plist", "B.plist", "C.plist", "D.plist"]),
        );
        assert_eq!(locator.locate(), Some(dir.path().join("B.plist")));
    }

    #[test]
    fn test_none_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        let locator = PlistLocator::new(dir.path(), names(&["A.plist"]));
        assert_eq!(locator.locate(), None);
    }

    #[test]
    fn test_directories_are_not_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("A.plist")).unwrap();
        std::fs::write(dir.path().join("B.plist"), "").unwrap();

        let locator = PlistLocator::new(dir.path(), names(&["A.plist", "B.plist"]));
        assert_eq!(locator.locate(), Some(dir.path().join("B.plist")));
    }

    #[test]
    fn test_default_candidates_order() {
        let locator = PlistLocator::default();
        assert_eq!(locator.candidates()[0], "dev.warp.Warp-Stable.plist");
        assert_eq!(locator.candidates()[3], "dev.warp.Warp.plist");
        assert!(locator.directory().ends_with("Library/Preferences"));
    }
}
