//! Registry of directories the caller asked to watch.
//!
//! Registrations are only recorded; no file-system notifications are
//! delivered. The registry is owned by the server instance.

use localsearch_tools::{Result, SearchError};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchEntry {
    pub path: PathBuf,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    Started(WatchEntry),
    AlreadyWatching(WatchEntry),
}

#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: Mutex<BTreeMap<PathBuf, bool>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `directory`. A second registration of the same canonical path
    /// is reported, not treated as an error.
    pub fn register(&self, directory: &Path, recursive: bool) -> Result<WatchOutcome> {
        if !directory.is_dir() {
            return Err(SearchError::InvalidInput(format!(
                "Directory not found: {}",
                directory.display()
            )));
        }
        let path = directory.canonicalize()?;

        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&path) {
            return Ok(WatchOutcome::AlreadyWatching(WatchEntry {
                path,
                recursive: *existing,
            }));
        }
        entries.insert(path.clone(), recursive);
        info!(path = %path.display(), recursive, "Watching directory");
        Ok(WatchOutcome::Started(WatchEntry { path, recursive }))
    }

    /// Forget `directory`. Returns whether it was registered.
    pub fn unregister(&self, directory: &Path) -> bool {
        let path = directory
            .canonicalize()
            .unwrap_or_else(|_| directory.to_path_buf());
        let removed = self.entries.lock().remove(&path).is_some();
        if removed {
            info!(path = %path.display(), "Stopped watching directory");
        }
        removed
    }

    pub fn list(&self) -> Vec<WatchEntry> {
        self.entries
            .lock()
            .iter()
            .map(|(path, recursive)| WatchEntry {
                path: path.clone(),
                recursive: *recursive,
            })
            .collect()
    }

    pub fn is_watching(&self, directory: &Path) -> bool {
        directory
            .canonicalize()
            .map(|path| self.entries.lock().contains_key(&path))
            .unwrap_or(false)
    }
}
