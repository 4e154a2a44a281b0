//! Recursive file enumeration shared by the fallback scanners and `find_files`.

use crate::shared::is_vcs_metadata_dir;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

/// Iterate regular files under `root`.
///
/// Only version-control metadata directories are pruned; build output,
/// virtualenvs and other dot-directories are walked like any other
/// directory. Symlinks are not followed and unreadable entries are skipped
/// silently. Iteration ends at the next entry once `cancel` fires.
pub fn walk_files<'a>(
    root: &Path,
    cancel: &'a CancellationToken,
) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_vcs_metadata_dir(&entry.file_name().to_string_lossy())
        })
        .take_while(move |_| !cancel.is_cancelled())
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
}
