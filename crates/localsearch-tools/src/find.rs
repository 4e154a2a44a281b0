//! Metadata-based file finding (`find_files`).
//!
//! Unlike the search backends this never shells out and its results are not
//! cached: it is a plain filter over the recursive walk.

use crate::model::{FindRequest, SearchResult};
use crate::shared::{extension_allowed, matches_file_pattern, relative_slash_path};
use crate::walk::walk_files;
use tokio_util::sync::CancellationToken;

/// Walk `request.root` and return files matching name, size and extension
/// filters, stopping as soon as `limit` are found.
pub fn find_files(request: &FindRequest, cancel: &CancellationToken) -> Vec<SearchResult> {
    let mut results = Vec::new();
    if request.limit == 0 {
        return results;
    }

    for entry in walk_files(&request.root, cancel) {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();
        let relative = relative_slash_path(&request.root, path);

        if !matches_file_pattern(&request.name_pattern, &file_name, &relative) {
            continue;
        }
        if !extension_allowed(path, &request.file_types) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let size = metadata.len();
        if request.min_size.is_some_and(|min| size < min) {
            continue;
        }
        if request.max_size.is_some_and(|max| size > max) {
            continue;
        }

        results.push(SearchResult::file(path, 0.0));
        if results.len() >= request.limit {
            break;
        }
    }

    results
}
