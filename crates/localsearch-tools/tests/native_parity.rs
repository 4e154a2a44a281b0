//! Native and fallback backends should agree on small trees.
//!
//! Tests that need a native executable return early when it is not on PATH.

use localsearch_tools::{
    Capability, CapabilityDetector, ContentMode, ContentSearchBackend, ContentSearchRequest,
    FdBackend, FileSearchBackend, FileSearchRequest, FuzzyFileScanner, LineScanner,
    RipgrepBackend, RunStatus,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

fn setup_tree() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::write(root.join("a.txt"), "hello world\nnothing here\n").unwrap();
    fs::write(root.join("b.md"), "hello again\n").unwrap();
    fs::write(root.join("README.md"), "# readme\n").unwrap();
    fs::write(root.join("read_me_old.txt"), "old\n").unwrap();
    fs::write(root.join("other.txt"), "other\n").unwrap();
    (dir, root)
}

fn content_request(root: &Path) -> ContentSearchRequest {
    ContentSearchRequest {
        query: "hello".to_string(),
        root: root.to_path_buf(),
        case_sensitive: false,
        whole_word: false,
        file_pattern: Some("*.txt".to_string()),
        limit: 50,
        mode: ContentMode::Literal,
    }
}

#[tokio::test]
async fn test_fallback_content_search_with_file_pattern() {
    let (_dir, root) = setup_tree();
    let run = LineScanner::new(Duration::from_secs(10))
        .search(&content_request(&root))
        .await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].path, root.join("a.txt"));
    assert_eq!(run.results[0].line, Some(1));
}

#[tokio::test]
async fn test_native_content_search_matches_fallback() {
    let Some(rg) = CapabilityDetector::new().locate(Capability::ContentSearch) else {
        return;
    };
    let (_dir, root) = setup_tree();
    let request = content_request(&root);

    let native = RipgrepBackend::new(rg, Duration::from_secs(10))
        .search(&request)
        .await;
    let fallback = LineScanner::new(Duration::from_secs(10))
        .search(&request)
        .await;

    assert_eq!(native.status, RunStatus::Completed);
    assert_eq!(native.results.len(), fallback.results.len());
    assert_eq!(native.results[0].path, fallback.results[0].path);
    assert_eq!(native.results[0].line, fallback.results[0].line);
    assert_eq!(native.results[0].column, fallback.results[0].column);
}

#[tokio::test]
async fn test_native_file_search_ranks_like_fallback() {
    let Some(fd) = CapabilityDetector::new().locate(Capability::FileSearch) else {
        return;
    };
    let (_dir, root) = setup_tree();
    let request = FileSearchRequest {
        query: "readme".to_string(),
        root: root.clone(),
        file_types: Vec::new(),
        limit: 20,
    };

    let native = FdBackend::new(fd, Duration::from_secs(10))
        .search(&request)
        .await;
    let fallback = FuzzyFileScanner::new(Duration::from_secs(10))
        .search(&request)
        .await;

    assert_eq!(native.status, RunStatus::Completed);
    assert_eq!(native.results.first().map(|r| &r.path), Some(&root.join("README.md")));
    assert_eq!(fallback.results.first().map(|r| &r.path), Some(&root.join("README.md")));
    assert!(!fallback.results.iter().any(|r| r.path == root.join("other.txt")));
}
