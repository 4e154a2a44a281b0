use super::run_blocking_scan;
use crate::fuzzy::partial_ratio;
use crate::model::{BackendKind, BackendRun, FileSearchRequest, SearchResult};
use crate::native::FileSearchBackend;
use crate::shared::extension_allowed;
use crate::walk::walk_files;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Names must score strictly above this to be reported.
pub const FUZZY_THRESHOLD: f64 = 50.0;

/// Fuzzy file-name scanner.
#[derive(Debug, Clone)]
pub struct FuzzyFileScanner {
    timeout: Duration,
}

impl FuzzyFileScanner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Score every file under the root and keep the best `limit` above the
/// threshold. Ties keep traversal order.
pub fn scan_file_names(
    request: &FileSearchRequest,
    cancel: &CancellationToken,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = walk_files(&request.root, cancel)
        .filter(|entry| extension_allowed(entry.path(), &request.file_types))
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy();
            let score = partial_ratio(&request.query, &name);
            (score > FUZZY_THRESHOLD).then(|| SearchResult::file(entry.path(), score))
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(request.limit);
    results
}

#[async_trait]
impl FileSearchBackend for FuzzyFileScanner {
    fn kind(&self) -> BackendKind {
        BackendKind::FuzzyScan
    }

    async fn search(&self, request: &FileSearchRequest) -> BackendRun {
        let request = request.clone();
        run_blocking_scan(self.timeout, move |cancel| {
            let results = scan_file_names(&request, cancel);
            if cancel.is_cancelled() {
                BackendRun::failed(results)
            } else {
                BackendRun::completed(results)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn request(root: &Path, query: &str, limit: usize) -> FileSearchRequest {
        FileSearchRequest {
            query: query.to_string(),
            root: root.to_path_buf(),
            file_types: Vec::new(),
            limit,
        }
    }

    #[test]
    fn test_readme_ranking() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();
        fs::write(dir.path().join("read_me_old.txt"), "").unwrap();
        fs::write(dir.path().join("other.txt"), "").unwrap();

        let results =
            scan_file_names(&request(dir.path(), "readme", 20), &CancellationToken::new());
        let names: Vec<String> = results
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["README.md", "read_me_old.txt"]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_extension_filter_and_limit() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("notes{i}.md")), "").unwrap();
            fs::write(dir.path().join(format!("notes{i}.txt")), "").unwrap();
        }

        let mut req = request(dir.path(), "notes", 3);
        req.file_types = vec!["md".to_string()];
        let results = scan_file_names(&req, &CancellationToken::new());

        assert_eq!(results.len(), 3);
        assert!(
            results
                .iter()
                .all(|r| r.path.extension().unwrap() == "md")
        );
    }

    #[test]
    fn test_names_found_inside_build_and_dot_dirs() {
        let dir = tempdir().unwrap();
        for sub in ["build", "dist", "target/debug", "venv/lib", ".config", ".git"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("settings.json"), "").unwrap();
        }

        let results =
            scan_file_names(&request(dir.path(), "settings", 20), &CancellationToken::new());
        let mut parents: Vec<String> = results
            .iter()
            .map(|r| relative_parent(dir.path(), &r.path))
            .collect();
        parents.sort();

        assert_eq!(
            parents,
            vec![".config", "build", "dist", "target/debug", "venv/lib"]
        );
    }

    fn relative_parent(root: &Path, path: &Path) -> String {
        path.parent()
            .unwrap()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/")
    }

    #[tokio::test]
    async fn test_scanner_reports_completed_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "").unwrap();

        let scanner = FuzzyFileScanner::new(Duration::from_secs(5));
        let run = scanner.search(&request(dir.path(), "main", 10)).await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].path, dir.path().join("main.rs"));
        assert_eq!(scanner.kind(), BackendKind::FuzzyScan);
    }

    #[tokio::test]
    async fn test_scanner_on_missing_root_is_empty() {
        let scanner = FuzzyFileScanner::new(Duration::from_secs(5));
        let run = scanner
            .search(&request(&PathBuf::from("/nonexistent/localsearch"), "x", 10))
            .await;
        assert!(run.results.is_empty());
    }
}
