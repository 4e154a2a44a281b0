use super::run_blocking_scan;
use crate::model::{BackendKind, BackendRun, ContentMode, ContentSearchRequest, SearchResult};
use crate::native::ContentSearchBackend;
use crate::shared::{is_likely_binary, matches_file_pattern, relative_slash_path};
use crate::walk::walk_files;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Line-by-line literal content scanner.
#[derive(Debug, Clone)]
pub struct LineScanner {
    timeout: Duration,
}

impl LineScanner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Compiled literal matcher for one request.
struct LineMatcher {
    needle: String,
    case_sensitive: bool,
    whole_word: bool,
}

impl LineMatcher {
    fn new(request: &ContentSearchRequest) -> Self {
        let needle = if request.case_sensitive {
            request.query.clone()
        } else {
            request.query.to_lowercase()
        };
        Self {
            needle,
            case_sensitive: request.case_sensitive,
            whole_word: request.whole_word,
        }
    }

    /// Returns the 1-based byte column of the first match, or `Some(None)`
    /// when the line matches but the column cannot be mapped back.
    fn find(&self, line: &str) -> Option<Option<u64>> {
        let folded;
        let haystack = if self.case_sensitive {
            line
        } else {
            folded = line.to_lowercase();
            folded.as_str()
        };

        let offset = if self.whole_word {
            haystack
                .split_whitespace()
                .find(|token| *token == self.needle)
                .map(|token| token.as_ptr() as usize - haystack.as_ptr() as usize)?
        } else {
            haystack.find(&self.needle)?
        };

        // Case folding can change byte lengths; only report exact columns.
        if haystack.len() == line.len() {
            Some(Some(offset as u64 + 1))
        } else {
            Some(None)
        }
    }
}

/// Scan files under the root line by line and stop once `limit` matches
/// are collected. Unreadable files and likely-binary extensions are skipped.
pub fn scan_content(
    request: &ContentSearchRequest,
    cancel: &CancellationToken,
) -> Vec<SearchResult> {
    let matcher = LineMatcher::new(request);
    let mut results = Vec::new();
    if request.limit == 0 || matcher.needle.is_empty() {
        return results;
    }

    for entry in walk_files(&request.root, cancel) {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        if let Some(pattern) = &request.file_pattern {
            let relative = relative_slash_path(&request.root, path);
            if !matches_file_pattern(pattern, &file_name, &relative) {
                continue;
            }
        }
        if is_likely_binary(&file_name) {
            continue;
        }

        if scan_file(path, &matcher, request.limit, cancel, &mut results) {
            break;
        }
    }

    results
}

/// Append matches from one file, reading it a line at a time so large
/// files are never held in memory. Returns true once the limit is reached.
fn scan_file(
    path: &Path,
    matcher: &LineMatcher,
    limit: usize,
    cancel: &CancellationToken,
    out: &mut Vec<SearchResult>,
) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping unreadable file");
            return false;
        }
    };
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_number = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return false,
            Ok(_) => {}
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Stopped reading file");
                return false;
            }
        }
        line_number += 1;

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        if let Some(column) = matcher.find(line) {
            out.push(SearchResult::line_match(
                path,
                line_number,
                column,
                line.trim(),
            ));
            if out.len() >= limit {
                return true;
            }
        }
        if line_number % 4096 == 0 && cancel.is_cancelled() {
            return false;
        }
    }
}

#[async_trait]
impl ContentSearchBackend for LineScanner {
    fn kind(&self) -> BackendKind {
        BackendKind::LineScan
    }

    async fn search(&self, request: &ContentSearchRequest) -> BackendRun {
        if request.mode == ContentMode::Regex {
            warn!("Line scanner does not support regular expressions");
            return BackendRun::failed(Vec::new());
        }

        let request = request.clone();
        run_blocking_scan(self.timeout, move |cancel| {
            let results = scan_content(&request, cancel);
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
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn setup_test_dir() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello world\nsecond line\n").unwrap();
        fs::write(dir.path().join("b.md"), "hello markdown\n").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/lib.rs"),
            "fn concatenate() {}\nlet the cat sat = 1;\nHELLO again\n",
        )
        .unwrap();
        fs::write(dir.path().join("logo.png"), "hello in a binary").unwrap();
        dir
    }

    fn request(root: &Path, query: &str) -> ContentSearchRequest {
        ContentSearchRequest {
            query: query.to_string(),
            root: root.to_path_buf(),
            case_sensitive: false,
            whole_word: false,
            file_pattern: None,
            limit: 50,
            mode: ContentMode::Literal,
        }
    }

    #[test]
    fn test_file_pattern_restricts_candidates() {
        let dir = setup_test_dir();
        let mut req = request(dir.path(), "hello");
        req.file_pattern = Some("*.txt".to_string());

        let results = scan_content(&req, &CancellationToken::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, dir.path().join("a.txt"));
        assert_eq!(results[0].line, Some(1));
        assert_eq!(results[0].column, Some(1));
        assert_eq!(results[0].snippet, "hello world");
    }

    #[test]
    fn test_whole_word_matching() {
        let dir = setup_test_dir();
        let mut req = request(dir.path(), "cat");
        req.whole_word = true;

        let results = scan_content(&req, &CancellationToken::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].snippet, "let the cat sat = 1;");
        assert_eq!(results[0].line, Some(2));

        req.whole_word = false;
        let results = scan_content(&req, &CancellationToken::new());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_case_sensitivity() {
        let dir = setup_test_dir();
        let mut req = request(dir.path(), "HELLO");
        req.case_sensitive = true;
        assert_eq!(scan_content(&req, &CancellationToken::new()).len(), 1);

        req.case_sensitive = false;
        assert_eq!(scan_content(&req, &CancellationToken::new()).len(), 3);
    }

    #[test]
    fn test_stops_at_limit() {
        let dir = tempdir().unwrap();
        let body: String = (0..100).map(|i| format!("match {i}\n")).collect();
        fs::write(dir.path().join("many.txt"), &body).unwrap();
        fs::write(dir.path().join("more.txt"), &body).unwrap();

        let mut req = request(dir.path(), "match");
        req.limit = 7;
        assert_eq!(scan_content(&req, &CancellationToken::new()).len(), 7);
    }

    #[test]
    fn test_matches_inside_build_and_dot_dirs() {
        let dir = tempdir().unwrap();
        for sub in ["build", "dist", "venv", ".config", "src", ".git"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("out.log"), "needle here\n").unwrap();
        }

        let results = scan_content(&request(dir.path(), "needle"), &CancellationToken::new());
        assert_eq!(results.len(), 5);
        assert!(
            results
                .iter()
                .all(|r| !r.path.components().any(|c| c.as_os_str() == ".git"))
        );
    }

    #[test]
    fn test_large_file_is_scanned() {
        let dir = tempdir().unwrap();
        let filler = "padding line without the word\n".repeat(200_000);
        let mut body = filler.into_bytes();
        assert!(body.len() > 5 * 1024 * 1024);
        body.extend_from_slice(b"the needle at the end\r\n");
        fs::write(dir.path().join("huge.txt"), &body).unwrap();

        let results = scan_content(&request(dir.path(), "needle"), &CancellationToken::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].line, Some(200_001));
        assert_eq!(results[0].snippet, "the needle at the end");
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("latin1.txt"), b"caf\xe9 needle\n").unwrap();

        let results =
            scan_content(&request(dir.path(), "needle"), &CancellationToken::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].line, Some(1));
    }

    #[test]
    fn test_line_matcher_whole_word_column() {
        let mut req = request(Path::new("/"), "cat");
        req.whole_word = true;
        let matcher = LineMatcher::new(&req);

        assert_eq!(matcher.find("the cat sat"), Some(Some(5)));
        assert_eq!(matcher.find("concatenate"), None);
    }

    #[tokio::test]
    async fn test_scanner_rejects_regex_mode() {
        let dir = setup_test_dir();
        let mut req = request(dir.path(), "hel+o");
        req.mode = ContentMode::Regex;

        let run = LineScanner::new(Duration::from_secs(5)).search(&req).await;
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.results.is_empty());
    }

    #[tokio::test]
    async fn test_scanner_reports_completed_run() {
        let dir = setup_test_dir();
        let run = LineScanner::new(Duration::from_secs(5))
            .search(&request(dir.path(), "second"))
            .await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].path, PathBuf::from(dir.path().join("a.txt")));
    }
}
