use super::FileSearchBackend;
use crate::fuzzy::partial_ratio;
use crate::model::{BackendKind, BackendRun, FileSearchRequest, SearchResult};
use crate::process::{LineControl, StreamEnd, run_streaming};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// File-name search through `fd` (or `fdfind`).
#[derive(Debug, Clone)]
pub struct FdBackend {
    program: PathBuf,
    timeout: Duration,
}

impl FdBackend {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Argument vector for `request`. The query always follows `--`.
    pub fn build_args(request: &FileSearchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--type".into(),
            "f".into(),
            "--absolute-path".into(),
            "--ignore-case".into(),
            "--fixed-strings".into(),
            "--max-results".into(),
            request.limit.to_string().into(),
        ];
        for ext in &request.file_types {
            args.push("--extension".into());
            args.push(ext.into());
        }
        args.push("--".into());
        args.push(request.query.clone().into());
        args.push(request.root.clone().into_os_string());
        args
    }
}

/// Score one line of `fd` output against `query`. Blank lines yield `None`.
pub fn parse_fd_line(line: &str, query: &str) -> Option<SearchResult> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }
    let path = Path::new(line);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Some(SearchResult::file(path, partial_ratio(query, &name)))
}

/// Turn `fd` output (one path per line) into scored results, best first.
pub fn parse_fd_output(stdout: &str, query: &str) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = stdout
        .lines()
        .filter_map(|line| parse_fd_line(line, query))
        .collect();
    rank(&mut results);
    results
}

fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[async_trait]
impl FileSearchBackend for FdBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fd
    }

    async fn search(&self, request: &FileSearchRequest) -> BackendRun {
        let args = Self::build_args(request);
        debug!(program = %self.program.display(), ?args, "Running fd");

        let mut results = Vec::new();
        let end = run_streaming(&self.program, &args, self.timeout, |line| {
            if let Some(result) = parse_fd_line(line, &request.query) {
                results.push(result);
                if results.len() >= request.limit {
                    return LineControl::Stop;
                }
            }
            LineControl::Continue
        })
        .await;
        rank(&mut results);

        match end {
            Ok(StreamEnd::Exited { status, stderr }) => {
                if status.success() {
                    BackendRun::completed(results)
                } else {
                    warn!(
                        exit_code = ?status.code(),
                        stderr = %String::from_utf8_lossy(&stderr).trim(),
                        "fd exited with an error"
                    );
                    BackendRun::failed(results)
                }
            }
            Ok(StreamEnd::Stopped) => BackendRun::completed(results),
            Ok(StreamEnd::TimedOut) => BackendRun::timed_out(),
            Err(e) => {
                warn!(error = %e, "Failed to run fd");
                BackendRun::failed(Vec::new())
            }
        }
    }
}
