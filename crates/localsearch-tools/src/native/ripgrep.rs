use super::ContentSearchBackend;
use crate::model::{BackendKind, BackendRun, ContentMode, ContentSearchRequest, SearchResult};
use crate::process::{LineControl, StreamEnd, run_streaming};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Content search through `rg --json`.
#[derive(Debug, Clone)]
pub struct RipgrepBackend {
    program: PathBuf,
    timeout: Duration,
}

impl RipgrepBackend {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Argument vector for `request`. The pattern is passed with `--regexp`
    /// so it is never parsed as a flag; the root follows `--`.
    pub fn build_args(request: &ContentSearchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--json".into(),
            "--max-count".into(),
            request.limit.to_string().into(),
        ];
        if !request.case_sensitive {
            args.push("--ignore-case".into());
        }
        if request.whole_word {
            args.push("--word-regexp".into());
        }
        if request.mode == ContentMode::Literal {
            args.push("--fixed-strings".into());
        }
        if let Some(pattern) = &request.file_pattern {
            args.push("--glob".into());
            args.push(pattern.into());
        }
        args.push("--regexp".into());
        args.push(request.query.clone().into());
        args.push("--".into());
        args.push(request.root.clone().into_os_string());
        args
    }
}

#[derive(Deserialize)]
struct RgEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct RgMatch {
    path: RgData,
    #[serde(default)]
    lines: Option<RgData>,
    line_number: Option<u64>,
    #[serde(default)]
    submatches: Vec<RgSubmatch>,
}

/// rg reports non UTF-8 data as `{"bytes": ...}` instead of `{"text": ...}`.
#[derive(Deserialize)]
struct RgData {
    text: Option<String>,
}

#[derive(Deserialize)]
struct RgSubmatch {
    start: u64,
}

/// Parse one `rg --json` event line. Only `match` events become results;
/// blank lines, other event kinds and malformed JSON yield `None`.
pub fn parse_ripgrep_line(line: &str) -> Option<SearchResult> {
    if line.trim().is_empty() {
        return None;
    }
    let event: RgEvent = serde_json::from_str(line).ok()?;
    if event.kind != "match" {
        return None;
    }
    let m: RgMatch = serde_json::from_value(event.data).ok()?;
    let path = m.path.text?;
    let line_number = m.line_number?;
    let snippet = m
        .lines
        .and_then(|l| l.text)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    let column = m.submatches.first().map(|s| s.start + 1);
    Some(SearchResult::line_match(path, line_number, column, snippet))
}

/// Parse complete `rg --json` output; each line is parsed on its own.
pub fn parse_ripgrep_output(stdout: &str) -> Vec<SearchResult> {
    stdout.lines().filter_map(parse_ripgrep_line).collect()
}

#[async_trait]
impl ContentSearchBackend for RipgrepBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ripgrep
    }

    async fn search(&self, request: &ContentSearchRequest) -> BackendRun {
        let args = Self::build_args(request);
        debug!(program = %self.program.display(), ?args, "Running ripgrep");

        let mut results = Vec::new();
        let end = run_streaming(&self.program, &args, self.timeout, |line| {
            if let Some(result) = parse_ripgrep_line(line) {
                results.push(result);
                if results.len() >= request.limit {
                    return LineControl::Stop;
                }
            }
            LineControl::Continue
        })
        .await;

        match end {
            // Exit code 1 means "no matches".
            Ok(StreamEnd::Exited { status, stderr }) => match status.code() {
                Some(0) | Some(1) => BackendRun::completed(results),
                code => {
                    warn!(
                        exit_code = ?code,
                        stderr = %String::from_utf8_lossy(&stderr).trim(),
                        "ripgrep exited with an error"
                    );
                    BackendRun::failed(results)
                }
            },
            Ok(StreamEnd::Stopped) => {
                debug!(limit = request.limit, "Result limit reached, stopped ripgrep");
                BackendRun::completed(results)
            }
            Ok(StreamEnd::TimedOut) => BackendRun::timed_out(),
            Err(e) => {
                warn!(error = %e, "Failed to run ripgrep");
                BackendRun::failed(Vec::new())
            }
        }
    }
}
