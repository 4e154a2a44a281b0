//! Uniform result and request types shared by every backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One hit produced by a backend.
///
/// `line` and `column` are 1-based and absent for name-only results. A
/// `score` of 0 means no relevance score was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u64>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub score: f64,
}

impl SearchResult {
    /// A file-level result with a relevance score.
    pub fn file(path: impl Into<PathBuf>, score: f64) -> Self {
        Self {
            path: path.into(),
            line: None,
            column: None,
            snippet: String::new(),
            score: score.clamp(0.0, 100.0),
        }
    }

    /// A line-level content match.
    pub fn line_match(
        path: impl Into<PathBuf>,
        line: u64,
        column: Option<u64>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
            column,
            snippet: snippet.into(),
            score: 0.0,
        }
    }

    /// Identity used for deduplication.
    pub fn identity(&self) -> (&PathBuf, Option<u64>, Option<u64>) {
        (&self.path, self.line, self.column)
    }
}

/// Which implementation produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Fd,
    Ripgrep,
    FuzzyScan,
    LineScan,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Fd => "fd",
            BackendKind::Ripgrep => "ripgrep",
            BackendKind::FuzzyScan => "fuzzy-scan",
            BackendKind::LineScan => "line-scan",
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, BackendKind::Fd | BackendKind::Ripgrep)
    }
}

/// How a backend run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    TimedOut,
    Failed,
}

/// Results of one backend invocation together with how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRun {
    pub results: Vec<SearchResult>,
    pub status: RunStatus,
}

impl BackendRun {
    pub fn completed(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            status: RunStatus::Completed,
        }
    }

    /// A run cut off by its wall-clock limit. Anything received before the
    /// cut is dropped so a timeout always reads as "no results".
    pub fn timed_out() -> Self {
        Self {
            results: Vec::new(),
            status: RunStatus::TimedOut,
        }
    }

    pub fn failed(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            status: RunStatus::Failed,
        }
    }

    /// Only completed runs are safe to cache.
    pub fn is_cacheable(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// File-name search request.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSearchRequest {
    pub query: String,
    pub root: PathBuf,
    /// Lower-cased extensions without the leading dot. Empty means any.
    pub file_types: Vec<String>,
    pub limit: usize,
}

/// Interpretation of a content query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    Literal,
    Regex,
}

/// Content search request, shared by literal and regex search.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSearchRequest {
    pub query: String,
    pub root: PathBuf,
    pub case_sensitive: bool,
    pub whole_word: bool,
    /// Glob applied to candidate files. `None` means every file.
    pub file_pattern: Option<String>,
    pub limit: usize,
    pub mode: ContentMode,
}

/// Metadata filter request used by `find_files`.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequest {
    pub root: PathBuf,
    pub name_pattern: String,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub file_types: Vec<String>,
    pub limit: usize,
}

/// Normalize a user supplied extension list: lower-case, no leading dot,
/// sorted and deduplicated.
pub fn normalize_file_types<I, S>(types: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = types
        .into_iter()
        .map(|t| t.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}
