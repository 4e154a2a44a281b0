//! Search dispatch: cache lookup, backend selection, normalization and
//! cache fill for every search operation.

use crate::cache::QueryCache;
use crate::config::SearchConfig;
use crate::descriptor::QueryDescriptor;
use localsearch_tools::{
    BackendKind, BackendRun, CancellationToken, Capability, CapabilityDetector,
    ContentSearchBackend, FdBackend, FileInfo, FileSearchBackend, FindRequest, FuzzyFileScanner,
    LineScanner, Result, RipgrepBackend, RunStatus, SearchError, SearchResult, get_file_info,
    normalize_file_types,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound applied to every requested limit.
pub const MAX_RESULT_LIMIT: usize = 10_000;

pub const REGEX_REQUIRES_RIPGREP: &str =
    "Regular expression search requires ripgrep (rg) to be installed";

/// Which path produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "backend", rename_all = "snake_case")]
pub enum ServedBy {
    Cache,
    Native(BackendKind),
    Fallback(BackendKind),
    Filesystem,
    Unsupported,
}

impl fmt::Display for ServedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServedBy::Cache => write!(f, "cache"),
            ServedBy::Native(kind) => write!(f, "{}", kind.name()),
            ServedBy::Fallback(kind) => write!(f, "fallback ({})", kind.name()),
            ServedBy::Filesystem => write!(f, "filesystem"),
            ServedBy::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Normalized results of one operation.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub served_by: ServedBy,
    pub status: RunStatus,
    /// Root the search ran under, used to shorten paths when formatting.
    pub root: PathBuf,
    /// Explanation shown instead of results, e.g. for unsupported searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    pub query: String,
    pub directory: Option<PathBuf>,
    pub file_types: Vec<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    pub query: String,
    pub directory: Option<PathBuf>,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub file_pattern: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RegexQuery {
    pub pattern: String,
    pub directory: Option<PathBuf>,
    pub file_pattern: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub directory: Option<PathBuf>,
    pub name_pattern: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub file_types: Vec<String>,
    pub limit: usize,
}

pub struct SearchDispatcher {
    detector: Arc<CapabilityDetector>,
    cache: QueryCache,
    config: SearchConfig,
}

impl SearchDispatcher {
    pub fn new(detector: Arc<CapabilityDetector>, cache: QueryCache, config: SearchConfig) -> Self {
        Self {
            detector,
            cache,
            config,
        }
    }

    pub fn detector(&self) -> &CapabilityDetector {
        &self.detector
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Directory a request runs under: the explicit one, else the configured
    /// root, else the working directory. Must exist and be a directory.
    pub fn resolve_root(&self, directory: Option<&Path>) -> Result<PathBuf> {
        let requested = match directory.or(self.config.search_root.as_deref()) {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        if !requested.is_dir() {
            return Err(SearchError::InvalidInput(format!(
                "Directory not found: {}",
                requested.display()
            )));
        }
        Ok(canonical(&requested))
    }

    /// Fuzzy file-name search.
    pub async fn search_files(&self, query: FileQuery) -> Result<SearchOutcome> {
        let text = require_text("query", &query.query)?;
        let limit = check_limit(query.limit)?;
        let root = self.resolve_root(query.directory.as_deref())?;
        let descriptor = QueryDescriptor::files(
            text,
            root,
            normalize_file_types(&query.file_types),
            limit,
        );

        if let Some(outcome) = self.cached(&descriptor) {
            return Ok(outcome);
        }

        let timeout = self.config.file_timeout();
        let backend: Box<dyn FileSearchBackend> =
            match self.detector.locate(Capability::FileSearch) {
                Some(program) => Box::new(FdBackend::new(program, timeout)),
                None => Box::new(FuzzyFileScanner::new(timeout)),
            };
        debug!(backend = backend.kind().name(), query = text, "Dispatching file search");

        let run = backend.search(&descriptor.file_request()).await;
        Ok(self.finish(descriptor, backend.kind(), run, self.config.file_ttl()))
    }

    /// Literal content search.
    pub async fn search_content(&self, query: ContentQuery) -> Result<SearchOutcome> {
        let text = require_text("query", &query.query)?;
        let limit = check_limit(query.limit)?;
        let root = self.resolve_root(query.directory.as_deref())?;
        let descriptor = QueryDescriptor::content(
            text,
            root,
            query.case_sensitive,
            query.whole_word,
            query.file_pattern.as_deref(),
            limit,
        );

        if let Some(outcome) = self.cached(&descriptor) {
            return Ok(outcome);
        }

        let backend = self.content_backend();
        debug!(backend = backend.kind().name(), query = text, "Dispatching content search");

        let run = backend.search(&descriptor.content_request()).await;
        Ok(self.finish(descriptor, backend.kind(), run, self.config.content_ttl()))
    }

    /// Regular expression search. Only served natively; there is no
    /// substring fallback.
    pub async fn search_regex(&self, query: RegexQuery) -> Result<SearchOutcome> {
        let pattern = require_text("pattern", &query.pattern)?;
        regex::Regex::new(pattern).map_err(|e| {
            SearchError::InvalidInput(format!("Invalid regular expression: {}", e))
        })?;
        let limit = check_limit(query.limit)?;
        let root = self.resolve_root(query.directory.as_deref())?;
        let descriptor =
            QueryDescriptor::regex(pattern, root, query.file_pattern.as_deref(), limit);

        if let Some(outcome) = self.cached(&descriptor) {
            return Ok(outcome);
        }

        let Some(program) = self.detector.locate(Capability::ContentSearch) else {
            info!("Regex search requested without ripgrep");
            return Ok(SearchOutcome {
                results: Vec::new(),
                served_by: ServedBy::Unsupported,
                status: RunStatus::Failed,
                root: descriptor.root,
                message: Some(REGEX_REQUIRES_RIPGREP.to_string()),
            });
        };

        let backend = RipgrepBackend::new(program, self.config.content_timeout());
        let run = backend.search(&descriptor.content_request()).await;
        Ok(self.finish(descriptor, backend.kind(), run, self.config.content_ttl()))
    }

    /// Metadata filter over the tree. Never cached and never shells out.
    pub async fn find_files(&self, query: FindQuery) -> Result<SearchOutcome> {
        let limit = check_limit(query.limit)?;
        if let (Some(min), Some(max)) = (query.min_size, query.max_size)
            && min > max
        {
            return Err(SearchError::InvalidInput(format!(
                "min_size ({}) is larger than max_size ({})",
                min, max
            )));
        }
        let root = self.resolve_root(query.directory.as_deref())?;
        let request = FindRequest {
            root: root.clone(),
            name_pattern: query
                .name_pattern
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "*".to_string()),
            min_size: query.min_size,
            max_size: query.max_size,
            file_types: normalize_file_types(&query.file_types),
            limit,
        };

        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();
        let worker_flag = cancel.clone();
        let results = tokio::task::spawn_blocking(move || {
            localsearch_tools::find_files(&request, &worker_flag)
        })
        .await
        .map_err(|e| SearchError::Io(std::io::Error::other(e)))?;

        Ok(SearchOutcome {
            results,
            served_by: ServedBy::Filesystem,
            status: RunStatus::Completed,
            root,
            message: None,
        })
    }

    /// Metadata for a single path. Relative paths resolve against the
    /// configured search root.
    pub async fn get_file_info(&self, file_path: &str) -> Result<FileInfo> {
        let file_path = require_text("file_path", file_path)?;
        let path = PathBuf::from(file_path);
        let path = if path.is_absolute() {
            path
        } else {
            match &self.config.search_root {
                Some(root) => root.join(path),
                None => std::env::current_dir()?.join(path),
            }
        };
        get_file_info(&path).await
    }

    fn content_backend(&self) -> Box<dyn ContentSearchBackend> {
        let timeout = self.config.content_timeout();
        match self.detector.locate(Capability::ContentSearch) {
            Some(program) => Box::new(RipgrepBackend::new(program, timeout)),
            None => Box::new(LineScanner::new(timeout)),
        }
    }

    fn cached(&self, descriptor: &QueryDescriptor) -> Option<SearchOutcome> {
        let mut results = self.cache.get(descriptor)?;
        results.truncate(descriptor.limit);
        debug!(kind = descriptor.kind.as_str(), "Serving search from cache");
        Some(SearchOutcome {
            results,
            served_by: ServedBy::Cache,
            status: RunStatus::Completed,
            root: descriptor.root.clone(),
            message: None,
        })
    }

    fn finish(
        &self,
        descriptor: QueryDescriptor,
        kind: BackendKind,
        run: BackendRun,
        ttl: Duration,
    ) -> SearchOutcome {
        let cacheable = run.is_cacheable();
        let status = run.status;
        let results = normalize_results(run.results, descriptor.limit);
        if cacheable {
            self.cache.put(&descriptor, &results, ttl);
        }

        let served_by = if kind.is_native() {
            ServedBy::Native(kind)
        } else {
            ServedBy::Fallback(kind)
        };
        info!(
            kind = descriptor.kind.as_str(),
            served_by = %served_by,
            status = ?status,
            count = results.len(),
            "Search finished"
        );

        SearchOutcome {
            results,
            served_by,
            status,
            root: descriptor.root,
            message: None,
        }
    }
}

/// Drop repeated `(path, line, column)` hits, keeping the first, and cap
/// at `limit`.
pub fn normalize_results(results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(results.len().min(limit));
    for result in results {
        if unique.len() >= limit {
            break;
        }
        let (path, line, column) = result.identity();
        if seen.insert((path.clone(), line, column)) {
            unique.push(result);
        }
    }
    unique
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(SearchError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value)
}

fn check_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(SearchError::InvalidInput(
            "limit must be greater than zero".to_string(),
        ));
    }
    Ok(limit.min(MAX_RESULT_LIMIT))
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
