//! Plain-text rendering of search outcomes for agents and terminals.

use crate::dispatcher::SearchOutcome;
use crate::watch::{WatchEntry, WatchOutcome};
use chrono::{DateTime, Local, Utc};
use localsearch_tools::{FileInfo, RunStatus, SearchResult};
use std::fmt::Write;
use std::path::Path;

/// Content snippets longer than this are cut to `MAX_SNIPPET_CHARS - 3`
/// characters plus an ellipsis.
pub const MAX_SNIPPET_CHARS: usize = 100;

/// Size and modification time shown under each file result.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Stat every result path on tokio's blocking pool, in result order.
/// Paths that vanished or cannot be read yield `None`.
pub async fn stat_results(results: &[SearchResult]) -> Vec<Option<FileStat>> {
    let mut stats = Vec::with_capacity(results.len());
    for result in results {
        let stat = tokio::fs::metadata(&result.path)
            .await
            .ok()
            .map(|metadata| FileStat {
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        stats.push(stat);
    }
    stats
}

/// `stats` lines up with `outcome.results`; see [`stat_results`].
pub fn format_file_results(outcome: &SearchOutcome, stats: &[Option<FileStat>]) -> String {
    if let Some(message) = &outcome.message {
        return message.clone();
    }
    if outcome.results.is_empty() {
        return with_status_note("No files found.".to_string(), outcome.status);
    }

    let mut out = format!(
        "Found {} files (backend: {}):\n\n",
        outcome.results.len(),
        outcome.served_by
    );
    for (i, result) in outcome.results.iter().enumerate() {
        let _ = writeln!(out, "{:2}. {}", i + 1, result.path.display());
        if let Some(Some(stat)) = stats.get(i) {
            let _ = writeln!(
                out,
                "    Size: {} bytes | Modified: {}",
                group_thousands(stat.size),
                optional_time(stat.modified)
            );
        }
        if result.score > 0.0 {
            let _ = writeln!(out, "    Score: {:.1}%", result.score);
        }
        out.push('\n');
    }
    with_status_note(out, outcome.status)
}

pub fn format_content_results(outcome: &SearchOutcome) -> String {
    if let Some(message) = &outcome.message {
        return message.clone();
    }
    if outcome.results.is_empty() {
        return with_status_note("No matches found.".to_string(), outcome.status);
    }

    let mut out = format!(
        "Found {} matches (backend: {}):\n\n",
        outcome.results.len(),
        outcome.served_by
    );
    for (i, result) in outcome.results.iter().enumerate() {
        let shown = result
            .path
            .strip_prefix(&outcome.root)
            .unwrap_or(&result.path);
        let _ = write!(out, "{:2}. {}", i + 1, shown.display());
        if let Some(line) = result.line {
            let _ = write!(out, ":{}", line);
        }
        if let Some(column) = result.column {
            let _ = write!(out, ":{}", column);
        }
        out.push('\n');
        if !result.snippet.is_empty() {
            let _ = writeln!(out, "    {}", truncate_snippet(&result.snippet));
        }
        out.push('\n');
    }
    with_status_note(out, outcome.status)
}

pub fn format_file_info(info: &FileInfo) -> String {
    let mut out = format!("File Information: {}\n\n", info.path.display());

    out.push_str("Basic Info:\n");
    let _ = writeln!(out, "  Size: {} bytes", group_thousands(info.size));
    let _ = writeln!(out, "  Modified: {}", optional_time(info.modified));
    let _ = writeln!(out, "  Created: {}", optional_time(info.created));
    let _ = writeln!(out, "  Type: {}", info.mime_type);
    if let Some(permissions) = &info.permissions {
        let _ = writeln!(out, "  Permissions: {}", permissions);
    }

    out.push_str("\nPath Info:\n");
    let _ = writeln!(
        out,
        "  Directory: {}",
        info.parent
            .as_deref()
            .map(Path::display)
            .map(|d| d.to_string())
            .unwrap_or_default()
    );
    let _ = writeln!(out, "  Name: {}", info.name);
    let _ = writeln!(
        out,
        "  Extension: {}",
        info.extension
            .as_deref()
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    );
    let _ = writeln!(out, "  Stem: {}", info.stem.as_deref().unwrap_or_default());

    if let Some(preview) = &info.preview {
        out.push_str("\nContent Preview:");
        for (i, line) in preview.lines.iter().enumerate() {
            let _ = write!(out, "\n  {:3}: {}", i + 1, line);
        }
        if preview.truncated {
            out.push_str("\n  ... (truncated)");
        }
        out.push('\n');
    }
    out
}

pub fn format_watch_outcome(outcome: &WatchOutcome) -> String {
    match outcome {
        WatchOutcome::Started(entry) => format!(
            "Started watching directory: {}\nRecursive: {}",
            entry.path.display(),
            entry.recursive
        ),
        WatchOutcome::AlreadyWatching(entry) => {
            format!("Already watching: {}", entry.path.display())
        }
    }
}

pub fn format_watch_list(entries: &[WatchEntry]) -> String {
    if entries.is_empty() {
        return "Not watching any directories.".to_string();
    }
    let mut out = format!("Watching {} directories:\n", entries.len());
    for entry in entries {
        let _ = writeln!(
            out,
            "  {}{}",
            entry.path.display(),
            if entry.recursive { " (recursive)" } else { "" }
        );
    }
    out
}

/// Cut `snippet` to at most [`MAX_SNIPPET_CHARS`] characters.
pub fn truncate_snippet(snippet: &str) -> String {
    if snippet.chars().count() <= MAX_SNIPPET_CHARS {
        return snippet.to_string();
    }
    let kept: String = snippet.chars().take(MAX_SNIPPET_CHARS - 3).collect();
    format!("{}...", kept)
}

fn with_status_note(mut out: String, status: RunStatus) -> String {
    match status {
        RunStatus::Completed => {}
        RunStatus::TimedOut => {
            out.push_str("\n(search timed out; results may be incomplete)");
        }
        RunStatus::Failed => {
            out.push_str("\n(search backend reported an error; results may be incomplete)");
        }
    }
    out
}

fn optional_time(time: Option<DateTime<Utc>>) -> String {
    time.map(format_time)
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
