//! Single-path metadata lookup (`get_file_info`).

use crate::error::{Result, SearchError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncReadExt;

/// Number of leading lines shown for text files.
pub const PREVIEW_LINES: usize = 10;

/// Upper bound on bytes read to build a preview.
const PREVIEW_READ_LIMIT: u64 = 64 * 1024;

/// Extensions previewed even when MIME detection does not say `text/*`.
const PREVIEW_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "md", "txt", "json", "yaml", "yml", "toml", "rs",
];

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub mime_type: String,
    /// Octal permission bits, e.g. `644`. Unix only.
    pub permissions: Option<String>,
    pub parent: Option<PathBuf>,
    pub name: String,
    pub extension: Option<String>,
    pub stem: Option<String>,
    pub preview: Option<Preview>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Preview {
    pub lines: Vec<String>,
    pub truncated: bool,
}

/// Collect metadata for `path`. A missing path is [`SearchError::NotFound`].
pub async fn get_file_info(path: &Path) -> Result<FileInfo> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SearchError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let is_dir = metadata.is_dir();
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_string());
    let mime_type = detect_mime(path, is_dir, extension.as_deref());

    let preview = if !is_dir && is_previewable(&mime_type, extension.as_deref()) {
        read_preview(path).await.ok()
    } else {
        None
    };

    Ok(FileInfo {
        path: path.to_path_buf(),
        is_dir,
        size: metadata.len(),
        modified: metadata.modified().ok().map(to_utc),
        created: metadata.created().ok().map(to_utc),
        accessed: metadata.accessed().ok().map(to_utc),
        mime_type,
        permissions: permission_bits(&metadata),
        parent: path.parent().map(Path::to_path_buf),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        extension,
        stem: path.file_stem().map(|s| s.to_string_lossy().to_string()),
        preview,
    })
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

fn detect_mime(path: &Path, is_dir: bool, extension: Option<&str>) -> String {
    if is_dir {
        return "inode/directory".to_string();
    }
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }
    match extension {
        Some(ext) if !ext.is_empty() => format!("application/{}", ext.to_lowercase()),
        _ => "application/octet-stream".to_string(),
    }
}

fn is_previewable(mime_type: &str, extension: Option<&str>) -> bool {
    mime_type.starts_with("text/")
        || extension
            .map(|ext| PREVIEW_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
}

#[cfg(unix)]
fn permission_bits(metadata: &std::fs::Metadata) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    Some(format!("{:03o}", metadata.permissions().mode() & 0o777))
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &std::fs::Metadata) -> Option<String> {
    None
}

async fn read_preview(path: &Path) -> std::io::Result<Preview> {
    let file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::new();
    file.take(PREVIEW_READ_LIMIT).read_to_end(&mut buf).await?;
    let text = String::from_utf8_lossy(&buf);

    let mut lines = text.lines();
    let head: Vec<String> = lines
        .by_ref()
        .take(PREVIEW_LINES)
        .map(|l| l.trim_end().to_string())
        .collect();
    let truncated = lines.next().is_some();

    Ok(Preview {
        lines: head,
        truncated,
    })
}
