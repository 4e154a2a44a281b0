//! Normalized query descriptors and their cache keys.

use localsearch_tools::{ContentMode, ContentSearchRequest, FileSearchRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Bumped whenever the key layout or the cached payload shape changes.
const KEY_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Files,
    Content,
    Regex,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Files => "files",
            SearchKind::Content => "content",
            SearchKind::Regex => "regex",
        }
    }
}

/// Everything that determines the result of a cacheable search.
///
/// Two descriptors are cache-equivalent exactly when they compare equal.
/// Constructors normalize their inputs and reset fields that do not apply to
/// the search kind, so equal queries produce equal descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    pub kind: SearchKind,
    pub query: String,
    /// Canonicalized by the caller.
    pub root: PathBuf,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub file_pattern: Option<String>,
    pub file_types: Vec<String>,
    pub limit: usize,
}

impl QueryDescriptor {
    pub fn files(query: &str, root: PathBuf, file_types: Vec<String>, limit: usize) -> Self {
        Self {
            kind: SearchKind::Files,
            query: query.to_string(),
            root,
            case_sensitive: false,
            whole_word: false,
            file_pattern: None,
            file_types,
            limit,
        }
    }

    pub fn content(
        query: &str,
        root: PathBuf,
        case_sensitive: bool,
        whole_word: bool,
        file_pattern: Option<&str>,
        limit: usize,
    ) -> Self {
        Self {
            kind: SearchKind::Content,
            query: query.to_string(),
            root,
            case_sensitive,
            whole_word,
            file_pattern: normalize_file_pattern(file_pattern),
            file_types: Vec::new(),
            limit,
        }
    }

    pub fn regex(pattern: &str, root: PathBuf, file_pattern: Option<&str>, limit: usize) -> Self {
        Self {
            kind: SearchKind::Regex,
            query: pattern.to_string(),
            root,
            case_sensitive: true,
            whole_word: false,
            file_pattern: normalize_file_pattern(file_pattern),
            file_types: Vec::new(),
            limit,
        }
    }

    /// Stable cache key: version, kind and a SHA-256 over length-prefixed
    /// fields. Distinct descriptors cannot collide by concatenation.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hash_field(&mut hasher, self.kind.as_str().as_bytes());
        hash_field(&mut hasher, self.query.as_bytes());
        hash_field(&mut hasher, self.root.as_os_str().as_encoded_bytes());
        hash_field(&mut hasher, &[self.case_sensitive as u8, self.whole_word as u8]);
        match &self.file_pattern {
            Some(pattern) => {
                hash_field(&mut hasher, &[1]);
                hash_field(&mut hasher, pattern.as_bytes());
            }
            None => hash_field(&mut hasher, &[0]),
        }
        hash_field(&mut hasher, &(self.file_types.len() as u64).to_le_bytes());
        for file_type in &self.file_types {
            hash_field(&mut hasher, file_type.as_bytes());
        }
        hash_field(&mut hasher, &(self.limit as u64).to_le_bytes());

        format!(
            "{}:{}:{}",
            KEY_VERSION,
            self.kind.as_str(),
            hex::encode(hasher.finalize())
        )
    }

    pub fn file_request(&self) -> FileSearchRequest {
        FileSearchRequest {
            query: self.query.clone(),
            root: self.root.clone(),
            file_types: self.file_types.clone(),
            limit: self.limit,
        }
    }

    pub fn content_request(&self) -> ContentSearchRequest {
        ContentSearchRequest {
            query: self.query.clone(),
            root: self.root.clone(),
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
            file_pattern: self.file_pattern.clone(),
            limit: self.limit,
            mode: match self.kind {
                SearchKind::Regex => ContentMode::Regex,
                _ => ContentMode::Literal,
            },
        }
    }
}

fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Patterns that match every file collapse to `None`.
pub fn normalize_file_pattern(pattern: Option<&str>) -> Option<String> {
    let pattern = pattern?.trim();
    match pattern {
        "" | "*" | "**" | "**/*" => None,
        other => Some(other.to_string()),
    }
}
