//! Runtime search settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Search settings shared by the dispatcher and the server.
///
/// Every field has a default so partial TOML sections deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory searched when a request names none. Defaults to the
    /// process working directory.
    pub search_root: Option<PathBuf>,
    /// Cache lifetime for file-name searches.
    pub cache_ttl_secs: u64,
    /// Cache lifetime for content and regex searches.
    pub content_cache_ttl_secs: u64,
    pub file_search_timeout_secs: u64,
    pub content_search_timeout_secs: u64,
    /// Ignore native executables and always use the in-process scanners.
    pub prefer_fallback: bool,
    pub cache_enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_root: None,
            cache_ttl_secs: 300,
            content_cache_ttl_secs: 300,
            file_search_timeout_secs: 30,
            content_search_timeout_secs: 60,
            prefer_fallback: false,
            cache_enabled: true,
        }
    }
}

impl SearchConfig {
    pub fn file_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn content_ttl(&self) -> Duration {
        Duration::from_secs(self.content_cache_ttl_secs)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_search_timeout_secs.max(1))
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_search_timeout_secs.max(1))
    }
}
