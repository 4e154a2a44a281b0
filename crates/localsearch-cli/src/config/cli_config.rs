//! CLI configuration file support
//!
//! Loads configuration from ~/.config/localsearch/config.toml

use localsearch_core::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default settings
    #[serde(default)]
    pub default: DefaultConfig,
    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,
}

/// Default configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Default cache database path
    pub db_path: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(_) => Self::default(),
        }
    }

    fn parse(content: &str, path: &Path) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("localsearch").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CliConfig::load_from_path(Some(dir.path().join("config.toml")));
        assert_eq!(config.search, SearchConfig::default());
        assert!(config.default.db_path.is_none());
    }

    #[test]
    fn test_partial_search_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[default]\ndb_path = \"/tmp/x.redb\"\n\n[search]\ncache_ttl_secs = 60\nprefer_fallback = true\n",
        )
        .unwrap();

        let config = CliConfig::load_from_path(Some(path));
        assert_eq!(config.search.cache_ttl_secs, 60);
        assert!(config.search.prefer_fallback);
        assert_eq!(config.search.content_cache_ttl_secs, 300);
        assert_eq!(config.default.db_path, Some(PathBuf::from("/tmp/x.redb")));
    }

    #[test]
    fn test_invalid_toml_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search\ncache_ttl_secs = ").unwrap();

        let config = CliConfig::load_from_path(Some(path));
        assert_eq!(config.search, SearchConfig::default());
    }
}
