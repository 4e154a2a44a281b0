use anyhow::Result;
use std::path::PathBuf;

const LOCALSEARCH_DIR: &str = ".localsearch";
const CACHE_DIR: &str = "cache";
const CACHE_DB_FILE: &str = "search_cache.redb";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the LocalSearch data directory.
pub const LOCALSEARCH_DIR_ENV: &str = "LOCALSEARCH_DIR";

/// Resolve the LocalSearch data directory.
/// Priority: LOCALSEARCH_DIR env var > ~/.localsearch/
pub fn resolve_localsearch_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(LOCALSEARCH_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(LOCALSEARCH_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the cache directory exists and return the database path:
/// ~/.localsearch/cache/search_cache.redb
pub fn ensure_cache_db_path() -> Result<PathBuf> {
    let dir = resolve_localsearch_dir()?.join(CACHE_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(CACHE_DB_FILE))
}

/// Get the logs directory: ~/.localsearch/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = resolve_localsearch_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
