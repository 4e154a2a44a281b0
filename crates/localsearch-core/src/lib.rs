//! LocalSearch Core - search dispatch, caching and the MCP surface
//!
//! Requests flow from the MCP server (or the CLI) into the
//! [`dispatcher::SearchDispatcher`], which picks a native tool when one is
//! installed and an in-process scanner otherwise, and remembers completed
//! results in a TTL [`cache::QueryCache`].

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod dispatcher;
pub mod format;
pub mod mcp;
pub mod paths;
pub mod watch;

pub use config::SearchConfig;
pub use dispatcher::{SearchDispatcher, SearchOutcome, ServedBy};
pub use watch::WatchRegistry;

use cache::QueryCache;
use localsearch_storage::Storage;
use localsearch_tools::CapabilityDetector;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state for one server or CLI invocation
pub struct SearchCore {
    pub storage: Arc<Storage>,
    pub dispatcher: SearchDispatcher,
    pub watches: WatchRegistry,
}

impl SearchCore {
    /// Open the cache at `db_path`, or the default location under the
    /// LocalSearch data directory.
    ///
    /// A cache file that cannot be opened (held by another process, corrupt,
    /// unwritable) is replaced by an in-memory cache for this run.
    pub fn new(config: SearchConfig, db_path: Option<&Path>) -> anyhow::Result<Self> {
        let opened = match db_path {
            Some(path) => Storage::new(path),
            None => paths::ensure_cache_db_path().and_then(Storage::new),
        };
        let storage = match opened {
            Ok(storage) => storage,
            Err(e) => {
                warn!(error = %e, "Failed to open search cache, using in-memory cache");
                Storage::in_memory()?
            }
        };

        let detector = if config.prefer_fallback {
            CapabilityDetector::fallback_only()
        } else {
            CapabilityDetector::new()
        };

        Ok(Self::with_parts(config, Arc::new(storage), detector))
    }

    /// Core backed by an in-memory cache and the given detector.
    pub fn in_memory(config: SearchConfig, detector: CapabilityDetector) -> anyhow::Result<Self> {
        Ok(Self::with_parts(
            config,
            Arc::new(Storage::in_memory()?),
            detector,
        ))
    }

    fn with_parts(
        config: SearchConfig,
        storage: Arc<Storage>,
        detector: CapabilityDetector,
    ) -> Self {
        let mut cache = QueryCache::new(storage.query_cache.clone());
        cache.set_enabled(config.cache_enabled);

        let detector = Arc::new(detector);
        for (capability, program) in detector.report() {
            match program {
                Some(path) => info!(
                    capability = capability.name(),
                    path = %path.display(),
                    "Native backend available"
                ),
                None => info!(
                    capability = capability.name(),
                    "Native backend unavailable, using fallback"
                ),
            }
        }

        Self {
            storage,
            dispatcher: SearchDispatcher::new(detector, cache, config),
            watches: WatchRegistry::new(),
        }
    }
}
