//! TTL query cache over the redb-backed storage.
//!
//! The cache never fails a search: storage or decoding problems are logged
//! and behave like a miss. Concurrent identical queries are not coalesced;
//! whichever finishes last wins the slot.

use crate::descriptor::QueryDescriptor;
use localsearch_storage::QueryCacheStorage;
use localsearch_storage::time_utils::now_ms;
use localsearch_tools::SearchResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        now_ms()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(AtomicI64::new(start_ms))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct QueryCache {
    storage: QueryCacheStorage,
    clock: Arc<dyn Clock>,
    enabled: bool,
}

impl QueryCache {
    pub fn new(storage: QueryCacheStorage) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: QueryCacheStorage, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            enabled: true,
        }
    }

    /// Turn lookups into misses and stores into no-ops.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Results for `descriptor` if a live entry exists.
    pub fn get(&self, descriptor: &QueryDescriptor) -> Option<Vec<SearchResult>> {
        if !self.enabled {
            return None;
        }
        let key = descriptor.cache_key();
        let record = match self.storage.get(&key, self.clock.now_ms()) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&record.payload) {
            Ok(results) => {
                debug!(key = %key, "Cache hit");
                Some(results)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                if let Err(e) = self.storage.delete(&key) {
                    warn!(key = %key, error = %e, "Failed to delete undecodable cache entry");
                }
                None
            }
        }
    }

    /// Insert or replace the entry for `descriptor`, live for `ttl`.
    pub fn put(&self, descriptor: &QueryDescriptor, results: &[SearchResult], ttl: Duration) {
        if !self.enabled || ttl.is_zero() {
            return;
        }
        let key = descriptor.cache_key();
        let payload = match serde_json::to_vec(results) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let created = self.clock.now_ms();
        let expires = created.saturating_add(ttl.as_millis() as i64);
        if let Err(e) = self.storage.put(&key, &payload, created, expires) {
            warn!(key = %key, error = %e, "Failed to store cache entry");
        } else {
            debug!(key = %key, count = results.len(), ttl_secs = ttl.as_secs(), "Cached results");
        }
    }

    /// Physically remove expired entries.
    pub fn prune(&self) -> anyhow::Result<usize> {
        self.storage.cleanup_expired(self.clock.now_ms())
    }

    pub fn clear(&self) -> anyhow::Result<usize> {
        self.storage.clear()
    }

    /// Stored entries, including ones that expired but were not yet pruned.
    pub fn len(&self) -> anyhow::Result<usize> {
        self.storage.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localsearch_storage::Storage;
    use std::path::PathBuf;

    fn setup() -> (QueryCache, Arc<ManualClock>) {
        let storage = Storage::in_memory().unwrap();
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = QueryCache::with_clock(storage.query_cache.clone(), clock.clone());
        (cache, clock)
    }

    fn descriptor(query: &str) -> QueryDescriptor {
        QueryDescriptor::files(query, PathBuf::from("/repo"), vec![], 20)
    }

    fn results() -> Vec<SearchResult> {
        vec![
            SearchResult::file("/repo/README.md", 100.0),
            SearchResult::line_match("/repo/a.txt", 3, Some(2), "hello"),
        ]
    }

    #[test]
    fn test_hit_returns_identical_results() {
        let (cache, _) = setup();
        cache.put(&descriptor("readme"), &results(), Duration::from_secs(300));
        assert_eq!(cache.get(&descriptor("readme")), Some(results()));
    }

    #[test]
    fn test_entry_dies_at_expiry() {
        let (cache, clock) = setup();
        cache.put(&descriptor("readme"), &results(), Duration::from_secs(300));

        clock.advance(Duration::from_millis(299_999));
        assert!(cache.get(&descriptor("readme")).is_some());

        clock.advance(Duration::from_millis(2));
        assert!(cache.get(&descriptor("readme")).is_none());
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_put_replaces_previous_results() {
        let (cache, _) = setup();
        cache.put(&descriptor("readme"), &results(), Duration::from_secs(300));
        cache.put(&descriptor("readme"), &[], Duration::from_secs(300));
        assert_eq!(cache.get(&descriptor("readme")), Some(vec![]));
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let (mut cache, _) = setup();
        cache.set_enabled(false);
        cache.put(&descriptor("readme"), &results(), Duration::from_secs(300));
        assert!(cache.get(&descriptor("readme")).is_none());
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let (cache, clock) = setup();
        cache.put(&descriptor("short"), &results(), Duration::from_secs(1));
        cache.put(&descriptor("long"), &results(), Duration::from_secs(600));

        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.prune().unwrap(), 1);
        assert!(cache.get(&descriptor("long")).is_some());
    }

    #[test]
    fn test_zero_ttl_is_not_stored() {
        let (cache, _) = setup();
        cache.put(&descriptor("readme"), &results(), Duration::ZERO);
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_undecodable_entry_is_a_miss_and_removed() {
        let (cache, clock) = setup();
        let key = descriptor("readme").cache_key();
        let now = clock.now_ms();
        cache
            .storage
            .put(&key, b"not json", now, now + 300_000)
            .unwrap();
        assert_eq!(cache.len().unwrap(), 1);

        assert!(cache.get(&descriptor("readme")).is_none());
        assert_eq!(cache.len().unwrap(), 0);
    }
}
