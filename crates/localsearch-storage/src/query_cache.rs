//! Query cache storage - byte-level API for cached search results.
//!
//! Each value is framed as `created_at_ms (i64 LE) | expires_at_ms (i64 LE) |
//! payload`. The payload is opaque to this crate.

use anyhow::Result;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use std::sync::Arc;
use tracing::debug;

/// Primary table: descriptor key -> framed result payload
const QUERY_CACHE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("query_cache");

const HEADER_LEN: usize = 16;

/// A decoded cache row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub payload: Vec<u8>,
}

impl CacheRecord {
    /// A record is live only while its expiry lies strictly in the future.
    pub fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }

    fn encode(created_at_ms: i64, expires_at_ms: i64, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&created_at_ms.to_le_bytes());
        bytes.extend_from_slice(&expires_at_ms.to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let mut created = [0_u8; 8];
        let mut expires = [0_u8; 8];
        created.copy_from_slice(&bytes[..8]);
        expires.copy_from_slice(&bytes[8..HEADER_LEN]);
        Some(Self {
            created_at_ms: i64::from_le_bytes(created),
            expires_at_ms: i64::from_le_bytes(expires),
            payload: bytes[HEADER_LEN..].to_vec(),
        })
    }
}

/// Low-level query cache storage with byte-level API.
#[derive(Clone)]
pub struct QueryCacheStorage {
    db: Arc<Database>,
}

impl QueryCacheStorage {
    /// Create a new QueryCacheStorage instance and initialize the table.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(QUERY_CACHE_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert or replace the entry for `key` in a single transaction.
    pub fn put(
        &self,
        key: &str,
        payload: &[u8],
        created_at_ms: i64,
        expires_at_ms: i64,
    ) -> Result<()> {
        let bytes = CacheRecord::encode(created_at_ms, expires_at_ms, payload);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(QUERY_CACHE_TABLE)?;
            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Return the live record for `key`.
    ///
    /// Dead or undecodable rows are removed on the way out and reported as a
    /// miss.
    pub fn get(&self, key: &str, now_ms: i64) -> Result<Option<CacheRecord>> {
        let record = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(QUERY_CACHE_TABLE)?;
            let value = table.get(key)?;
            match value {
                Some(value) => CacheRecord::decode(value.value()),
                None => return Ok(None),
            }
        };

        match record {
            Some(record) if record.is_live(now_ms) => Ok(Some(record)),
            _ => {
                self.remove_if_dead(key, now_ms)?;
                Ok(None)
            }
        }
    }

    /// Remove `key` unless a concurrent writer has replaced it with a live row.
    fn remove_if_dead(&self, key: &str, now_ms: i64) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(QUERY_CACHE_TABLE)?;
            let dead = match table.get(key)? {
                Some(value) => CacheRecord::decode(value.value())
                    .map(|record| !record.is_live(now_ms))
                    .unwrap_or(true),
                None => false,
            };
            if dead {
                table.remove(key)?;
                debug!(key, "Removed expired cache entry");
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete the entry for `key`. Returns true if it existed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(QUERY_CACHE_TABLE)?;
            table.remove(key)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Delete all entries with expires_at <= now_ms.
    /// Returns the number of deleted entries.
    pub fn cleanup_expired(&self, now_ms: i64) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUERY_CACHE_TABLE)?;

        let mut expired = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let dead = CacheRecord::decode(value.value())
                .map(|record| !record.is_live(now_ms))
                .unwrap_or(true);
            if dead {
                expired.push(key.value().to_string());
            }
        }
        drop(table);
        drop(read_txn);

        if expired.is_empty() {
            return Ok(0);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(QUERY_CACHE_TABLE)?;
            for key in &expired {
                table.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(expired.len())
    }

    /// Remove every entry. Returns the number of deleted entries.
    pub fn clear(&self) -> Result<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(QUERY_CACHE_TABLE)?;
            let mut keys = Vec::new();
            for entry in table.iter()? {
                let (key, _) = entry?;
                keys.push(key.value().to_string());
            }
            for key in &keys {
                table.remove(key.as_str())?;
            }
            keys.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Number of stored rows, live or not.
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUERY_CACHE_TABLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_storage() -> QueryCacheStorage {
        let db = Arc::new(
            Database::builder()
                .create_with_backend(redb::backends::InMemoryBackend::new())
                .unwrap(),
        );
        QueryCacheStorage::new(db).unwrap()
    }

    #[test]
    fn test_put_and_get_live_entry() {
        let storage = setup_storage();
        storage.put("key", b"payload", 1_000, 2_000).unwrap();

        let record = storage.get("key", 1_500).unwrap().unwrap();
        assert_eq!(record.created_at_ms, 1_000);
        assert_eq!(record.expires_at_ms, 2_000);
        assert_eq!(record.payload, b"payload".to_vec());
    }

    #[test]
    fn test_get_at_expiry_is_miss_and_removes_row() {
        let storage = setup_storage();
        storage.put("key", b"payload", 1_000, 2_000).unwrap();

        assert!(storage.get("key", 2_000).unwrap().is_none());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let storage = setup_storage();
        storage.put("key", b"old", 0, 100).unwrap();
        storage.put("key", b"new", 50, 500).unwrap();

        let record = storage.get("key", 200).unwrap().unwrap();
        assert_eq!(record.payload, b"new".to_vec());
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_key_is_miss() {
        let storage = setup_storage();
        assert!(storage.get("absent", 0).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_expired_only_removes_dead_rows() {
        let storage = setup_storage();
        storage.put("dead-1", b"a", 0, 100).unwrap();
        storage.put("dead-2", b"b", 0, 200).unwrap();
        storage.put("live", b"c", 0, 1_000).unwrap();

        let removed = storage.cleanup_expired(200).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.get("live", 200).unwrap().is_some());
    }

    #[test]
    fn test_clear_and_delete() {
        let storage = setup_storage();
        storage.put("a", b"1", 0, 100).unwrap();
        storage.put("b", b"2", 0, 100).unwrap();

        assert!(storage.delete("a").unwrap());
        assert!(!storage.delete("a").unwrap());
        assert_eq!(storage.clear().unwrap(), 1);
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_short_row_is_treated_as_dead() {
        let storage = setup_storage();
        let write_txn = storage.db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(QUERY_CACHE_TABLE).unwrap();
            table.insert("broken", [1_u8, 2, 3].as_slice()).unwrap();
        }
        write_txn.commit().unwrap();

        assert!(storage.get("broken", 0).unwrap().is_none());
        assert_eq!(storage.count().unwrap(), 0);
    }
}
