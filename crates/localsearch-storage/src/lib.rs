//! LocalSearch Storage - Low-level persistence for the search cache
//!
//! This crate provides the persistence layer for LocalSearch, using redb as
//! the embedded database. It exposes byte-level APIs so that it does not need
//! to know about the search result model; the core crate serializes results
//! before handing them over.
//!
//! # Tables
//!
//! - `query_cache` - Cached search results keyed by query descriptor hash

pub mod query_cache;
pub mod time_utils;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use query_cache::{CacheRecord, QueryCacheStorage};

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    pub query_cache: QueryCacheStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path.as_ref())?);
        Self::from_db(db)
    }

    /// Create a storage instance that lives only in memory.
    ///
    /// Used when the cache file cannot be opened and in tests.
    pub fn in_memory() -> Result<Self> {
        let db = Arc::new(
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?,
        );
        Self::from_db(db)
    }

    fn from_db(db: Arc<Database>) -> Result<Self> {
        let query_cache = QueryCacheStorage::new(db)?;
        Ok(Self { query_cache })
    }
}
