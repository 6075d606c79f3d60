// storage/src/db.rs

use crate::{StorageError, StorageResult};
use chain_core::store::StateStore;
use chain_core::{CoreError, CoreResult};
use rocksdb::{Direction, IteratorMode, Options, DB};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub create_if_missing: bool,
    pub max_open_files: i32,
    pub write_buffer_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
            create_if_missing: true,
            max_open_files: 1024,
            write_buffer_size: 64 * 1024 * 1024, // 64 MB
        }
    }
}

/// RocksDB-backed state store.
///
/// All consensus entities share one flat keyspace; prefix iteration relies
/// on RocksDB's native key ordering, which matches the in-memory store.
pub struct Database {
    db: DB,
}

impl Database {
    /// Open or create the database
    pub fn open(config: &DatabaseConfig) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);

        let db = DB::open(&opts, &config.path)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        tracing::info!("Database opened at {}", config.path);
        Ok(Self { db })
    }
}

impl StateStore for Database {
    fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> CoreResult<()> {
        self.db
            .put(key, value)
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.db
            .delete(key)
            .map_err(|e| CoreError::Store(e.to_string()))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> CoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut entries = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(|e| CoreError::Store(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }
}
