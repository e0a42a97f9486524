//! Storage and identity adapters implementing the domain ports.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod static_tokens;

use crate::domain::ports::Repositories;
use crate::error::Result;
use std::path::Path;

/// Picks the storage backend: RocksDB when a path is given and the feature is
/// compiled in, in-memory otherwise.
pub fn open_repositories(db_path: Option<&Path>) -> Result<Repositories> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            tracing::info!(path = %path.display(), "Using RocksDB storage");
            Ok(self::rocksdb::RocksDBStore::open(path)?.repositories())
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(in_memory::repositories())
        }
        None => Ok(in_memory::repositories()),
    }
}
