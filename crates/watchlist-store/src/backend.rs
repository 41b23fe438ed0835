use async_trait::async_trait;
use crate::error::StorageError;

/// Async get/set-by-key store that survives process restarts.
///
/// The watchlist store only ever uses these two methods, under a single key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the payload stored under `key`, or `None` if it was never written
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites the payload stored under `key`
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

