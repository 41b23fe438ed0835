use thiserror::Error;

/// Failures raised by a [`KeyValueStore`](crate::KeyValueStore) or the payload codec.
///
/// The watchlist store itself never hands these to its callers; they are
/// logged and recovered from at the persistence boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode watchlist payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode watchlist payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}
