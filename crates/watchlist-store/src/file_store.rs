use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;
use crate::backend::KeyValueStore;
use crate::error::StorageError;

/// Key-value store keeping one JSON file per key under a directory.
///
/// Writes go to a temp file first and are renamed into place, and are
/// serialized through an async lock so overlapping writes never interleave.
pub struct FileKeyValueStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// File holding the payload for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Map a storage key onto a file stem.
///
/// Percent-encoding is reversible, so distinct keys never share a file. A
/// leading `.` is encoded as well to keep `.` and `..` out of the stem.
fn encode_key(key: &str) -> String {
    let encoded = urlencoding::encode(key);
    if let Some(rest) = encoded.strip_prefix('.') {
        return format!("%2E{}", rest);
    }
    encoded.into_owned()
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                debug!("Storage hit: {} ({} bytes)", key, content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Storage miss: {} (file does not exist)", key);
                Ok(None)
            }
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, value.as_bytes())
            .await
            .map_err(|e| StorageError::io(key, e))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::io(key, e));
        }

        debug!("Storage saved: {} ({} bytes)", key, value.len());
        Ok(())
    }
}
