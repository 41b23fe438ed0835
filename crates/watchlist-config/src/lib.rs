pub mod config;
pub mod paths;

pub use config::{Config, LoggingConfig, StorageBackend, StorageConfig, DEFAULT_STORAGE_KEY};
pub use paths::{PathManager, container_base_path};
