pub mod backend;
pub mod codec;
pub mod error;
pub mod file_store;
pub mod memory_store;
pub mod state;
pub mod store;

pub use backend::KeyValueStore;
pub use error::StorageError;
pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
pub use state::WatchlistState;
pub use store::{open_store, WatchlistStore};
pub use watchlist_config::DEFAULT_STORAGE_KEY;
