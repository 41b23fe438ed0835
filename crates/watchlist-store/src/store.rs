use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use watchlist_config::{Config, PathManager, StorageBackend, DEFAULT_STORAGE_KEY};
use watchlist_models::{MediaType, WatchlistItem};
use crate::backend::KeyValueStore;
use crate::codec::{decode_items, encode_items};
use crate::file_store::FileKeyValueStore;
use crate::memory_store::MemoryKeyValueStore;
use crate::state::WatchlistState;

/// In-memory watchlist mirrored to a [`KeyValueStore`].
///
/// Queries and mutations are synchronous and never fail. Every mutation that
/// changes the list publishes a new [`WatchlistState`] to subscribers right
/// away and then writes the full list to the backing store in the background.
/// Durability may lag behind the in-memory state; it never blocks it.
///
/// Each write carries the generation of the mutation that produced it. Writes
/// reach the backend one at a time and a write older than one already sent is
/// dropped, so the backend always ends on the latest list.
///
/// One instance is created per process and shared (e.g. behind an `Arc`)
/// with every front-end that reads or edits the watchlist.
pub struct WatchlistStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    state: watch::Sender<WatchlistState>,
    generation: AtomicU64,
    newest_sent: Arc<AsyncMutex<u64>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl WatchlistStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(WatchlistState::default());
        Self {
            backend,
            key: key.into(),
            state,
            generation: AtomicU64::new(0),
            newest_sent: Arc::new(AsyncMutex::new(0)),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Load the persisted watchlist, replacing whatever is in memory.
    ///
    /// A missing key, an unreadable store, or a payload that is not a list of
    /// items all resolve to an empty watchlist. Either way `hydrated` becomes
    /// true once this returns. Items added before this completes are discarded.
    pub async fn hydrate(&self) {
        let items = match self.backend.get(&self.key).await {
            Ok(Some(payload)) => match decode_items(&payload) {
                Ok(items) => {
                    info!("Hydrated watchlist from {} ({} items)", self.key, items.len());
                    items
                }
                Err(e) => {
                    warn!("Stored watchlist under {} is unreadable, starting empty: {}", self.key, e);
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No stored watchlist under {}, starting empty", self.key);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read watchlist from {}, starting empty: {}", self.key, e);
                Vec::new()
            }
        };

        self.state.send_modify(|state| {
            if !state.hydrated && !state.items.is_empty() {
                warn!(
                    "Discarding {} watchlist changes made before hydration completed",
                    state.items.len()
                );
            }
            state.items = items;
            state.hydrated = true;
        });
    }

    pub fn is_in_watchlist(&self, id: u64, media_type: MediaType) -> bool {
        self.state.borrow().contains(id, media_type)
    }

    /// Bookmark `item` as the most recent entry. No-op if its key is already present.
    pub fn add(&self, item: WatchlistItem) {
        self.warn_if_cold("add");
        let key = item.key();

        let mut snapshot = None;
        self.state.send_if_modified(|state| {
            if state.contains(item.id, item.media_type) {
                return false;
            }
            state.items.insert(0, item);
            snapshot = Some((self.next_generation(), state.items.clone()));
            true
        });

        match snapshot {
            Some((generation, items)) => {
                debug!("Added {} to watchlist ({} items)", key, items.len());
                self.persist_best_effort(generation, &items);
            }
            None => debug!("{} already in watchlist, skipping add", key),
        }
    }

    /// Drop the entry for `(id, media_type)` if there is one. Always persists.
    pub fn remove(&self, id: u64, media_type: MediaType) {
        self.warn_if_cold("remove");

        let mut generation = 0;
        let mut snapshot = None;
        self.state.send_if_modified(|state| {
            generation = self.next_generation();
            let before = state.items.len();
            state.items.retain(|item| !item.matches(id, media_type));
            if state.items.len() == before {
                return false;
            }
            snapshot = Some(state.items.clone());
            true
        });

        let items = match snapshot {
            Some(items) => {
                debug!("Removed {}:{} from watchlist ({} items)", media_type, id, items.len());
                items
            }
            None => {
                debug!("{}:{} not in watchlist, nothing removed", media_type, id);
                self.state.borrow().items.clone()
            }
        };
        self.persist_best_effort(generation, &items);
    }

    /// Remove `item` if bookmarked, add it otherwise
    pub fn toggle(&self, item: WatchlistItem) {
        if self.is_in_watchlist(item.id, item.media_type) {
            self.remove(item.id, item.media_type);
        } else {
            self.add(item);
        }
    }

    /// Empty the watchlist and persist the empty list
    pub fn clear(&self) {
        self.warn_if_cold("clear");

        let mut generation = 0;
        let mut cleared = 0;
        self.state.send_if_modified(|state| {
            generation = self.next_generation();
            cleared = state.items.len();
            state.items.clear();
            cleared > 0
        });

        debug!("Cleared {} items from watchlist", cleared);
        self.persist_best_effort(generation, &[]);
    }

    pub fn items(&self) -> Vec<WatchlistItem> {
        self.state.borrow().items.clone()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.borrow().hydrated
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Receive every state published from now on.
    ///
    /// Use `receiver.wait_for(|s| s.hydrated)` to hold off until hydration is done.
    pub fn subscribe(&self) -> watch::Receiver<WatchlistState> {
        self.state.subscribe()
    }

    /// Wait for every background write launched so far to finish.
    ///
    /// Write failures were already logged by the writes themselves and are not
    /// reported here.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };

        if handles.is_empty() {
            return;
        }

        debug!("Flushing {} pending watchlist writes", handles.len());
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("Watchlist write task did not complete: {}", e);
            }
        }
    }

    /// Called only while the state lock is held, so generations follow the
    /// order in which mutations were published.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Write `items` under the storage key in the background.
    ///
    /// Never surfaces failure: encode and write errors are logged and dropped,
    /// and the in-memory list stays authoritative for the rest of the process.
    /// Outside a tokio runtime the write is skipped.
    fn persist_best_effort(&self, generation: u64, items: &[WatchlistItem]) {
        let payload = match encode_items(items) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Skipping watchlist write: {}", e);
                return;
            }
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime available, watchlist change will not be persisted");
                return;
            }
        };

        let backend = Arc::clone(&self.backend);
        let newest_sent = Arc::clone(&self.newest_sent);
        let key = self.key.clone();
        let count = items.len();
        let handle = runtime.spawn(async move {
            let mut newest_sent = newest_sent.lock().await;
            if *newest_sent >= generation {
                debug!("Skipping stale watchlist write #{} (#{} already sent)", generation, *newest_sent);
                return;
            }
            *newest_sent = generation;
            match backend.set(&key, payload).await {
                Ok(()) => debug!("Persisted watchlist under {} ({} items)", key, count),
                Err(e) => warn!("Failed to persist watchlist under {}: {}", key, e),
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|handle| !handle.is_finished());
            pending.push(handle);
        }
    }

    fn warn_if_cold(&self, operation: &str) {
        let hydrated = self.state.borrow().hydrated;
        if !hydrated {
            warn!("Watchlist {} before hydration; hydrate() will overwrite this change", operation);
        }
    }
}

/// Build the store described by `config`, creating the storage directory if needed
pub fn open_store(config: &Config, path_manager: &PathManager) -> anyhow::Result<WatchlistStore> {
    config.validate()?;

    let backend: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::File => {
            let dir = config.storage_dir(path_manager);
            std::fs::create_dir_all(&dir)
                .map_err(|e| anyhow::anyhow!("Failed to create storage directory {}: {}", dir.display(), e))?;
            debug!("Using file storage at {:?}", dir);
            Arc::new(FileKeyValueStore::new(dir))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; the watchlist will not survive this process");
            Arc::new(MemoryKeyValueStore::new())
        }
    };

    Ok(WatchlistStore::with_key(backend, config.storage.key.clone()))
}

#[cfg(test)]
mod tests;
