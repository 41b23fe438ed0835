use super::*;
use async_trait::async_trait;
use std::sync::Mutex as StdMutex;
use tokio::sync::Notify;
use crate::error::StorageError;

/// Backing store that records writes and can be told to fail
#[derive(Default)]
struct RecordingStore {
    value: StdMutex<Option<String>>,
    writes: StdMutex<Vec<(String, String)>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl RecordingStore {
    fn with_value(value: &str) -> Self {
        Self {
            value: StdMutex::new(Some(value.to_string())),
            ..Self::default()
        }
    }

    fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("read rejected".to_string()));
        }
        Ok(self.value.lock().unwrap().clone())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push((key.to_string(), value.clone()));
        if self.fail_writes {
            return Err(StorageError::Unavailable("write rejected".to_string()));
        }
        *self.value.lock().unwrap() = Some(value);
        Ok(())
    }
}

/// Backing store whose reads block until released
struct GatedStore {
    gate: Arc<Notify>,
    value: String,
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        self.gate.notified().await;
        Ok(Some(self.value.clone()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        Ok(())
    }
}

fn test_movie() -> WatchlistItem {
    WatchlistItem::new(1, MediaType::Movie, "Test Movie")
}

async fn hydrated_store(backend: Arc<RecordingStore>) -> WatchlistStore {
    let store = WatchlistStore::new(backend);
    store.hydrate().await;
    store
}

#[tokio::test]
async fn test_add_is_idempotent() {
    let backend = Arc::new(RecordingStore::default());
    let store = hydrated_store(backend.clone()).await;

    store.add(test_movie());
    assert_eq!(store.len(), 1);

    store.add(test_movie());
    assert_eq!(store.len(), 1);

    store.flush().await;
    assert_eq!(backend.writes().len(), 1);
}

#[tokio::test]
async fn test_repeated_adds_keep_one_entry_per_key() {
    let store = hydrated_store(Arc::new(RecordingStore::default())).await;

    for _ in 0..5 {
        store.add(test_movie());
        store.add(WatchlistItem::new(1, MediaType::Tv, "Same id, other type"));
    }

    let items = store.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items.iter().filter(|i| i.matches(1, MediaType::Movie)).count(), 1);
    assert_eq!(items.iter().filter(|i| i.matches(1, MediaType::Tv)).count(), 1);
}

#[tokio::test]
async fn test_add_prepends_most_recent_first() {
    let store = hydrated_store(Arc::new(RecordingStore::default())).await;

    store.add(WatchlistItem::new(1, MediaType::Movie, "First"));
    store.add(WatchlistItem::new(2, MediaType::Tv, "Second"));
    store.add(WatchlistItem::new(3, MediaType::Movie, "Third"));

    let ids: Vec<u64> = store.items().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_toggle_twice_restores_membership() {
    let store = hydrated_store(Arc::new(RecordingStore::default())).await;
    store.add(test_movie());

    store.toggle(test_movie());
    assert_eq!(store.len(), 0);
    assert!(!store.is_in_watchlist(1, MediaType::Movie));

    store.toggle(test_movie());
    assert_eq!(store.len(), 1);
    assert!(store.is_in_watchlist(1, MediaType::Movie));
}

#[tokio::test]
async fn test_toggle_twice_from_absent() {
    let store = hydrated_store(Arc::new(RecordingStore::default())).await;
    store.add(WatchlistItem::new(9, MediaType::Tv, "Other"));

    store.toggle(test_movie());
    assert_eq!(store.len(), 2);
    store.toggle(test_movie());
    assert_eq!(store.len(), 1);
    assert!(!store.is_in_watchlist(1, MediaType::Movie));
}

#[tokio::test]
async fn test_remove_after_toggles() {
    let store = hydrated_store(Arc::new(RecordingStore::default())).await;
    store.add(test_movie());
    store.toggle(test_movie());
    store.toggle(test_movie());

    store.remove(1, MediaType::Movie);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_remove_missing_key_leaves_items_unchanged() {
    let backend = Arc::new(RecordingStore::default());
    let store = hydrated_store(backend.clone()).await;
    store.add(test_movie());
    store.add(WatchlistItem::new(2, MediaType::Tv, "Show"));
    let before = store.items();

    store.remove(1, MediaType::Tv);
    store.remove(99, MediaType::Movie);

    assert_eq!(store.items(), before);

    // Removal persists even when nothing matched
    store.flush().await;
    let writes = backend.writes();
    assert_eq!(writes.len(), 4);
    assert_eq!(decode_items(&writes[3].1).unwrap(), before);
}

#[tokio::test]
async fn test_hydrate_round_trip() {
    let backend = Arc::new(RecordingStore::with_value(
        r#"[{"id":7,"mediaType":"tv","title":"Saved Show","posterPath":"abc"}]"#,
    ));
    let store = WatchlistStore::new(backend);
    assert!(!store.is_hydrated());

    store.hydrate().await;

    assert!(store.is_hydrated());
    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 7);
    assert_eq!(items[0].media_type, MediaType::Tv);
    assert_eq!(items[0].title, "Saved Show");
    assert_eq!(items[0].poster_path.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_hydrate_many_items_preserves_fields() {
    let stored: Vec<WatchlistItem> = (1..=25)
        .map(|n| {
            let media_type = if n % 2 == 0 { MediaType::Tv } else { MediaType::Movie };
            let item = WatchlistItem::new(n, media_type, format!("Title {}", n));
            if n % 3 == 0 {
                item.with_poster_path(format!("/poster{}.jpg", n))
            } else {
                item
            }
        })
        .collect();
    let payload = encode_items(&stored).unwrap();

    let store = WatchlistStore::new(Arc::new(RecordingStore::with_value(&payload)));
    store.hydrate().await;

    assert!(store.is_hydrated());
    assert_eq!(store.items(), stored);
}

#[tokio::test]
async fn test_hydrate_invalid_json_falls_back_to_empty() {
    let store = WatchlistStore::new(Arc::new(RecordingStore::with_value("{not json")));
    store.hydrate().await;

    assert!(store.is_hydrated());
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn test_hydrate_wrong_shape_falls_back_to_empty() {
    let store = WatchlistStore::new(Arc::new(RecordingStore::with_value(r#"{"items":[]}"#)));
    store.hydrate().await;

    assert!(store.is_hydrated());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_hydrate_rejected_read_falls_back_to_empty() {
    let backend = RecordingStore {
        fail_reads: true,
        ..RecordingStore::default()
    };
    let store = WatchlistStore::new(Arc::new(backend));
    store.hydrate().await;

    assert!(store.is_hydrated());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_hydrate_missing_key_is_empty() {
    let store = WatchlistStore::new(Arc::new(RecordingStore::default()));
    store.hydrate().await;

    assert!(store.is_hydrated());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_hydrate_collapses_stored_duplicates() {
    let payload = r#"[
        {"id":1,"mediaType":"movie","title":"Kept"},
        {"id":1,"mediaType":"movie","title":"Dropped"}
    ]"#;
    let store = WatchlistStore::new(Arc::new(RecordingStore::with_value(payload)));
    store.hydrate().await;

    assert_eq!(store.len(), 1);
    assert_eq!(store.items()[0].title, "Kept");
}

#[tokio::test]
async fn test_second_hydrate_keeps_hydrated_flag() {
    let backend = Arc::new(RecordingStore::default());
    let store = hydrated_store(backend.clone()).await;
    store.add(test_movie());
    store.flush().await;

    store.hydrate().await;

    assert!(store.is_hydrated());
    assert_eq!(store.items(), vec![test_movie()]);
}

#[tokio::test]
async fn test_hydrate_overwrites_changes_made_before_it_completes() {
    let gate = Arc::new(Notify::new());
    let backend = GatedStore {
        gate: gate.clone(),
        value: r#"[{"id":7,"mediaType":"tv","title":"Saved Show","posterPath":null}]"#.to_string(),
    };
    let store = Arc::new(WatchlistStore::new(Arc::new(backend)));

    let hydrating = {
        let store = store.clone();
        tokio::spawn(async move { store.hydrate().await })
    };
    tokio::task::yield_now().await;

    store.add(test_movie());
    assert!(store.is_in_watchlist(1, MediaType::Movie));
    assert!(!store.is_hydrated());

    gate.notify_one();
    hydrating.await.unwrap();

    assert!(store.is_hydrated());
    assert!(!store.is_in_watchlist(1, MediaType::Movie));
    assert!(store.is_in_watchlist(7, MediaType::Tv));
}

#[tokio::test]
async fn test_add_writes_full_sequence_once() {
    let backend = Arc::new(RecordingStore::default());
    let store = hydrated_store(backend.clone()).await;
    store.add(WatchlistItem::new(2, MediaType::Tv, "Older"));
    store.flush().await;

    store.add(test_movie());
    store.flush().await;

    let writes = backend.writes();
    assert_eq!(writes.len(), 2);
    let (key, payload) = &writes[1];
    assert_eq!(key, DEFAULT_STORAGE_KEY);
    let written = decode_items(payload).unwrap();
    assert_eq!(written, vec![test_movie(), WatchlistItem::new(2, MediaType::Tv, "Older")]);
}

#[tokio::test]
async fn test_write_failure_does_not_touch_memory() {
    let backend = Arc::new(RecordingStore {
        fail_writes: true,
        ..RecordingStore::default()
    });
    let store = hydrated_store(backend.clone()).await;

    store.add(test_movie());
    store.flush().await;

    assert_eq!(backend.writes().len(), 1);
    assert_eq!(store.items(), vec![test_movie()]);

    store.remove(1, MediaType::Movie);
    store.flush().await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_clear_persists_empty_list() {
    let backend = Arc::new(RecordingStore::default());
    let store = hydrated_store(backend.clone()).await;
    store.add(test_movie());
    store.add(WatchlistItem::new(2, MediaType::Tv, "Show"));

    store.clear();
    store.flush().await;

    assert!(store.is_empty());
    let writes = backend.writes();
    assert_eq!(writes.last().map(|(_, payload)| payload.as_str()), Some("[]"));
}

#[tokio::test]
async fn test_custom_storage_key() {
    let backend = Arc::new(RecordingStore::default());
    let store = WatchlistStore::with_key(backend.clone(), "@other/slot");
    store.hydrate().await;
    store.add(test_movie());
    store.flush().await;

    assert_eq!(store.storage_key(), "@other/slot");
    assert_eq!(backend.writes()[0].0, "@other/slot");
}

#[tokio::test]
async fn test_subscribers_see_mutations_immediately() {
    let store = hydrated_store(Arc::new(RecordingStore::default())).await;
    let mut rx = store.subscribe();

    store.add(test_movie());
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    // Duplicate add publishes nothing
    store.add(test_movie());
    assert!(!rx.has_changed().unwrap());

    store.remove(1, MediaType::Movie);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn test_subscriber_can_wait_for_hydration() {
    let backend = Arc::new(RecordingStore::with_value(
        r#"[{"id":7,"mediaType":"tv","title":"Saved Show","posterPath":"abc"}]"#,
    ));
    let store = Arc::new(WatchlistStore::new(backend));
    let mut rx = store.subscribe();

    let hydrating = {
        let store = store.clone();
        tokio::spawn(async move { store.hydrate().await })
    };

    let state = rx.wait_for(|state| state.hydrated).await.unwrap().clone();
    assert_eq!(state.len(), 1);
    hydrating.await.unwrap();
}

#[tokio::test]
async fn test_file_backed_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let store = WatchlistStore::new(Arc::new(FileKeyValueStore::new(dir.path())));
    store.hydrate().await;
    store.add(WatchlistItem::new(7, MediaType::Tv, "Saved Show").with_poster_path("abc"));
    store.add(test_movie());
    store.flush().await;

    let reopened = WatchlistStore::new(Arc::new(FileKeyValueStore::new(dir.path())));
    reopened.hydrate().await;
    assert_eq!(reopened.items(), store.items());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flushed_file_matches_memory_after_quick_add_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let store = WatchlistStore::new(Arc::new(FileKeyValueStore::new(dir.path())));
    store.hydrate().await;

    for round in 0..300 {
        store.add(test_movie());
        store.remove(1, MediaType::Movie);
        store.flush().await;

        let reopened = WatchlistStore::new(Arc::new(FileKeyValueStore::new(dir.path())));
        reopened.hydrate().await;
        assert_eq!(reopened.items(), store.items(), "stale payload after round {}", round);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_write_is_newest_list() {
    let backend = Arc::new(RecordingStore::default());
    let store = hydrated_store(backend.clone()).await;

    for id in 0..50 {
        store.add(WatchlistItem::new(id, MediaType::Movie, "Movie"));
        if id % 3 == 0 {
            store.remove(id, MediaType::Movie);
        }
        store.toggle(WatchlistItem::new(id, MediaType::Tv, "Show"));
    }
    store.flush().await;

    let writes = backend.writes();
    let (_, last) = writes.last().unwrap();
    assert_eq!(decode_items(last).unwrap(), store.items());
}

#[tokio::test]
async fn test_open_store_memory_backend() {
    let dir = tempfile::tempdir().unwrap();
    let paths = PathManager::from_base(dir.path().to_path_buf());
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config.storage.key = "@test/items".to_string();

    let store = open_store(&config, &paths).unwrap();
    store.hydrate().await;
    assert_eq!(store.storage_key(), "@test/items");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_open_store_file_backend_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let paths = PathManager::from_base(dir.path().to_path_buf());
    let config = Config::default();

    let store = open_store(&config, &paths).unwrap();
    assert!(paths.storage_dir().is_dir());

    store.hydrate().await;
    store.add(test_movie());
    store.flush().await;
    assert!(FileKeyValueStore::new(paths.storage_dir())
        .path_for(DEFAULT_STORAGE_KEY)
        .exists());
}

#[test]
fn test_open_store_rejects_blank_key() {
    let dir = tempfile::tempdir().unwrap();
    let paths = PathManager::from_base(dir.path().to_path_buf());
    let mut config = Config::default();
    config.storage.key = String::new();

    assert!(open_store(&config, &paths).is_err());
}

#[test]
fn test_mutations_without_runtime_do_not_panic() {
    let backend = Arc::new(RecordingStore::default());
    let store = WatchlistStore::new(backend.clone());

    store.add(test_movie());
    store.toggle(test_movie());
    store.toggle(test_movie());

    assert_eq!(store.items(), vec![test_movie()]);
    assert!(backend.writes().is_empty());
}
