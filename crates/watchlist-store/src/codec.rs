use std::collections::HashSet;
use tracing::warn;
use watchlist_models::WatchlistItem;
use crate::error::StorageError;

/// Serialize the full watchlist as a JSON array
pub fn encode_items(items: &[WatchlistItem]) -> Result<String, StorageError> {
    serde_json::to_string(items).map_err(StorageError::Encode)
}

/// Parse a stored payload back into a watchlist.
///
/// Anything other than a JSON array of well-formed items is an error. Entries
/// repeating an earlier `(id, media_type)` are dropped, first occurrence wins.
pub fn decode_items(payload: &str) -> Result<Vec<WatchlistItem>, StorageError> {
    let items: Vec<WatchlistItem> = serde_json::from_str(payload).map_err(StorageError::Decode)?;

    let total = items.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<WatchlistItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.key()))
        .collect();

    if unique.len() < total {
        warn!(
            "Stored watchlist contained {} duplicate entries, keeping first occurrences",
            total - unique.len()
        );
    }

    Ok(unique)
}
