use serde::Serialize;
use watchlist_models::{MediaType, WatchlistItem};

/// Observable snapshot of the watchlist.
///
/// `items` is most-recently-added first and unique on `(id, media_type)`.
/// `hydrated` flips to true once the first load from storage has completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchlistState {
    pub items: Vec<WatchlistItem>,
    pub hydrated: bool,
}

impl WatchlistState {
    pub fn contains(&self, id: u64, media_type: MediaType) -> bool {
        self.position(id, media_type).is_some()
    }

    pub fn position(&self, id: u64, media_type: MediaType) -> Option<usize> {
        self.items.iter().position(|item| item.matches(id, media_type))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_cold_and_empty() {
        let state = WatchlistState::default();
        assert!(!state.hydrated);
        assert!(state.is_empty());
    }

    #[test]
    fn test_contains_uses_compound_key() {
        let state = WatchlistState {
            items: vec![
                WatchlistItem::new(5, MediaType::Tv, "Show"),
                WatchlistItem::new(9, MediaType::Movie, "Film"),
            ],
            hydrated: true,
        };
        assert!(state.contains(5, MediaType::Tv));
        assert!(!state.contains(5, MediaType::Movie));
        assert_eq!(state.position(9, MediaType::Movie), Some(1));
    }
}
