use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::media::MediaType;

/// A bookmarked title.
///
/// Serialized with camelCase field names; `posterPath` is always written
/// (as `null` when absent) but may be omitted when reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: u64, // Identifier from the metadata source, unique only per media type
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>, // Relative image path, resolved elsewhere
}

impl WatchlistItem {
    pub fn new(id: u64, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            id,
            media_type,
            title: title.into(),
            poster_path: None,
        }
    }

    pub fn with_poster_path(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }

    pub fn key(&self) -> WatchlistKey {
        WatchlistKey::new(self.id, self.media_type)
    }

    pub fn matches(&self, id: u64, media_type: MediaType) -> bool {
        self.id == id && self.media_type == media_type
    }
}

/// Compound identity of a watchlist entry: `(id, media_type)`.
///
/// Displays as `movie:42` / `tv:7` and parses back from the same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchlistKey {
    pub id: u64,
    pub media_type: MediaType,
}

impl WatchlistKey {
    pub fn new(id: u64, media_type: MediaType) -> Self {
        Self { id, media_type }
    }
}

impl fmt::Display for WatchlistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.media_type, self.id)
    }
}

impl FromStr for WatchlistKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (media_type, id) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid key: {}. Expected <movie|tv>:<id>", s))?;
        let media_type = media_type.parse::<MediaType>()?;
        let id = id
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("Invalid id in key {}: {}", s, e))?;
        Ok(Self::new(id, media_type))
    }
}
