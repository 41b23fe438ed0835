pub mod media;
pub mod watchlist;

pub use media::MediaType;
pub use watchlist::{WatchlistItem, WatchlistKey};
