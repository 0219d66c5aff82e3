//! Core of the radiox station browser: the station model, the directory
//! client, search/pagination, favorites and the playback designation.
//! Everything here is UI-agnostic; the terminal front end lives in
//! `radiox-tui`.

pub mod config;
pub mod directory;
pub mod error;
pub mod favorites;
pub mod platform;
pub mod playback;
pub mod search;
pub mod station;
pub mod storage;

pub use directory::{DirectoryClient, DirectoryFeed, RequestSlot, RequestTicket};
pub use error::{DirectoryError, PlaybackError, StorageError};
pub use favorites::{FavoritesStore, FAVORITES_KEY};
pub use playback::{PlaybackCoordinator, PlaybackState};
pub use search::{station_matches, Debouncer, SearchController};
pub use station::{sort_by_popularity, FavoriteStation, Station};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
