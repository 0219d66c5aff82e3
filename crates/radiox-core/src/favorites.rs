//! Favorites store.
//!
//! Keeps the user's favorite stations in insertion order and rewrites the
//! whole list to its storage slot after every change.  A missing or corrupt
//! slot loads as an empty list.

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::station::{FavoriteStation, Station};
use crate::storage::KeyValueStore;

/// Slot name the list is persisted under.
pub const FAVORITES_KEY: &str = "favoriteStations";

pub struct FavoritesStore<S: KeyValueStore> {
    store: S,
    favorites: Vec<FavoriteStation>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Load the list from `store`.  Never fails: unreadable data is logged and
    /// treated as "no favorites yet".
    pub fn load(store: S) -> Self {
        let favorites = match store.get(FAVORITES_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<FavoriteStation>>(&raw) {
                Ok(list) => dedup_by_id(list),
                Err(e) => {
                    warn!("[favorites] ignoring unreadable slot: {}", e);
                    Vec::new()
                }
            },
        };
        debug!("[favorites] loaded {} favorites", favorites.len());
        Self { store, favorites }
    }

    pub fn list(&self) -> &[FavoriteStation] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f.id() == id)
    }

    /// Add `station`.  Already-present identifiers are left untouched and
    /// nothing is written.
    pub fn add(&mut self, station: &Station) -> Result<(), StorageError> {
        if self.is_favorite(station.id()) {
            return Ok(());
        }
        self.favorites.push(FavoriteStation::new(station.clone()));
        self.persist()
    }

    pub fn remove(&mut self, id: &str) -> Result<(), StorageError> {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.id() != id);
        if self.favorites.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Flip the favorite state of `station`; returns the new state.
    pub fn toggle(&mut self, station: &Station) -> Result<bool, StorageError> {
        if self.is_favorite(station.id()) {
            self.remove(station.id())?;
            Ok(false)
        } else {
            self.add(station)?;
            Ok(true)
        }
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.favorites)?;
        self.store.set(FAVORITES_KEY, &json)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn dedup_by_id(list: Vec<FavoriteStation>) -> Vec<FavoriteStation> {
    let mut out: Vec<FavoriteStation> = Vec::with_capacity(list.len());
    for fav in list {
        if !out.iter().any(|f| f.id() == fav.id()) {
            out.push(fav);
        }
    }
    out
}
