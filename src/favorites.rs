use std::{collections::BTreeSet, sync::Arc};

use serde_json::Value;
use tokio::sync::watch;

use crate::{coin::Coin, kv_store::KeyValueStore};

pub const DEFAULT_FAVORITES_KEY: &str = "favorite_coins";

pub type FavoriteSet = BTreeSet<String>;

/// Favorite coin ids, persisted under one key of a [`KeyValueStore`] and broadcast to every
/// subscriber.
///
/// The in-memory set is authoritative: a failed write is logged and forgotten.
pub struct FavoritesStore {
    key: String,
    store: Arc<dyn KeyValueStore>,
    favorites: watch::Sender<FavoriteSet>,
}

impl FavoritesStore {
    pub fn new(key: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        let key = key.into();
        let stored = read_favorites(&key, store.as_ref());
        let (favorites, _) = watch::channel(stored);

        Self { key, store, favorites }
    }

    pub fn add(&self, coin: &Coin) {
        self.add_id(&coin.id)
    }

    pub fn add_id(&self, id: &str) {
        if self.favorites.send_if_modified(|favorites| favorites.insert(id.to_owned())) {
            tracing::debug!(id, "coin added to favorites");
            self.persist();
        }
    }

    pub fn remove(&self, coin: &Coin) {
        self.remove_id(&coin.id)
    }

    /// Notifies subscribers even when `id` was not a favorite.
    pub fn remove_id(&self, id: &str) {
        self.favorites.send_modify(|favorites| {
            favorites.remove(id);
        });
        tracing::debug!(id, "coin removed from favorites");
        self.persist();
    }

    pub fn is_favorite(&self, coin: &Coin) -> bool {
        self.contains(&coin.id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.favorites.borrow().contains(id)
    }

    pub fn snapshot(&self) -> FavoriteSet {
        self.favorites.borrow().clone()
    }

    /// Receiver starting at the current set; every later mutation marks it changed.
    pub fn subscribe(&self) -> watch::Receiver<FavoriteSet> {
        self.favorites.subscribe()
    }

    fn persist(&self) {
        let ids: Vec<String> = self.favorites.borrow().iter().cloned().collect();

        if let Err(err) = self.store.set(&self.key, Value::from(ids)) {
            tracing::warn!(key = %self.key, kind = err.kind(), %err, "failed to persist favorites");
        }
    }
}

/// Sets `is_favorite` on every coin from `favorites`.
pub fn overlay(coins: &mut [Coin], favorites: &FavoriteSet) {
    for coin in coins {
        coin.is_favorite = favorites.contains(&coin.id);
    }
}

fn read_favorites(key: &str, store: &dyn KeyValueStore) -> FavoriteSet {
    let value = match store.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => return FavoriteSet::new(),
        Err(err) => {
            tracing::warn!(key, kind = err.kind(), %err, "unable to read favorites, starting empty");
            return FavoriteSet::new();
        },
    };

    serde_json::from_value::<Vec<String>>(value)
        .map(FavoriteSet::from_iter)
        .unwrap_or_else(|err| {
            tracing::warn!(key, %err, "stored favorites are malformed, starting empty");
            FavoriteSet::new()
        })
}
