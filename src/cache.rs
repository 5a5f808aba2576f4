use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{coin::Coin, error::SyncResult, persist};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Best effort persistence of the latest known coin list.
///
/// None of the operations report failures: a cache that cannot be read is empty and a cache
/// that cannot be written is skipped.
pub trait CoinCache: Send + Sync {
    /// Merges `coins` into the stored snapshot by id and refreshes its timestamp.
    fn save(&self, coins: &[Coin]);

    /// Stored coins, or nothing once the snapshot is older than the ttl.
    fn load(&self) -> Vec<Coin>;

    fn clear(&self);
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedSnapshot {
    /// Capture instant in seconds since the unix epoch.
    timestamp: f64,
    coins: Vec<Coin>,
}

/// [`CoinCache`] kept in a single JSON document.
pub struct FileCoinCache {
    path: PathBuf,
    ttl: Duration,
    write_lock: Mutex<()>,
}

impl FileCoinCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn save_at(&self, coins: &[Coin], now: DateTime<Utc>) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let existing = match self.read_snapshot() {
            Ok(snapshot) => snapshot.map(|snapshot| snapshot.coins).unwrap_or_default(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), kind = err.kind(), %err, "unable to read coin cache before save");
                Vec::new()
            },
        };

        let snapshot = CachedSnapshot {
            timestamp: epoch_seconds(now),
            coins: merge_by_id(existing, coins),
        };

        match persist::write_json_atomic(&self.path, &snapshot) {
            Ok(()) => tracing::debug!(path = %self.path.display(), coins = snapshot.coins.len(), "coin cache saved"),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), kind = err.kind(), %err, "failed to save coins to cache")
            },
        }
    }

    /// Holds the write lock from the read through the eviction of an expired snapshot.
    pub fn load_at(&self, now: DateTime<Utc>) -> Vec<Coin> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = match self.read_snapshot() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), kind = err.kind(), %err, "failed to load coins from cache");
                return Vec::new();
            },
        };

        let age = epoch_seconds(now) - snapshot.timestamp;
        if age > self.ttl.as_secs_f64() {
            tracing::info!(age, ttl = self.ttl.as_secs(), "coin cache expired, clearing");
            self.remove_snapshot();
            return Vec::new();
        }

        snapshot.coins
    }

    fn read_snapshot(&self) -> SyncResult<Option<CachedSnapshot>> {
        persist::read_json(&self.path)
    }

    /// Callers hold `write_lock`.
    fn remove_snapshot(&self) {
        if let Err(err) = persist::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), kind = err.kind(), %err, "failed to clear coin cache");
        }
    }
}

impl CoinCache for FileCoinCache {
    fn save(&self, coins: &[Coin]) {
        self.save_at(coins, Utc::now())
    }

    fn load(&self) -> Vec<Coin> {
        self.load_at(Utc::now())
    }

    fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.remove_snapshot();
    }
}

/// Replaces coins of `old` that share an id with `new` in place and appends the rest of `new`.
pub fn merge_by_id(mut old: Vec<Coin>, new: &[Coin]) -> Vec<Coin> {
    let mut positions: HashMap<String, usize> =
        old.iter().enumerate().map(|(position, coin)| (coin.id.clone(), position)).collect();

    for coin in new {
        match positions.get(&coin.id) {
            Some(&position) => old[position] = coin.clone(),
            None => {
                positions.insert(coin.id.clone(), old.len());
                old.push(coin.clone());
            },
        }
    }

    old
}

fn epoch_seconds(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    fn coin(id: &str, price: f64) -> Coin {
        Coin::new(id, id.to_uppercase(), id, price)
    }

    fn cache(dir: &tempfile::TempDir) -> FileCoinCache {
        FileCoinCache::new(dir.path().join("coins_cache.json"), DEFAULT_TTL)
    }

    #[test]
    fn empty_without_snapshot() {
        let dir = tempfile::tempdir().unwrap();

        assert!(cache(&dir).load().is_empty());
    }

    #[test]
    fn save_merges_with_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        cache.save(&[coin("a", 1.0), coin("b", 2.0)]);
        cache.save(&[coin("b", 20.0), coin("c", 3.0)]);

        assert_eq!(cache.load(), vec![coin("a", 1.0), coin("b", 20.0), coin("c", 3.0)]);
    }

    #[test]
    fn merge_handles_duplicates_inside_new_batch() {
        let merged = merge_by_id(vec![coin("a", 1.0)], &[coin("b", 2.0), coin("b", 5.0), coin("a", 9.0)]);

        assert_eq!(merged, vec![coin("a", 9.0), coin("b", 5.0)]);
    }

    #[test]
    fn expired_snapshot_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let t0 = Utc::now();

        cache.save_at(&[coin("a", 1.0)], t0);

        let just_in_time = t0 + ChronoDuration::seconds(DEFAULT_TTL.as_secs() as i64 - 1);
        assert_eq!(cache.load_at(just_in_time).len(), 1);

        let too_late = t0 + ChronoDuration::seconds(DEFAULT_TTL.as_secs() as i64 + 1);
        assert!(cache.load_at(too_late).is_empty());
        assert!(!cache.path().exists());
        assert!(cache.load_at(t0).is_empty());
    }

    #[test]
    fn save_merges_even_into_a_stale_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        let long_ago = Utc::now() - ChronoDuration::days(2);

        cache.save_at(&[coin("a", 1.0)], long_ago);
        cache.save(&[coin("b", 2.0)]);

        assert_eq!(cache.load(), vec![coin("a", 1.0), coin("b", 2.0)]);
    }

    #[test]
    fn snapshot_layout() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);

        cache.save(&[coin("a", 1.5)]);

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(cache.path()).unwrap()).unwrap();
        assert!(raw["timestamp"].is_f64());
        assert_eq!(raw["coins"][0]["id"], "a");
        assert_eq!(raw["coins"][0]["price"], 1.5);
    }

    #[test]
    fn corrupt_snapshot_reads_as_empty_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        std::fs::write(cache.path(), b"{ not json").unwrap();

        assert!(cache.load().is_empty());

        cache.save(&[coin("a", 1.0)]);
        assert_eq!(cache.load(), vec![coin("a", 1.0)]);
    }

    #[test]
    fn save_racing_an_expired_load_survives() {
        let dir = tempfile::tempdir().unwrap();
        let cache = std::sync::Arc::new(cache(&dir));
        let stale = Utc::now() - ChronoDuration::seconds(DEFAULT_TTL.as_secs() as i64 + 10);

        for round in 0..300 {
            cache.clear();
            cache.save_at(&[coin("old", 1.0)], stale);

            let writer = {
                let cache = cache.clone();
                std::thread::spawn(move || cache.save(&[coin("fresh", 2.0)]))
            };
            cache.load();
            writer.join().unwrap();

            assert!(
                cache.load().iter().any(|coin| coin.id == "fresh"),
                "fresh coin lost in round {round}"
            );
        }
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(&dir);
        cache.save(&[coin("a", 1.0)]);

        cache.clear();
        cache.clear();

        assert!(cache.load().is_empty());
    }
}
