//! Shared Cache Handle
//!
//! `Cache` is the caller-facing API. It owns the engine behind a single
//! mutex and the expiry sweeper that removes entries through that mutex.
//! Ordered traversals are copied out while the lock is held.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::cache::snapshot;
use crate::cache::{CacheStats, CacheStore, SnapshotView};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{SharedStore, Sweeper, SweeperState};

// == Cache ==
/// Thread-safe LRU cache with optional TTL expiry and JSON snapshots.
///
/// A miss is reported as `None`; the cache never fetches values itself.
///
/// ```ignore
/// let cache = Cache::new(CacheConfig::new(100, "cache.json"))?;
/// let value = match cache.get("user:1").await {
///     Some(value) => value,
///     None => {
///         let value = fetch_user(1).await?;
///         cache.put("user:1".to_string(), value.clone()).await;
///         value
///     }
/// };
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    store: SharedStore<K, V>,
    sweeper: Mutex<Sweeper>,
    config: CacheConfig,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Validates `config` and builds an empty cache.
    ///
    /// When a TTL is configured the expiry sweeper starts immediately, so
    /// this must then be called from within a Tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let store = Arc::new(Mutex::new(CacheStore::from_config(&config)?));

        let mut sweeper = Sweeper::new(config.sweep_interval);
        if config.ttl.is_some() {
            sweeper.start(&store);
        }

        info!(
            capacity = config.capacity,
            ttl = ?config.ttl,
            snapshot = %config.snapshot_path.display(),
            "Cache initialized"
        );

        Ok(Self {
            store,
            sweeper: Mutex::new(sweeper),
            config,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The underlying engine, for callers that need several operations
    /// under one lock.
    pub fn store(&self) -> SharedStore<K, V> {
        Arc::clone(&self.store)
    }

    // == Core Operations ==
    /// Stores a value as the most recently used entry, evicting the least
    /// recently used one if the cache is full.
    pub async fn put(&self, key: K, value: V) {
        self.store.lock().await.put(key, value);
    }

    /// Returns a copy of the value and promotes its key, or None on a miss.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.get(key).cloned()
    }

    /// Removes a key. Absent keys are a silent no-op; returns whether
    /// anything was removed.
    pub async fn remove_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.remove_key(key)
    }

    /// Drops every entry in one critical section.
    pub async fn clear_all(&self) {
        self.store.lock().await.clear_all();
    }

    pub async fn snapshot_view(&self) -> SnapshotView<K, V> {
        self.store.lock().await.snapshot_view()
    }

    /// Keys in recency order (most recent first when `from_head`), copied
    /// under the lock.
    pub async fn ordered_keys(&self, from_head: bool) -> Vec<K> {
        self.store
            .lock()
            .await
            .ordered_keys(from_head)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    // == Sweeper Control ==
    /// Stops the expiry sweeper. No sweep runs after this returns.
    pub async fn stop_sweeper(&self) {
        self.sweeper.lock().await.stop().await;
    }

    /// Restarts the expiry sweeper. No-op when no TTL is configured.
    pub async fn restart_sweeper(&self) {
        if self.config.ttl.is_none() {
            return;
        }
        self.sweeper.lock().await.restart(&self.store).await;
    }

    pub async fn sweeper_state(&self) -> SweeperState {
        self.sweeper.lock().await.state()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Serialize + DeserializeOwned + 'static,
{
    // == Persistence ==
    /// Writes the cache to the configured snapshot path.
    ///
    /// The replace step is atomic where the platform allows renaming over
    /// an existing file. Otherwise the old snapshot is removed before the
    /// rename, and a crash in that window can lose the snapshot entirely.
    pub async fn write_snapshot(&self) -> Result<usize> {
        snapshot::write_snapshot(&self.store, &self.config.snapshot_path)
            .await
            .inspect_err(|e| error!("Snapshot write failed: {}", e))
    }

    /// Replaces the cache contents with the configured snapshot file.
    ///
    /// All-or-nothing: on error the cache is left as it was.
    pub async fn load_snapshot(&self) -> Result<usize> {
        snapshot::load_snapshot(&self.store, &self.config.snapshot_path)
            .await
            .inspect_err(|e| error!("Snapshot load failed: {}", e))
    }
}
