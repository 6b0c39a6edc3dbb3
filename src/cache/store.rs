//! Cache Store Module
//!
//! Main cache engine combining the value store with the entry index.
//!
//! `CacheStore` is not synchronized; the shared [`Cache`](crate::cache::Cache)
//! handle wraps it in a mutex so every mutation happens under one lock.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::index::{EntryIndex, Keys};
use crate::cache::{CacheEntry, CacheStats, ValueStore};
use crate::config::{entry_ttl, CacheConfig};
use crate::error::{CacheError, Result};

// == Snapshot View ==
/// Point-in-time export of the cache contents.
#[derive(Debug, Clone)]
pub struct SnapshotView<K, V> {
    /// Every live value by key
    pub values: HashMap<K, V>,
    /// Live keys, most recently used first
    pub order: Vec<K>,
    /// Most recently used key
    pub head: Option<K>,
    /// Least recently used key
    pub tail: Option<K>,
}

impl<K, V> SnapshotView<K, V> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K, V> PartialEq for SnapshotView<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
            && self.head == other.head
            && self.tail == other.tail
            && self.values == other.values
    }
}

// == Cache Store ==
/// Bounded LRU cache engine with optional expiry timestamps.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Recency order and expiry metadata
    index: EntryIndex<K>,
    /// Key-value storage
    values: ValueStore<K, V>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of live entries
    capacity: usize,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, at least 1
    /// * `ttl` - Lifetime of new entries, None = never expire
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Result<Self> {
        if capacity < 1 {
            return Err(CacheError::Config(
                "capacity must be at least 1".to_string(),
            ));
        }
        let ttl = ttl.map(entry_ttl).transpose()?;

        Ok(Self {
            index: EntryIndex::new(ttl),
            values: ValueStore::new(),
            stats: CacheStats::new(),
            capacity,
        })
    }

    /// Creates a store from a validated configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity, config.ttl)
    }

    // == Put ==
    /// Stores a value and marks its key as most recently used.
    ///
    /// An existing key has its value replaced and keeps its expiry time.
    /// If the insert pushes the store over capacity, the least recently
    /// used entry is evicted and its key returned.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        self.index.touch(key.clone());
        self.values.set(key, value);

        if self.index.len() > self.capacity {
            self.evict_tail()
        } else {
            None
        }
    }

    // == Get ==
    /// Retrieves a value and marks its key as most recently used.
    ///
    /// Returns None on a miss. Expired entries stay visible until the next
    /// sweep removes them.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hit = self.index.promote(key);
        self.stats.record_lookup(hit);
        if !hit {
            return None;
        }
        self.values.get(key)
    }

    // == Remove Key ==
    /// Removes a key from the cache.
    ///
    /// Removing an absent key is a no-op. Returns whether anything was removed.
    pub fn remove_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.index.remove(key).is_some();
        self.values.remove(key);
        removed
    }

    // == Clear All ==
    /// Drops every entry. Statistics counters are kept.
    pub fn clear_all(&mut self) {
        self.index.clear();
        self.values.clear();
    }

    // == Snapshot View ==
    /// Copies the current contents and recency order.
    pub fn snapshot_view(&self) -> SnapshotView<K, V>
    where
        V: Clone,
    {
        let order: Vec<K> = self.index.keys(true).cloned().collect();
        let values = order
            .iter()
            .filter_map(|key| {
                self.values
                    .get(key)
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect();

        SnapshotView {
            values,
            head: order.first().cloned(),
            tail: order.last().cloned(),
            order,
        }
    }

    /// Lazily walks live keys; see [`EntryIndex::keys`].
    pub fn ordered_keys(&self, from_head: bool) -> Keys<'_, K> {
        self.index.keys(from_head)
    }

    // == Expiry ==
    /// Keys whose expiry timestamp is at or before `now`, most recent first.
    pub fn expired_keys(&self, now: DateTime<Utc>) -> Vec<K> {
        self.index
            .entries(true)
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Removes every entry that is expired at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired = self.expired_keys(now);
        let count = expired.len();

        for key in &expired {
            self.remove_key(key);
        }

        self.stats.record_expirations(count);
        count
    }

    // == Restore ==
    /// Replaces the whole cache with `entries`, ordered most recently used
    /// first.
    ///
    /// Keys are replayed oldest first so the final order matches the input.
    /// Entries beyond capacity are dropped from the least recent end. Every
    /// restored entry gets fresh timestamps.
    pub fn restore(&mut self, mut entries: Vec<(K, V)>) -> usize {
        if entries.len() > self.capacity {
            warn!(
                entries = entries.len(),
                capacity = self.capacity,
                "Snapshot exceeds capacity, dropping least recently used entries"
            );
            entries.truncate(self.capacity);
        }

        self.clear_all();
        for (key, value) in entries.into_iter().rev() {
            self.index.touch(key.clone());
            self.values.set(key, value);
        }

        self.index.len()
    }

    // == Accessors ==
    /// Entry metadata for a key, without promoting it.
    pub fn entry<Q>(&self, key: &Q) -> Option<&CacheEntry<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.with_entries(self.index.len())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Invariant Check ==
    /// Verifies the index chain and that index and value store hold the
    /// same keys within capacity.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.index.check_invariants()?;
        if self.index.len() != self.values.len() {
            return Err(format!(
                "index tracks {} keys but value store holds {}",
                self.index.len(),
                self.values.len()
            ));
        }
        if self.index.len() > self.capacity {
            return Err(format!(
                "{} live entries exceed capacity {}",
                self.index.len(),
                self.capacity
            ));
        }
        let indexed: HashSet<&K> = self.index.keys(true).collect();
        if self.values.iter().any(|(key, _)| !indexed.contains(key)) {
            return Err("value store holds a key missing from the index".to_string());
        }
        Ok(())
    }

    fn evict_tail(&mut self) -> Option<K> {
        let key = self.index.tail()?.key.clone();
        self.index.remove(&key);
        self.values.remove(&key);
        self.stats.record_eviction();
        debug!(capacity = self.capacity, "Evicted least recently used entry");
        Some(key)
    }
}
