//! Entry Index Module
//!
//! Tracks recency order for LRU eviction.
//!
//! Entries live in a slot arena and are chained by slot indices into a
//! doubly-linked list:
//! - Head = Most recently used
//! - Tail = Least recently used
//!
//! A key-to-slot map gives O(1) promotion, removal and tail lookup.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::Duration;

use crate::cache::entry::{CacheEntry, SlotId};

// == Entry Index ==
/// Recency-ordered set of live keys.
#[derive(Debug)]
pub struct EntryIndex<K> {
    /// Entry arena; `None` marks a free slot
    slots: Vec<Option<CacheEntry<K>>>,
    /// Free slots available for reuse
    free: Vec<SlotId>,
    /// Key to slot lookup
    lookup: HashMap<K, SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    /// Lifetime given to newly created entries
    ttl: Option<Duration>,
}

impl<K> EntryIndex<K>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty index. New entries expire `ttl` after creation.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            lookup: HashMap::new(),
            head: None,
            tail: None,
            ttl,
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// A new key gets a fresh entry linked at the head. An existing key is
    /// relinked at the head and keeps its timestamps.
    pub fn touch(&mut self, key: K) -> &CacheEntry<K> {
        let slot = match self.lookup.get(&key) {
            Some(&slot) => {
                self.move_to_head(slot);
                slot
            }
            None => {
                let slot = self.allocate(CacheEntry::new(key.clone(), self.ttl));
                self.link_at_head(slot);
                self.lookup.insert(key, slot);
                slot
            }
        };
        self.node(slot)
    }

    // == Promote ==
    /// Relinks an existing key at the head. Returns false if the key is absent.
    pub fn promote<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.lookup.get(key) {
            Some(&slot) => {
                self.move_to_head(slot);
                true
            }
            None => false,
        }
    }

    // == Remove ==
    /// Unlinks and deregisters a key, returning its entry.
    ///
    /// Returns None if the key is not tracked.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<CacheEntry<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.lookup.remove(key)?;
        self.unlink(slot);
        let entry = self.slots[slot].take();
        self.free.push(slot);
        entry
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.lookup.clear();
        self.head = None;
        self.tail = None;
    }

    // == Ordered Keys ==
    /// Iterates keys from most to least recently used when `from_head` is
    /// true, or in the reverse order otherwise.
    ///
    /// Every call yields a fresh traversal. The iterator borrows the index,
    /// so the index cannot be mutated while a traversal is alive.
    pub fn keys(&self, from_head: bool) -> Keys<'_, K> {
        Keys {
            entries: self.entries(from_head),
        }
    }

    /// Iterates entries in recency order; see [`EntryIndex::keys`].
    pub fn entries(&self, from_head: bool) -> Entries<'_, K> {
        Entries {
            index: self,
            cursor: if from_head { self.head } else { self.tail },
            from_head,
        }
    }

    // == Lookups ==
    pub fn get<Q>(&self, key: &Q) -> Option<&CacheEntry<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.get(key).map(|&slot| self.node(slot))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.contains_key(key)
    }

    /// Most recently used entry.
    pub fn head(&self) -> Option<&CacheEntry<K>> {
        self.head.map(|slot| self.node(slot))
    }

    /// Least recently used entry, the next eviction candidate.
    pub fn tail(&self) -> Option<&CacheEntry<K>> {
        self.tail.map(|slot| self.node(slot))
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    // == Invariant Check ==
    /// Walks the chain in both directions and checks it against the lookup
    /// map. Returns a description of the first inconsistency found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.head.is_none() != self.tail.is_none() {
            return Err("exactly one of head and tail is set".to_string());
        }
        if let Some(head) = self.head() {
            if head.prev.is_some() {
                return Err("head has a previous link".to_string());
            }
        }
        if let Some(tail) = self.tail() {
            if tail.next.is_some() {
                return Err("tail has a next link".to_string());
            }
        }

        let mut seen = 0usize;
        let mut prev: Option<SlotId> = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.slots.get(slot).and_then(Option::as_ref).ok_or_else(|| {
                format!("chain points at free slot {}", slot)
            })?;
            if node.prev != prev {
                return Err(format!("slot {} has a stale previous link", slot));
            }
            if self.lookup.get(&node.key) != Some(&slot) {
                return Err(format!("slot {} is not registered under its key", slot));
            }
            seen += 1;
            if seen > self.lookup.len() {
                return Err("chain is longer than the lookup map".to_string());
            }
            prev = cursor;
            cursor = node.next;
        }
        if prev != self.tail {
            return Err("chain does not end at the tail".to_string());
        }
        if seen != self.lookup.len() {
            return Err(format!(
                "chain holds {} entries but lookup holds {}",
                seen,
                self.lookup.len()
            ));
        }
        Ok(())
    }

    // == Internal Helpers ==
    fn node(&self, slot: SlotId) -> &CacheEntry<K> {
        self.slots[slot]
            .as_ref()
            .expect("entry index slot referenced while free")
    }

    fn node_mut(&mut self, slot: SlotId) -> &mut CacheEntry<K> {
        self.slots[slot]
            .as_mut()
            .expect("entry index slot referenced while free")
    }

    fn allocate(&mut self, entry: CacheEntry<K>) -> SlotId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn link_at_head(&mut self, slot: SlotId) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old) => self.node_mut(old).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn unlink(&mut self, slot: SlotId) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn move_to_head(&mut self, slot: SlotId) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_at_head(slot);
    }
}

// == Iterators ==
/// Recency-ordered entry traversal.
pub struct Entries<'a, K> {
    index: &'a EntryIndex<K>,
    cursor: Option<SlotId>,
    from_head: bool,
}

impl<'a, K> Iterator for Entries<'a, K>
where
    K: Hash + Eq + Clone,
{
    type Item = &'a CacheEntry<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.index.node(self.cursor?);
        self.cursor = if self.from_head { node.next } else { node.prev };
        Some(node)
    }
}

/// Recency-ordered key traversal.
pub struct Keys<'a, K> {
    entries: Entries<'a, K>,
}

impl<'a, K> Iterator for Keys<'a, K>
where
    K: Hash + Eq + Clone,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|entry| &entry.key)
    }
}
