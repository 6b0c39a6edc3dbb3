//! Value Store Module
//!
//! Key to value mapping with no ordering of its own.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

// == Value Store ==
#[derive(Debug)]
pub struct ValueStore<K, V> {
    values: HashMap<K, V>,
}

impl<K, V> ValueStore<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Stores a value, returning the one it replaced.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.values.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.get(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.remove(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.values.iter()
    }
}

impl<K, V> Default for ValueStore<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ValueStore<K, V>
where
    K: Hash + Eq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut store = ValueStore::new();

        assert!(store.set("a".to_string(), 1).is_none());
        assert_eq!(store.set("a".to_string(), 2), Some(1));
        assert_eq!(store.get("a"), Some(&2));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove("a"), Some(2));
        assert!(store.get("a").is_none());
        assert!(store.remove("a").is_none());
    }

    #[test]
    fn test_clear() {
        let mut store: ValueStore<u32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains(&1));
    }
}
