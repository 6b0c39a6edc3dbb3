//! Cache Entry Module
//!
//! Defines the per-key record kept by the entry index: timestamps plus the
//! arena slot links that place the key in recency order.

use chrono::{DateTime, Duration, Utc};

/// Index of an entry inside the entry index arena.
pub type SlotId = usize;

// == Cache Entry ==
/// Tracks one live key's position in recency order and its expiry time.
#[derive(Debug, Clone)]
pub struct CacheEntry<K> {
    /// The key this entry tracks
    pub key: K,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Absolute expiration timestamp, None = never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Neighbour towards the head (more recently used)
    pub(crate) prev: Option<SlotId>,
    /// Neighbour towards the tail (less recently used)
    pub(crate) next: Option<SlotId>,
}

impl<K> CacheEntry<K> {
    // == Constructor ==
    /// Creates an unlinked entry stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - The key to track
    /// * `ttl` - Optional time-to-live measured from now; an expiry past the
    ///   last representable timestamp means the entry never expires
    pub fn new(key: K, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        Self {
            key,
            created_at: now,
            expires_at: ttl.and_then(|ttl| now.checked_add_signed(ttl)),
            prev: None,
            next: None,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is due for removal at `now`.
    ///
    /// An entry is expired once `now` reaches its expiry timestamp.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the entry never expires.
    ///
    /// Returns a zero duration once the entry has expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at.map(|expires| {
            let remaining = expires - Utc::now();
            remaining.max(Duration::zero())
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("key", None);

        assert_eq!(entry.key, "key");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.prev.is_none());
        assert!(entry.next.is_none());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("key", Some(Duration::seconds(60)));

        let expires = entry.expires_at.unwrap();
        assert_eq!(expires - entry.created_at, Duration::seconds(60));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_unrepresentable_expiry_never_expires() {
        let entry = CacheEntry::new("key", Some(Duration::seconds(1_000_000_000_000_000)));

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("key", Some(Duration::seconds(5)));
        let expires = entry.expires_at.unwrap();

        assert!(!entry.is_expired_at(expires - Duration::milliseconds(1)));
        assert!(entry.is_expired_at(expires));
        assert!(entry.is_expired_at(expires + Duration::seconds(1)));
    }

    #[test]
    fn test_never_expires_far_in_future() {
        let entry = CacheEntry::new(7u32, None);
        assert!(!entry.is_expired_at(Utc::now() + Duration::days(365 * 100)));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("key", Some(Duration::seconds(10)));

        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= Duration::seconds(10));
        assert!(remaining >= Duration::seconds(9));
    }

    #[test]
    fn test_ttl_remaining_expired_is_zero() {
        let mut entry = CacheEntry::new("key", Some(Duration::seconds(10)));
        entry.expires_at = Some(Utc::now() - Duration::seconds(1));

        assert_eq!(entry.ttl_remaining(), Some(Duration::zero()));
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        let entry = CacheEntry::new("key", None);
        assert!(entry.ttl_remaining().is_none());
    }
}
