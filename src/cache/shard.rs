//! Shard Module
//!
//! One independently locked partition of the cache's key space.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cache::CacheEntry;

// == Shard ==
/// Map of digest to entry behind a single reader/writer lock.
///
/// Mutations take the lock exclusively, reads take it shared. Values are
/// cloned out under the read lock; no user code runs while it is held.
#[derive(Debug)]
pub struct Shard<V> {
    entries: RwLock<HashMap<u64, CacheEntry<V>>>,
}

impl<V> Default for Shard<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Shard<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or wholesale replaces the entry stored at `digest`.
    pub fn put(&self, digest: u64, entry: CacheEntry<V>) {
        self.entries.write().insert(digest, entry);
    }

    /// Removes the entry at `digest` if it was stored under `key`.
    ///
    /// Returns whether anything was removed.
    pub fn delete(&self, digest: u64, key: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get(&digest) {
            Some(entry) if entry.key == key => entries.remove(&digest).is_some(),
            _ => false,
        }
    }

    /// Drops every entry.
    pub fn flush(&self) {
        *self.entries.write() = HashMap::new();
    }

    /// Removes every expired entry and returns how many were removed.
    ///
    /// Candidates are collected under the read lock; each removal then
    /// re-checks expiry under the write lock, so an entry replaced by a
    /// concurrent `put` is kept.
    pub fn sweep_expired(&self) -> usize {
        let candidates: Vec<u64> = self
            .entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(digest, _)| *digest)
            .collect();

        let mut removed = 0;
        for digest in candidates {
            let mut entries = self.entries.write();
            if entries.get(&digest).is_some_and(CacheEntry::is_expired) {
                entries.remove(&digest);
                removed += 1;
            }
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V: Clone> Shard<V> {
    /// Returns a clone of the value at `digest`.
    ///
    /// `None` when absent, expired, or stored under a different key.
    /// Expired entries stay in the map until swept.
    pub fn get(&self, digest: u64, key: &str) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(&digest)
            .filter(|entry| entry.key == key && !entry.is_expired())
            .map(|entry| entry.value.clone())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Expiry;
    use crate::config::Expiration;
    use chrono::Duration;

    const FAKE_HASH: u64 = 123_123;

    fn entry(key: &str, value: &'static str, ttl: Expiration) -> CacheEntry<&'static str> {
        CacheEntry::new(key, value, ttl)
    }

    #[test]
    fn test_shard_put() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::Never));

        let entries = shard.entries.read();
        let stored = entries.get(&FAKE_HASH).unwrap();
        assert_eq!(stored.value, "test");
        assert_eq!(stored.expiry, Expiry::Never);
    }

    #[test]
    fn test_shard_put_replaces() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "old", Expiration::Never));
        shard.put(FAKE_HASH, entry("key", "new", Expiration::Never));

        assert_eq!(shard.len(), 1);
        assert_eq!(shard.get(FAKE_HASH, "key"), Some("new"));
    }

    #[test]
    fn test_shard_get_non_expiring() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::Never));
        assert_eq!(shard.get(FAKE_HASH, "key"), Some("test"));
    }

    #[test]
    fn test_shard_get_expires_in_future() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::After(Duration::hours(1))));
        assert_eq!(shard.get(FAKE_HASH, "key"), Some("test"));
    }

    #[test]
    fn test_shard_get_expired_is_lazy() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::After(-Duration::seconds(1))));

        assert_eq!(shard.get(FAKE_HASH, "key"), None);
        // Still physically present until a sweep runs
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn test_shard_get_missing() {
        let shard: Shard<&str> = Shard::new();
        assert_eq!(shard.get(FAKE_HASH, "key"), None);
    }

    #[test]
    fn test_shard_get_colliding_key() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::Never));
        assert_eq!(shard.get(FAKE_HASH, "other"), None);
    }

    #[test]
    fn test_shard_delete() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::Never));

        assert!(shard.delete(FAKE_HASH, "key"));
        assert!(shard.is_empty());
        assert!(!shard.delete(FAKE_HASH, "key"));
    }

    #[test]
    fn test_shard_delete_colliding_key_is_noop() {
        let shard = Shard::new();
        shard.put(FAKE_HASH, entry("key", "test", Expiration::Never));

        assert!(!shard.delete(FAKE_HASH, "other"));
        assert_eq!(shard.get(FAKE_HASH, "key"), Some("test"));
    }

    #[test]
    fn test_shard_flush() {
        let shard = Shard::new();
        for i in 0..10u64 {
            shard.put(i, entry(&i.to_string(), "v", Expiration::Never));
        }

        shard.flush();
        assert!(shard.is_empty());
    }

    #[test]
    fn test_shard_sweep_expired() {
        let shard = Shard::new();
        for i in 0..10u64 {
            shard.put(i, entry(&i.to_string(), "v", Expiration::After(-Duration::minutes(1))));
        }
        shard.put(100, entry("live", "v", Expiration::After(Duration::hours(1))));
        shard.put(101, entry("forever", "v", Expiration::Never));

        assert_eq!(shard.sweep_expired(), 10);
        assert_eq!(shard.len(), 2);
        assert_eq!(shard.get(100, "live"), Some("v"));
        assert_eq!(shard.get(101, "forever"), Some("v"));
    }

    #[test]
    fn test_shard_sweep_empty() {
        let shard: Shard<u8> = Shard::new();
        assert_eq!(shard.sweep_expired(), 0);
    }
}
