//! Cache Store Module
//!
//! Sharded cache engine: routes each key to one of a fixed set of shards and
//! fans whole-cache operations out across all of them.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheEntry, Djb2Hasher, KeyHasher, Shard};
use crate::config::{CleanupInterval, Config, Expiration, Settings};
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_cleanup_task, Sweep};

/// Measures a payload in bytes for the max item size check.
pub(crate) type Weigher<V> = Box<dyn Fn(&V) -> usize + Send + Sync>;

// == Shared State ==
/// State shared between the cache handle and its cleanup task.
struct Shards<V, H> {
    shards: Box<[Shard<V>]>,
    hasher: H,
}

impl<V, H: KeyHasher> Shards<V, H> {
    fn shard_index(&self, digest: u64) -> usize {
        (digest % self.shards.len() as u64) as usize
    }

    /// Returns the digest of `key` and the shard it routes to.
    fn route(&self, key: &str) -> (u64, &Shard<V>) {
        let digest = self.hasher.sum64(key);
        (digest, &self.shards[self.shard_index(digest)])
    }
}

impl<V: Send + Sync, H> Shards<V, H> {
    /// Runs `op` on every shard, one scoped thread per shard, and waits for
    /// all of them.
    fn fan_out<R: Send>(&self, op: impl Fn(&Shard<V>) -> R + Sync) -> Vec<R> {
        let op = &op;
        thread::scope(|scope| {
            let workers: Vec<_> = self
                .shards
                .iter()
                .map(|shard| scope.spawn(move || op(shard)))
                .collect();
            workers
                .into_iter()
                .map(|worker| match worker.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

impl<V, H> Sweep for Shards<V, H>
where
    V: Send + Sync + 'static,
    H: Send + Sync + 'static,
{
    fn sweep_expired(&self) -> usize {
        self.fan_out(Shard::sweep_expired).into_iter().sum()
    }
}

// == Cache ==
/// Thread-safe, sharded in-memory key-value cache with TTL expiration.
///
/// Keys are routed with `digest % shard_count`; each shard has its own
/// reader/writer lock, so operations on different shards never contend.
/// When a cleanup interval is configured a tokio task sweeps expired entries
/// in the background until [`Cache::close`] is called or the cache is dropped.
pub struct Cache<V, H = Djb2Hasher> {
    inner: Arc<Shards<V, H>>,
    settings: Settings,
    weigher: Weigher<V>,
    cleaner: Mutex<Option<JoinHandle<()>>>,
}

impl<V> Cache<V, Djb2Hasher>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Validates `config` and creates a cache routed by djb2.
    ///
    /// # Errors
    /// Any config validation error, or `RuntimeUnavailable` if a cleanup
    /// interval is enabled and no tokio runtime is running.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_hasher(config, Djb2Hasher::new())
    }
}

impl<V, H> Cache<V, H>
where
    V: Clone + Send + Sync + 'static,
    H: KeyHasher + 'static,
{
    /// Validates `config` and creates a cache routed by `hasher`.
    pub fn with_hasher(config: Config, hasher: H) -> Result<Self> {
        let settings = config.validate()?;

        let shards = (0..settings.number_of_shards())
            .map(|_| Shard::new())
            .collect();
        let inner = Arc::new(Shards { shards, hasher });

        let cleaner = match settings.cleanup_interval() {
            CleanupInterval::Disabled => None,
            CleanupInterval::Every(interval) => {
                let interval = interval
                    .to_std()
                    .map_err(|_| CacheError::InvalidCleanupInterval(interval))?;
                Some(spawn_cleanup_task(Arc::downgrade(&inner), interval)?)
            }
        };

        debug!(
            "Cache initialized: shards={}, default_expiration={:?}, cleanup_interval={:?}",
            settings.number_of_shards(),
            settings.default_expiration(),
            settings.cleanup_interval()
        );

        Ok(Self {
            inner,
            settings,
            weigher: Box::new(|value: &V| std::mem::size_of_val(value)),
            cleaner: Mutex::new(cleaner),
        })
    }

    /// Replaces the function used to measure payloads against the max item
    /// size. The default measures `size_of_val`, which ignores heap data.
    pub fn with_weigher(
        mut self,
        weigher: impl Fn(&V) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.weigher = Box::new(weigher);
        self
    }

    // == Put ==
    /// Stores `value` under `key` with the default expiration.
    pub fn put(&self, key: &str, value: V) -> Result<()> {
        self.put_with_expiration(key, value, self.settings.default_expiration())
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A negative TTL stores an already-expired entry.
    ///
    /// # Errors
    /// `ItemTooLarge` when a max item size is configured and exceeded.
    pub fn put_with_expiration(&self, key: &str, value: V, ttl: Expiration) -> Result<()> {
        if let Some(max) = self.settings.max_item_size() {
            let size = (self.weigher)(&value);
            if size > max {
                return Err(CacheError::ItemTooLarge { size, max });
            }
        }

        let (digest, shard) = self.inner.route(key);
        shard.put(digest, CacheEntry::new(key, value, ttl));
        Ok(())
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// # Errors
    /// `ItemNotFound` when the key is absent or its entry has expired.
    pub fn get(&self, key: &str) -> Result<V> {
        let (digest, shard) = self.inner.route(key);
        shard.get(digest, key).ok_or(CacheError::ItemNotFound)
    }

    // == Delete ==
    /// Removes `key`. No-op if it is absent.
    pub fn delete(&self, key: &str) {
        let (digest, shard) = self.inner.route(key);
        shard.delete(digest, key);
    }

    // == Flush ==
    /// Empties every shard concurrently and returns once all are empty.
    ///
    /// Shards are cleared independently; a concurrent reader may observe a
    /// partially flushed cache.
    pub fn flush_all(&self) {
        self.inner.fan_out(Shard::flush);
    }

    // == Sweep ==
    /// Removes expired entries from every shard concurrently.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        Sweep::sweep_expired(&*self.inner)
    }

    // == Close ==
    /// Stops the background cleanup task. Safe to call more than once.
    pub fn close(&self) {
        if let Some(handle) = self.cleaner.lock().take() {
            handle.abort();
            debug!("Cache cleanup task stopped");
        }
    }

    // == Introspection ==
    /// Total stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.shards.iter().all(Shard::is_empty)
    }

    /// Index of the shard `key` routes to.
    pub fn shard_index_of(&self, key: &str) -> usize {
        self.inner.shard_index(self.inner.hasher.sum64(key))
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
impl<V, H> Cache<V, H> {
    /// Handle to the running cleanup task, if any.
    fn cleanup_task(&self) -> Option<tokio::task::AbortHandle> {
        self.cleaner.lock().as_ref().map(JoinHandle::abort_handle)
    }
}

impl<V, H> Drop for Cache<V, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.cleaner.get_mut().take() {
            handle.abort();
        }
    }
}

impl<V, H> std::fmt::Debug for Cache<V, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("shards", &self.inner.shards.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
