//! cacher - A sharded, thread-safe in-memory key-value cache
//!
//! Entries are spread across independently locked shards to cut lock
//! contention. Supports per-item and default TTLs with lazy expiry on read
//! and a background sweep driven by a tokio task.
//!
//! ```ignore
//! use cacher::{Cache, Config, Expiration};
//!
//! let cache: Cache<String> = Cache::new(Config::default())?;
//! cache.put("greeting", "hello".to_string())?;
//! assert_eq!(cache.get("greeting")?, "hello");
//! cache.close();
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, Djb2Hasher, KeyHasher};
pub use config::{CleanupInterval, Config, Expiration, Settings};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
