//! Cache Module
//!
//! Sharded in-memory caching with TTL expiration.

mod entry;
mod hasher;
mod shard;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Expiry};
pub use hasher::{Djb2Hasher, KeyHasher, DJB2_SEED};
pub use shard::Shard;
pub use store::Cache;
