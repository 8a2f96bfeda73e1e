//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use chrono::Duration;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Default expiration is neither `Never` nor a positive duration
    #[error("Invalid default expiration: {0} (must be positive)")]
    InvalidDefaultExpiration(Duration),

    /// Fewer than two shards requested
    #[error("Invalid number of shards: {0} (must be at least 2)")]
    InvalidNumberOfShards(usize),

    /// Cleanup interval is neither `Disabled` nor a positive duration
    #[error("Invalid cleanup interval: {0} (must be positive)")]
    InvalidCleanupInterval(Duration),

    /// Max item size of zero bytes
    #[error("Invalid max item size: {0} (must be positive)")]
    InvalidMaxItemSize(usize),

    /// Environment variable could not be parsed
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnvVar { name: &'static str, value: String },

    /// Cleanup task requested outside of a tokio runtime
    #[error("Cleanup task requires a running tokio runtime")]
    RuntimeUnavailable,

    /// Key never inserted, deleted, or expired
    #[error("Item not found")]
    ItemNotFound,

    /// Payload exceeds the configured max item size
    #[error("Item too large: {size} bytes (max {max})")]
    ItemTooLarge { size: usize, max: usize },
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(CacheError::ItemNotFound.to_string(), "Item not found");
        assert_eq!(
            CacheError::InvalidNumberOfShards(1).to_string(),
            "Invalid number of shards: 1 (must be at least 2)"
        );
        assert_eq!(
            CacheError::ItemTooLarge { size: 10, max: 4 }.to_string(),
            "Item too large: 10 bytes (max 4)"
        );
    }
}
