//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};

use crate::config::Expiration;

// == Expiry ==
/// Absolute expiry of an entry, fixed at insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
}

impl Expiry {
    /// Resolves a TTL against the current time.
    ///
    /// An instant past chrono's representable range saturates: far future
    /// becomes `Never`, far past becomes the earliest representable instant.
    pub fn from_ttl(ttl: Expiration) -> Self {
        match ttl {
            Expiration::Never => Expiry::Never,
            Expiration::After(ttl) => match Utc::now().checked_add_signed(ttl) {
                Some(at) => Expiry::At(at),
                None if ttl < Duration::zero() => Expiry::At(DateTime::<Utc>::MIN_UTC),
                None => Expiry::Never,
            },
        }
    }

    /// An entry is expired once the current time reaches its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => now >= *at,
        }
    }
}

// == Cache Entry ==
/// A stored value together with the key it was inserted under and its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Original key, compared on lookup to detect digest collisions
    pub key: String,
    /// The stored value
    pub value: V,
    pub expiry: Expiry,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(key: impl Into<String>, value: V, ttl: Expiration) -> Self {
        Self {
            key: key.into(),
            value,
            expiry: Expiry::from_ttl(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry.is_expired()
    }
}
