//! Configuration Module
//!
//! Raw, partially-filled [`Config`] values are defaulted and validated into
//! immutable [`Settings`] before a cache is built.

use std::env;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Defaults ==
/// Shard count used when none is configured
pub const DEFAULT_NUMBER_OF_SHARDS: usize = 10;

/// Cleanup cadence used when none is configured (2 minutes)
pub const DEFAULT_CLEANUP_INTERVAL_SECS: i64 = 120;

/// Returns the default cleanup interval.
pub fn default_cleanup_interval() -> CleanupInterval {
    CleanupInterval::Every(Duration::seconds(DEFAULT_CLEANUP_INTERVAL_SECS))
}

// == Expiration ==
/// Time-to-live applied to an entry at insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// The entry never expires
    #[default]
    Never,
    /// The entry expires this long after insertion
    #[serde(rename = "after_ms")]
    After(#[serde(with = "millis")] Duration),
}

// == Cleanup Interval ==
/// Cadence of the background sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupInterval {
    /// No background task; expired entries are only hidden on read
    Disabled,
    /// Sweep every shard at this interval
    #[serde(rename = "every_ms")]
    Every(#[serde(with = "millis")] Duration),
}

// == Config ==
/// Cache configuration as supplied by the caller.
///
/// Every field is optional; unset fields receive their default in
/// [`Config::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TTL used by `put` (default: never expires)
    pub default_expiration: Option<Expiration>,
    /// Number of independently locked shards (default: 10, minimum: 2)
    pub number_of_shards: Option<usize>,
    /// Background sweep cadence (default: every 2 minutes)
    pub cleanup_interval: Option<CleanupInterval>,
    /// Largest accepted payload in bytes (default: unenforced)
    pub max_item_size: Option<usize>,
}

impl Config {
    /// Creates a Config by reading environment variables.
    ///
    /// # Environment Variables
    /// - `CACHER_DEFAULT_EXPIRATION` - `never` or TTL in seconds
    /// - `CACHER_NUMBER_OF_SHARDS` - shard count
    /// - `CACHER_CLEANUP_INTERVAL` - `disabled` or interval in seconds
    /// - `CACHER_MAX_ITEM_SIZE` - max payload size in bytes
    ///
    /// Unset variables are left as `None`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            default_expiration: read_env("CACHER_DEFAULT_EXPIRATION", |v| {
                if v.eq_ignore_ascii_case("never") {
                    Some(Expiration::Never)
                } else {
                    v.parse()
                        .ok()
                        .and_then(Duration::try_seconds)
                        .map(Expiration::After)
                }
            })?,
            number_of_shards: read_env("CACHER_NUMBER_OF_SHARDS", |v| v.parse().ok())?,
            cleanup_interval: read_env("CACHER_CLEANUP_INTERVAL", |v| {
                if v.eq_ignore_ascii_case("disabled") {
                    Some(CleanupInterval::Disabled)
                } else {
                    v.parse()
                        .ok()
                        .and_then(Duration::try_seconds)
                        .map(CleanupInterval::Every)
                }
            })?,
            max_item_size: read_env("CACHER_MAX_ITEM_SIZE", |v| v.parse().ok())?,
        })
    }

    /// Fills unset fields with defaults and validates the result.
    pub fn validate(self) -> Result<Settings> {
        let default_expiration = self.default_expiration.unwrap_or_default();
        if let Expiration::After(ttl) = default_expiration {
            if ttl <= Duration::zero() {
                return Err(CacheError::InvalidDefaultExpiration(ttl));
            }
        }

        let number_of_shards = self.number_of_shards.unwrap_or(DEFAULT_NUMBER_OF_SHARDS);
        if number_of_shards < 2 {
            return Err(CacheError::InvalidNumberOfShards(number_of_shards));
        }

        let cleanup_interval = self
            .cleanup_interval
            .unwrap_or_else(default_cleanup_interval);
        if let CleanupInterval::Every(interval) = cleanup_interval {
            if interval <= Duration::zero() {
                return Err(CacheError::InvalidCleanupInterval(interval));
            }
        }

        if self.max_item_size == Some(0) {
            return Err(CacheError::InvalidMaxItemSize(0));
        }

        Ok(Settings {
            default_expiration,
            number_of_shards,
            cleanup_interval,
            max_item_size: self.max_item_size,
        })
    }
}

fn read_env<T>(name: &'static str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => parse(value.trim())
            .map(Some)
            .ok_or(CacheError::InvalidEnvVar { name, value }),
        Err(_) => Ok(None),
    }
}

// == Settings ==
/// Validated, defaulted configuration. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    default_expiration: Expiration,
    number_of_shards: usize,
    cleanup_interval: CleanupInterval,
    max_item_size: Option<usize>,
}

impl Settings {
    pub fn default_expiration(&self) -> Expiration {
        self.default_expiration
    }

    pub fn number_of_shards(&self) -> usize {
        self.number_of_shards
    }

    pub fn cleanup_interval(&self) -> CleanupInterval {
        self.cleanup_interval
    }

    pub fn max_item_size(&self) -> Option<usize> {
        self.max_item_size
    }
}

/// Serde adapter storing a chrono `Duration` as whole milliseconds.
///
/// Durations with a sub-millisecond remainder are refused rather than
/// truncated.
mod millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let ms = d.num_milliseconds();
        if Duration::try_milliseconds(ms) != Some(*d) {
            return Err(serde::ser::Error::custom(format!(
                "duration {d} is not a whole number of milliseconds"
            )));
        }
        s.serialize_i64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(d)?;
        Duration::try_milliseconds(ms)
            .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {ms}ms")))
    }
}
