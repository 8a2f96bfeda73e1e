//! Key Hasher Module
//!
//! Digest functions used to route keys to shards.

// == Key Hasher ==
/// Produces a 64-bit digest from a string key.
///
/// Implementations must be pure: the same key always yields the same digest,
/// across calls and across instances.
pub trait KeyHasher: Send + Sync {
    fn sum64(&self, key: &str) -> u64;
}

// == djb2 ==
/// Dan Bernstein's djb2 string hash (`hash * 33 + byte`, seeded with 5381).
///
/// Fast and well distributed for ordinary keys, but not collision resistant
/// against adversarial input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Djb2Hasher;

/// djb2 seed; also the digest of the empty string.
pub const DJB2_SEED: u64 = 5381;

impl Djb2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl KeyHasher for Djb2Hasher {
    fn sum64(&self, key: &str) -> u64 {
        key.bytes().fold(DJB2_SEED, |hash, byte| {
            (hash << 5).wrapping_add(hash).wrapping_add(u64::from(byte))
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_djb2_known_values() {
        let h = Djb2Hasher::new();
        assert_eq!(h.sum64("Hello"), 210_676_686_969);
        assert_eq!(h.sum64("Hello!"), 6_952_330_670_010);
    }

    #[test]
    fn test_djb2_is_deterministic() {
        let a = Djb2Hasher::new();
        let b = Djb2Hasher::new();
        assert_eq!(a.sum64("Hello"), a.sum64("Hello"));
        assert_eq!(a.sum64("Hello"), b.sum64("Hello"));
    }

    #[test]
    fn test_djb2_one_char_difference() {
        let h = Djb2Hasher::new();
        assert_ne!(h.sum64("Hello"), h.sum64("Hello!"));
    }

    #[test]
    fn test_djb2_case_sensitive() {
        let h = Djb2Hasher::new();
        assert_ne!(h.sum64("Hello"), h.sum64("hello"));
    }

    #[test]
    fn test_djb2_whitespace_only() {
        let h = Djb2Hasher::new();
        assert_eq!(h.sum64("  "), 5_860_997);
    }

    #[test]
    fn test_djb2_empty_string() {
        assert_eq!(Djb2Hasher::new().sum64(""), 5381);
    }

    #[test]
    fn test_djb2_wraps_on_long_input() {
        // Long enough to overflow u64 many times over; must not panic
        let key = "x".repeat(10_000);
        let h = Djb2Hasher::new();
        assert_eq!(h.sum64(&key), h.sum64(&key));
    }
}
