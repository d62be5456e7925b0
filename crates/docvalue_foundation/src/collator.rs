//! String comparison seam for locale-aware collation.

use std::cmp::Ordering;

use crate::hash::{hash_bytes, mix};

/// Pluggable string ordering.
///
/// Implementations must keep [`compare`](Self::compare) and
/// [`comparison_key`](Self::comparison_key) consistent: two strings compare
/// equal exactly when their keys are byte-identical. Hashing goes through the
/// key, which keeps equal strings hashing alike.
pub trait StringComparator: Send + Sync {
    /// Three-way comparison of two strings.
    fn compare(&self, left: &str, right: &str) -> Ordering;

    /// Returns the collation key for a string.
    fn comparison_key(&self, text: &str) -> Vec<u8>;

    /// Mixes the string into `seed` through its collation key.
    fn hash_combine(&self, seed: &mut u64, text: &str) {
        mix(seed, hash_bytes(&self.comparison_key(text)));
    }
}

/// Byte-wise comparison; the key is the string itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleStringComparator;

impl StringComparator for SimpleStringComparator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.as_bytes().cmp(right.as_bytes())
    }

    fn comparison_key(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    fn hash_combine(&self, seed: &mut u64, text: &str) {
        mix(seed, hash_bytes(text.as_bytes()));
    }
}
