//! This module provides deterministic `HashMap` and `HashSet` aliases. The hashing data
//! structures in the standard library are randomly seeded per process, which would make
//! iteration order (and therefore any random draws that depend on it) vary from run to run.
//!
//! The `hash_str` free function is used by `crate::random` to derive an independent seed for
//! each named random number generator.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("ContactRng");
        let b = hash_str("ContactRng");
        let c = hash_str("TransmissionRng");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
