//! Deterministic hashing. The hashing data structures in the standard library are randomly
//! seeded, which would make iteration order, and therefore a simulation run, differ between
//! processes. The maps used by the engine are the `rustc-hash` variants instead.
//!
//! `hash_str` derives the seed offset of each named random number stream in
//! `crate::random`, so it must be stable across platforms and releases.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}
