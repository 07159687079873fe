//! # Store Content Hash
//!
//! Deterministic content hash over a full key space.
//!
//! ## Algorithm: Leaf-Then-Root
//!
//! 1. Map (Parallel): leaf = keccak256(len(key) ‖ key ‖ len(value) ‖ value)
//!    for every entry, in ascending key order
//! 2. Reduce (Sequential): root = keccak256(leaf_0 ‖ leaf_1 ‖ ...)
//!
//! Length prefixes keep `("ab", "c")` and `("a", "bc")` distinct.

use super::{Hash, KvMap};
use rayon::prelude::*;
use sha3::{Digest, Keccak256};

/// Below this many entries leaves are hashed sequentially.
pub const PARALLEL_THRESHOLD: usize = 64;

/// keccak256 of no input. Content hash of an empty key space.
pub const EMPTY_STORE_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Content hash of a key space.
pub fn content_hash(map: &KvMap) -> Hash {
    let leaves: Vec<Hash> = if map.len() < PARALLEL_THRESHOLD {
        map.iter().map(|(k, v)| leaf_hash(k, v)).collect()
    } else {
        map.par_iter().map(|(k, v)| leaf_hash(k, v)).collect()
    };

    let mut hasher = Keccak256::new();
    for leaf in &leaves {
        hasher.update(leaf);
    }
    hasher.finalize().into()
}

fn leaf_hash(key: &[u8], value: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update((key.len() as u64).to_be_bytes());
    hasher.update(key);
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value);
    hasher.finalize().into()
}
