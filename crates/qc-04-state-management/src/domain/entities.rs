//! # Domain Entities for State Management
//!
//! ## Type Decisions
//!
//! - Keys and values are opaque byte strings. Applications namespace their
//!   keys; the store imposes no encoding.
//! - `KvMap` is a `BTreeMap` so iteration (and therefore hashing) is ordered.

use std::collections::btree_map;
use std::collections::BTreeMap;

pub use shared_types::{CommitId, Hash, Height, ZERO_HASH};

pub type Key = Vec<u8>;
pub type Value = Vec<u8>;

/// A full key space at one point in time.
pub type KvMap = BTreeMap<Key, Value>;

/// Buffered writes of a branch. `None` records a deletion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: BTreeMap<Key, Option<Value>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Key, value: Value) {
        self.entries.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Key) {
        self.entries.insert(key, None);
    }

    /// Buffered state of `key`: `None` if untouched, `Some(None)` if deleted.
    pub fn get(&self, key: &[u8]) -> Option<Option<&Value>> {
        self.entries.get(key).map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Key, Option<Value>> {
        self.entries.iter()
    }

    /// Apply every buffered write to `target`.
    pub fn apply_to(&self, target: &mut KvMap) {
        for (key, value) in &self.entries {
            match value {
                Some(v) => {
                    target.insert(key.clone(), v.clone());
                }
                None => {
                    target.remove(key);
                }
            }
        }
    }

    /// Drain into a fresh set, leaving `self` empty.
    pub fn take(&mut self) -> ChangeSet {
        std::mem::take(self)
    }
}
