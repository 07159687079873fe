//! # Read-Only Store View
//!
//! An immutable snapshot of one committed version. Views share the
//! snapshot by `Arc`, so holding one never blocks writers.

use super::{Hash, Height, KvMap, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct StoreView {
    version: Height,
    hash: Hash,
    data: Arc<KvMap>,
}

impl StoreView {
    pub fn new(version: Height, hash: Hash, data: Arc<KvMap>) -> Self {
        Self {
            version,
            hash,
            data,
        }
    }

    pub fn version(&self) -> Height {
        self.version
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Entries whose key starts with `prefix`, in key order.
    pub fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a Value)> + 'a {
        self.data
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_slice(), v))
    }
}

impl fmt::Debug for StoreView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreView")
            .field("version", &self.version)
            .field("entries", &self.data.len())
            .finish()
    }
}
