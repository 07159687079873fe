//! # Cache Branch (Write-Buffering View)
//!
//! A copy-on-write view over the store's working layer.
//!
//! ## Semantics
//!
//! - Read: buffered write if present, otherwise the working layer
//! - Write: buffered locally; the working layer is untouched
//! - `write()`: merge buffered writes into the working layer and clear them
//! - Drop: buffered writes are discarded
//!
//! `fork()` snapshots the branch's buffered writes into an independent
//! branch over the same working layer. Writes to the fork never reach the
//! original; the original's later writes never reach the fork.

use super::{ChangeSet, Key, Value};
use crate::ports::WorkingLayer;
use std::fmt;
use std::sync::Arc;

pub struct CacheBranch {
    parent: Arc<dyn WorkingLayer>,
    pending: ChangeSet,
}

impl CacheBranch {
    /// Create an empty branch over `parent`.
    pub fn new(parent: Arc<dyn WorkingLayer>) -> Self {
        Self {
            parent,
            pending: ChangeSet::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<Value> {
        match self.pending.get(key) {
            Some(buffered) => buffered.cloned(),
            None => self.parent.get(key),
        }
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.pending.set(key.into(), value.into());
    }

    pub fn delete(&mut self, key: impl Into<Key>) {
        self.pending.delete(key.into());
    }

    /// Independent branch seeded with this branch's buffered writes.
    pub fn fork(&self) -> Self {
        Self {
            parent: Arc::clone(&self.parent),
            pending: self.pending.clone(),
        }
    }

    pub fn pending(&self) -> &ChangeSet {
        &self.pending
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush buffered writes into the working layer.
    pub fn write(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let changes = self.pending.take();
        self.parent.apply(changes);
    }
}

impl fmt::Debug for CacheBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBranch")
            .field("pending_writes", &self.pending.len())
            .finish()
    }
}
