use crate::domain::{
    content_hash, CacheBranch, ChangeSet, CommitId, Hash, Height, KvMap, StoreError, StoreResult,
    StoreView, Value,
};
use crate::ports::{VersionedStore, WorkingLayer};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// In-memory implementation of VersionedStore.
///
/// Each commit keeps a full snapshot of the key space, so memory grows with
/// `versions × state size` until pruned. Suitable for tests and devnets.
///
/// ## Locking
///
/// The working layer and the committed history sit behind separate locks:
/// historical reads never wait on block execution writing to the working
/// layer.
#[derive(Clone, Default)]
pub struct InMemoryVersionedStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    working: RwLock<KvMap>,
    history: RwLock<VersionHistory>,
}

#[derive(Default)]
struct VersionHistory {
    versions: BTreeMap<Height, (Hash, Arc<KvMap>)>,
    last_commit: CommitId,
    initial_version: Option<Height>,
}

impl VersionHistory {
    fn next_version(&self) -> Height {
        if self.last_commit.is_empty() {
            self.initial_version.unwrap_or(1)
        } else {
            self.last_commit.version + 1
        }
    }
}

impl WorkingLayer for StoreInner {
    fn get(&self, key: &[u8]) -> Option<Value> {
        self.working.read().get(key).cloned()
    }

    fn apply(&self, changes: ChangeSet) {
        changes.apply_to(&mut self.working.write());
    }
}

impl InMemoryVersionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest version still retained, if any.
    pub fn earliest_version(&self) -> Option<Height> {
        self.inner.history.read().versions.keys().next().copied()
    }

    /// Number of committed versions currently retained.
    pub fn retained_versions(&self) -> usize {
        self.inner.history.read().versions.len()
    }
}

impl VersionedStore for InMemoryVersionedStore {
    fn branch(&self) -> CacheBranch {
        let parent: Arc<dyn WorkingLayer> = self.inner.clone();
        CacheBranch::new(parent)
    }

    fn commit(&self) -> StoreResult<CommitId> {
        let snapshot = Arc::new(self.inner.working.read().clone());
        let hash = content_hash(&snapshot);

        let mut history = self.inner.history.write();
        let version = history.next_version();
        history.versions.insert(version, (hash, snapshot));
        history.last_commit = CommitId::new(version, hash);

        debug!(version, entries = history.versions.len(), "Committed store version");
        Ok(history.last_commit)
    }

    fn working_hash(&self) -> Hash {
        content_hash(&self.inner.working.read())
    }

    fn latest_version(&self) -> Height {
        self.inner.history.read().last_commit.version
    }

    fn last_commit_id(&self) -> CommitId {
        self.inner.history.read().last_commit
    }

    fn load_at_version(&self, version: Height) -> StoreResult<StoreView> {
        let history = self.inner.history.read();
        history
            .versions
            .get(&version)
            .map(|(hash, data)| StoreView::new(version, *hash, Arc::clone(data)))
            .ok_or(StoreError::VersionNotFound {
                version,
                latest: history.last_commit.version,
            })
    }

    fn set_initial_version(&self, version: Height) -> StoreResult<()> {
        if version == 0 {
            return Err(StoreError::InvalidInitialVersion(version));
        }
        let mut history = self.inner.history.write();
        if !history.last_commit.is_empty() {
            return Err(StoreError::InitialVersionAfterCommit {
                latest: history.last_commit.version,
            });
        }
        history.initial_version = Some(version);
        Ok(())
    }

    fn prune_versions(&self, retain_from: Height) -> StoreResult<u64> {
        let mut history = self.inner.history.write();
        let latest = history.last_commit.version;
        if retain_from > latest {
            return Err(StoreError::PruneBeyondLatest {
                retain_from,
                latest,
            });
        }

        let before = history.versions.len();
        history.versions.retain(|version, _| *version >= retain_from);
        let pruned = (before - history.versions.len()) as u64;

        if pruned > 0 {
            debug!(retain_from, pruned, "Pruned store versions");
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EMPTY_STORE_HASH;

    fn commit_value(store: &InMemoryVersionedStore, key: &[u8], value: &[u8]) -> CommitId {
        let mut branch = store.branch();
        branch.set(key.to_vec(), value.to_vec());
        branch.write();
        store.commit().unwrap()
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let store = InMemoryVersionedStore::new();
        assert_eq!(store.latest_version(), 0);
        assert!(store.last_commit_id().is_empty());
        assert_eq!(store.working_hash(), EMPTY_STORE_HASH);
        assert!(matches!(
            store.load_at_version(1),
            Err(StoreError::VersionNotFound { version: 1, latest: 0 })
        ));
    }

    #[test]
    fn test_commit_advances_by_one() {
        let store = InMemoryVersionedStore::new();
        assert_eq!(commit_value(&store, b"a", b"1").version, 1);
        assert_eq!(commit_value(&store, b"a", b"2").version, 2);
        assert_eq!(store.latest_version(), 2);
    }

    #[test]
    fn test_commit_hash_matches_working_hash() {
        let store = InMemoryVersionedStore::new();
        let mut branch = store.branch();
        branch.set(b"k".to_vec(), b"v".to_vec());
        branch.write();

        let working = store.working_hash();
        let committed = store.commit().unwrap();
        assert_eq!(committed.hash, working);
    }

    #[test]
    fn test_unwritten_branch_does_not_change_working_hash() {
        let store = InMemoryVersionedStore::new();
        let before = store.working_hash();

        let mut branch = store.branch();
        branch.set(b"k".to_vec(), b"v".to_vec());

        assert_eq!(store.working_hash(), before);
    }

    #[test]
    fn test_historical_versions_are_immutable() {
        let store = InMemoryVersionedStore::new();
        commit_value(&store, b"a", b"1");
        commit_value(&store, b"a", b"2");

        let v1 = store.load_at_version(1).unwrap();
        let v2 = store.load_at_version(2).unwrap();
        assert_eq!(v1.get(b"a"), Some(&b"1".to_vec()));
        assert_eq!(v2.get(b"a"), Some(&b"2".to_vec()));
        assert_ne!(v1.hash(), v2.hash());
    }

    #[test]
    fn test_initial_version_numbers_first_commit() {
        let store = InMemoryVersionedStore::new();
        store.set_initial_version(100).unwrap();
        assert_eq!(commit_value(&store, b"a", b"1").version, 100);
        assert_eq!(commit_value(&store, b"a", b"2").version, 101);
    }

    #[test]
    fn test_initial_version_rejected_after_commit() {
        let store = InMemoryVersionedStore::new();
        commit_value(&store, b"a", b"1");
        assert!(matches!(
            store.set_initial_version(5),
            Err(StoreError::InitialVersionAfterCommit { latest: 1 })
        ));
        assert!(matches!(
            InMemoryVersionedStore::new().set_initial_version(0),
            Err(StoreError::InvalidInitialVersion(0))
        ));
    }

    #[test]
    fn test_prune_drops_old_versions() {
        let store = InMemoryVersionedStore::new();
        for i in 0..5u8 {
            commit_value(&store, b"a", &[i]);
        }

        assert_eq!(store.prune_versions(3).unwrap(), 2);
        assert_eq!(store.earliest_version(), Some(3));
        assert_eq!(store.retained_versions(), 3);
        assert!(store.load_at_version(2).is_err());
        assert!(store.load_at_version(3).is_ok());

        assert!(matches!(
            store.prune_versions(6),
            Err(StoreError::PruneBeyondLatest { retain_from: 6, latest: 5 })
        ));
    }

    #[test]
    fn test_cloned_handles_share_state() {
        let store = InMemoryVersionedStore::new();
        let reader = store.clone();
        commit_value(&store, b"a", b"1");
        assert_eq!(reader.latest_version(), 1);
    }

    mod model {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Set(u8, u8),
            Delete(u8),
            Flush,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..8, any::<u8>()).prop_map(|(k, v)| Op::Set(k, v)),
                (0u8..8).prop_map(Op::Delete),
                Just(Op::Flush),
            ]
        }

        proptest! {
            #[test]
            fn committed_view_matches_reference_map(ops in proptest::collection::vec(op(), 0..64)) {
                let store = InMemoryVersionedStore::new();
                let mut branch = store.branch();
                let mut reference = KvMap::new();

                for op in ops {
                    match op {
                        Op::Set(k, v) => {
                            branch.set(vec![k], vec![v]);
                            reference.insert(vec![k], vec![v]);
                        }
                        Op::Delete(k) => {
                            branch.delete(vec![k]);
                            reference.remove(&vec![k]);
                        }
                        Op::Flush => branch.write(),
                    }
                }
                branch.write();
                let committed = store.commit().unwrap();

                let view = store.load_at_version(committed.version).unwrap();
                prop_assert_eq!(view.len(), reference.len());
                for (k, v) in &reference {
                    prop_assert_eq!(view.get(k), Some(v));
                }
                prop_assert_eq!(committed.hash, content_hash(&reference));
            }
        }
    }
}
