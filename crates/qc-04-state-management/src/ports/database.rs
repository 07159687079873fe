use crate::domain::{CacheBranch, ChangeSet, CommitId, Hash, Height, StoreResult, StoreView, Value};

/// The uncommitted top layer of a versioned store. Branches read through it
/// and flush into it.
pub trait WorkingLayer: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Value>;
    fn apply(&self, changes: ChangeSet);
}

/// Multi-version key-value store consumed by the block lifecycle.
///
/// Versions are numbered by block height. The first commit produces
/// version 1, or the configured initial version.
pub trait VersionedStore: Send + Sync {
    /// Fresh write-buffering branch over the working layer.
    fn branch(&self) -> CacheBranch;

    /// Freeze the working layer as the next version.
    fn commit(&self) -> StoreResult<CommitId>;

    /// Content hash of the working layer (what the next commit will produce).
    fn working_hash(&self) -> Hash;

    /// Latest committed version, 0 before the first commit.
    fn latest_version(&self) -> Height;

    fn last_commit_id(&self) -> CommitId;

    /// Read-only view of a committed version.
    fn load_at_version(&self, version: Height) -> StoreResult<StoreView>;

    /// Number the first commit `version` instead of 1.
    fn set_initial_version(&self, version: Height) -> StoreResult<()>;

    /// Drop committed versions below `retain_from`. Returns how many were dropped.
    fn prune_versions(&self, retain_from: Height) -> StoreResult<u64>;
}
