//! # Historical Queries
//!
//! Read-only access to committed heights. Queries never see uncommitted
//! writes and never block the phase calls: a `QueryService` only touches the
//! store's committed history, so it can be cloned onto any number of reader
//! threads while the engine keeps driving the lifecycle.

use crate::error::{LifecycleError, LifecycleResult};
use qc_04_state_management::{StoreView, Value, VersionedStore};
use shared_types::{Hash, Height};
use std::sync::Arc;
use tracing::debug;

/// Immutable view of one committed height
#[derive(Clone, Debug)]
pub struct QueryContext {
    height: Height,
    prove: bool,
    view: StoreView,
}

impl QueryContext {
    pub fn height(&self) -> Height {
        self.height
    }

    /// Whether the caller asked for proofs alongside results
    pub fn prove(&self) -> bool {
        self.prove
    }

    /// Content hash of the store at this height
    pub fn app_hash(&self) -> Hash {
        self.view.hash()
    }

    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.view.get(key)
    }

    pub fn view(&self) -> &StoreView {
        &self.view
    }
}

/// Factory for query contexts, shareable across threads
pub struct QueryService<S: VersionedStore> {
    store: Arc<S>,
    app_name: String,
}

impl<S: VersionedStore> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            app_name: self.app_name.clone(),
        }
    }
}

impl<S: VersionedStore> QueryService<S> {
    pub fn new(store: Arc<S>, app_name: impl Into<String>) -> Self {
        Self {
            store,
            app_name: app_name.into(),
        }
    }

    /// Open a read-only context at `height`; 0 selects the latest height.
    ///
    /// Proofs need a previous version to prove against, so `prove` is only
    /// accepted above height 1.
    pub fn create_query_context(
        &self,
        height: Height,
        prove: bool,
    ) -> LifecycleResult<QueryContext> {
        let latest = self.store.latest_version();
        if latest == 0 {
            return Err(LifecycleError::NotReady {
                app_name: self.app_name.clone(),
            });
        }
        if height > latest {
            return Err(LifecycleError::FutureHeight {
                requested: height,
                latest,
            });
        }

        let height = if height == 0 { latest } else { height };
        if prove && height <= 1 {
            return Err(LifecycleError::InvalidProofHeight { height });
        }

        let view = self
            .store
            .load_at_version(height)
            .map_err(|source| LifecycleError::VersionNotFound {
                height,
                latest,
                source,
            })?;

        debug!(height, prove, "Opened query context");
        Ok(QueryContext {
            height,
            prove,
            view,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_04_state_management::InMemoryVersionedStore;

    fn store_with_heights(n: u8) -> Arc<InMemoryVersionedStore> {
        let store = Arc::new(InMemoryVersionedStore::new());
        for i in 1..=n {
            let mut branch = store.branch();
            branch.set(b"height".to_vec(), vec![i]);
            branch.write();
            store.commit().unwrap();
        }
        store
    }

    #[test]
    fn test_not_ready_before_first_commit() {
        let service = QueryService::new(store_with_heights(0), "qc");
        assert!(matches!(
            service.create_query_context(0, false),
            Err(LifecycleError::NotReady { .. })
        ));
    }

    #[test]
    fn test_zero_selects_latest() {
        let service = QueryService::new(store_with_heights(5), "qc");
        let ctx = service.create_query_context(0, false).unwrap();
        assert_eq!(ctx.height(), 5);
        assert_eq!(ctx.get(b"height"), Some(&vec![5]));
    }

    #[test]
    fn test_historical_height() {
        let service = QueryService::new(store_with_heights(5), "qc");
        let ctx = service.create_query_context(3, true).unwrap();
        assert_eq!(ctx.get(b"height"), Some(&vec![3]));
        assert!(ctx.prove());
    }

    #[test]
    fn test_future_height_rejected() {
        let service = QueryService::new(store_with_heights(5), "qc");
        assert!(matches!(
            service.create_query_context(6, false),
            Err(LifecycleError::FutureHeight {
                requested: 6,
                latest: 5
            })
        ));
    }

    #[test]
    fn test_proof_at_height_one_rejected() {
        let service = QueryService::new(store_with_heights(5), "qc");
        assert!(matches!(
            service.create_query_context(1, true),
            Err(LifecycleError::InvalidProofHeight { height: 1 })
        ));
        assert!(service.create_query_context(1, false).is_ok());

        // 0 resolves to the latest height before the proof check
        let single = QueryService::new(store_with_heights(1), "qc");
        assert!(matches!(
            single.create_query_context(0, true),
            Err(LifecycleError::InvalidProofHeight { height: 1 })
        ));
    }

    #[test]
    fn test_pruned_height_not_found() {
        let store = store_with_heights(5);
        store.prune_versions(3).unwrap();
        let service = QueryService::new(store, "qc");
        assert!(matches!(
            service.create_query_context(2, false),
            Err(LifecycleError::VersionNotFound {
                height: 2,
                latest: 5,
                ..
            })
        ));
    }
}
