//! In-process consensus parameter store

use crate::ports::ParamStore;
use parking_lot::RwLock;
use shared_types::ConsensusParams;
use std::sync::Arc;

/// Consensus parameters shared between the orchestrator and any other
/// component that needs to read or update them.
#[derive(Clone, Debug, Default)]
pub struct SharedParamStore {
    params: Arc<RwLock<ConsensusParams>>,
}

impl SharedParamStore {
    pub fn new(params: ConsensusParams) -> Self {
        Self {
            params: Arc::new(RwLock::new(params)),
        }
    }

    /// Apply `update` to the stored parameters in place.
    pub fn update(&self, update: impl FnOnce(&mut ConsensusParams)) {
        update(&mut self.params.write());
    }
}

impl ParamStore for SharedParamStore {
    fn get(&self) -> ConsensusParams {
        self.params.read().clone()
    }

    fn set(&self, params: ConsensusParams) {
        *self.params.write() = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_params() {
        let store = SharedParamStore::default();
        let other = store.clone();

        store.update(|p| p.evidence.max_age_num_blocks = 42);
        assert_eq!(other.get().evidence.max_age_num_blocks, 42);

        let mut replaced = ConsensusParams::default();
        replaced.version.app = 7;
        other.set(replaced);
        assert_eq!(store.get().version.app, 7);
    }
}
