//! # Height Driver
//!
//! Stands in for the consensus engine on a single-validator devnet: every
//! height runs PrepareProposal and ProcessProposal until a proposal is
//! accepted, then FinalizeBlock and Commit.

use anyhow::{bail, Context, Result};
use qc_04_state_management::VersionedStore;
use qc_18_block_lifecycle::{BlockLifecycle, BlockLifecycleApi, Middleware, ParamStore};
use shared_types::{
    BlockTime, FinalizeBlockRequest, Hash, Height, InitChainRequest, InitChainResponse,
    PrepareProposalRequest, ProcessProposalRequest,
};
use tracing::{info, warn};

/// Proposal rounds attempted per height before giving up.
pub const MAX_ROUNDS: u32 = 3;

/// Outcome of one driven height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: Height,
    pub rounds: u32,
    pub txs: usize,
    pub app_hash: Hash,
    pub retain_height: Height,
}

pub struct HeightDriver<S, M, P>
where
    S: VersionedStore,
    M: Middleware,
    P: ParamStore,
{
    lifecycle: BlockLifecycle<S, M, P>,
    proposer_address: Vec<u8>,
    next_height: Height,
}

impl<S, M, P> HeightDriver<S, M, P>
where
    S: VersionedStore,
    M: Middleware,
    P: ParamStore,
{
    pub fn new(lifecycle: BlockLifecycle<S, M, P>, proposer_address: Vec<u8>) -> Self {
        let next_height = lifecycle.info().last_block_height + 1;
        Self {
            lifecycle,
            proposer_address,
            next_height,
        }
    }

    pub fn lifecycle(&self) -> &BlockLifecycle<S, M, P> {
        &self.lifecycle
    }

    pub fn next_height(&self) -> Height {
        self.next_height
    }

    /// Run InitChain and position the driver at the chain's first height.
    pub fn init_chain(&mut self, genesis: &InitChainRequest) -> Result<InitChainResponse> {
        let response = self
            .lifecycle
            .init_chain(genesis)
            .context("InitChain failed")?;
        self.next_height = self.lifecycle.initial_height();
        Ok(response)
    }

    /// Drive the next height through to commit.
    pub fn produce_block(&mut self, time: BlockTime) -> Result<BlockSummary> {
        let height = self.next_height;

        let mut accepted = None;
        for round in 1..=MAX_ROUNDS {
            let proposal = self.lifecycle.prepare_proposal(&PrepareProposalRequest {
                height,
                time,
                txs: Vec::new(),
                max_tx_bytes: 1 << 20,
                proposer_address: self.proposer_address.clone(),
            })?;

            let verdict = self.lifecycle.process_proposal(&ProcessProposalRequest {
                height,
                time,
                txs: proposal.txs.clone(),
                hash: [0u8; 32],
                proposer_address: self.proposer_address.clone(),
            })?;

            if verdict.is_accepted() {
                accepted = Some((round, proposal.txs));
                break;
            }
            warn!(height, round, "Proposal rejected; starting new round");
        }

        let Some((rounds, txs)) = accepted else {
            bail!("no proposal accepted at height {height} after {MAX_ROUNDS} rounds");
        };

        let finalized = self.lifecycle.finalize_block(&FinalizeBlockRequest {
            height,
            time,
            txs: txs.clone(),
            hash: [0u8; 32],
            proposer_address: self.proposer_address.clone(),
        })?;
        let committed = self.lifecycle.commit()?;

        if finalized.app_hash != committed.committed_hash {
            bail!(
                "app hash diverged at height {height}: finalized {} committed {}",
                hex::encode(finalized.app_hash),
                hex::encode(committed.committed_hash)
            );
        }

        self.next_height = height + 1;
        info!(
            height,
            rounds,
            app_hash = %hex::encode(committed.committed_hash),
            retain_height = committed.retain_height,
            "Block produced"
        );

        Ok(BlockSummary {
            height,
            rounds,
            txs: txs.len(),
            app_hash: committed.committed_hash,
            retain_height: committed.retain_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DevnetMiddleware;
    use crate::genesis::DevnetGenesis;
    use chrono::{Duration, TimeZone, Utc};
    use qc_04_state_management::InMemoryVersionedStore;
    use qc_18_block_lifecycle::{LifecycleConfig, LifecycleDependencies, SharedParamStore};
    use shared_types::BLS12_381_KEY_TYPE;
    use std::sync::Arc;

    type DevnetDriver = HeightDriver<InMemoryVersionedStore, DevnetMiddleware, SharedParamStore>;

    fn driver() -> DevnetDriver {
        let lifecycle = BlockLifecycle::new(
            LifecycleConfig::for_chain("qc-devnet"),
            LifecycleDependencies {
                store: Arc::new(InMemoryVersionedStore::new()),
                middleware: Arc::new(DevnetMiddleware::new()),
                params: Arc::new(SharedParamStore::default()),
            },
        );
        HeightDriver::new(lifecycle, vec![7; 20])
    }

    #[test]
    fn test_devnet_chain_advances() {
        let mut driver = driver();
        let genesis = DevnetGenesis::new("qc-devnet", "beacon")
            .with_validators(4)
            .build(BLS12_381_KEY_TYPE)
            .unwrap();
        let response = driver.init_chain(&genesis).unwrap();
        assert_eq!(response.validators.len(), 4);

        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for i in 1..=3 {
            let summary = driver
                .produce_block(start + Duration::seconds(i))
                .unwrap();
            assert_eq!(summary.height, i as u64);
            assert_eq!(summary.rounds, 1);
            assert_eq!(summary.txs, 2);
        }

        let ctx = driver.lifecycle().create_query_context(0, true).unwrap();
        assert_eq!(ctx.height(), 3);
        assert!(ctx.get(b"chain/head_hash").is_some());
    }

    #[test]
    fn test_initial_height_respected() {
        let mut driver = driver();
        let genesis = DevnetGenesis::new("qc-devnet", "beacon")
            .with_validators(1)
            .with_initial_height(10)
            .build(BLS12_381_KEY_TYPE)
            .unwrap();
        driver.init_chain(&genesis).unwrap();
        assert_eq!(driver.next_height(), 10);

        let summary = driver
            .produce_block(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .unwrap();
        assert_eq!(summary.height, 10);
    }
}
