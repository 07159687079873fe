//! Block Lifecycle Service - phase orchestration
//!
//! # Sequencing
//!
//! ```text
//! InitChain ──→ [Finalize slot = genesis writes]
//!                   │
//! PrepareProposal ──┤ fork of genesis writes at the initial height,
//! ProcessProposal ──┤ fresh branch of the working layer otherwise
//!                   ↓
//! FinalizeBlock ──→ execute on a fork of the Finalize slot, replace slot,
//!                   flush into the working layer, report working hash
//!                   ↓
//! Commit ─────────→ durable version N, retain height, slot cleared
//! ```
//!
//! Every entry point either completes or leaves the orchestrator exactly as
//! it found it. Middleware runs against a fork and its writes are adopted
//! only once the whole call has succeeded.

use crate::config::LifecycleConfig;
use crate::domain::{
    convert_validator_updates, ensure_finalize_height, ensure_valid_height, module_genesis,
    reconcile_validator_sets, Phase, PhaseContext, PhaseSlots, PhaseState, RetentionPolicy, Slot,
};
use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::{BlockLifecycleApi, Middleware, ParamStore, SlotData};
use crate::query::{QueryContext, QueryService};
use qc_04_state_management::VersionedStore;
use shared_types::{
    BlockTime, CommitResponse, ExecTxResult, FinalizeBlockRequest, FinalizeBlockResponse, Hash,
    Height, InfoResponse, InitChainRequest, InitChainResponse, PrepareProposalRequest,
    PrepareProposalResponse, ProcessProposalRequest, ProcessProposalResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};


/// Where the chain is in its life
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// Fresh store, InitChain not yet accepted
    AwaitingGenesis,
    /// InitChain accepted, nothing committed yet
    Initialized,
    /// At least one block committed
    Running,
}

/// Collaborators the orchestrator drives
pub struct LifecycleDependencies<S, M, P> {
    pub store: Arc<S>,
    pub middleware: Arc<M>,
    pub params: Arc<P>,
}

/// Block Lifecycle orchestrator
///
/// Exclusively owns the three phase-state slots. Entry points take
/// `&mut self`: the consensus engine drives them one at a time.
pub struct BlockLifecycle<S, M, P>
where
    S: VersionedStore,
    M: Middleware,
    P: ParamStore,
{
    config: LifecycleConfig,
    store: Arc<S>,
    middleware: Arc<M>,
    params: Arc<P>,
    slots: PhaseSlots,
    initial_height: Height,
    status: LifecycleStatus,
}

impl<S, M, P> BlockLifecycle<S, M, P>
where
    S: VersionedStore,
    M: Middleware,
    P: ParamStore,
{
    pub fn new(config: LifecycleConfig, deps: LifecycleDependencies<S, M, P>) -> Self {
        let status = if deps.store.latest_version() > 0 {
            LifecycleStatus::Running
        } else {
            LifecycleStatus::AwaitingGenesis
        };

        Self {
            config,
            store: deps.store,
            middleware: deps.middleware,
            params: deps.params,
            slots: PhaseSlots::default(),
            initial_height: 1,
            status,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn initial_height(&self) -> Height {
        self.initial_height
    }

    pub fn slots(&self) -> &PhaseSlots {
        &self.slots
    }

    /// Handle for historical queries that may run on other threads.
    pub fn query_service(&self) -> QueryService<S> {
        QueryService::new(Arc::clone(&self.store), self.config.app_name.clone())
    }

    fn context(&self, phase: Phase, height: Height, time: BlockTime) -> PhaseContext {
        PhaseContext::new(phase, height, time, self.config.chain_id.clone())
    }

    /// Fresh state over the store's working layer.
    fn reset_state(&self, phase: Phase, height: Height, time: BlockTime) -> PhaseState {
        PhaseState::new(self.context(phase, height, time), self.store.branch())
    }

    /// State a proposal phase executes against.
    ///
    /// Nothing is committed at the initial height yet, so proposals there
    /// must see the writes InitChain left in the Finalize slot.
    fn proposal_state(
        &self,
        phase: Phase,
        height: Height,
        time: BlockTime,
    ) -> LifecycleResult<PhaseState> {
        if height != self.initial_height {
            return Ok(self.reset_state(phase, height, time));
        }

        let ctx = self.context(phase, height, time);
        self.slots
            .get(Slot::Finalize)
            .map(|genesis| genesis.fork(ctx))
            .ok_or(LifecycleError::GenesisStateMissing { height })
    }

    /// A finalized block has already been flushed into the working layer;
    /// nothing may run against that layer again until it is committed.
    fn ensure_not_awaiting_commit(&self, phase: Phase) -> LifecycleResult<()> {
        match self.slots.get(Slot::Finalize) {
            Some(state) if state.block_applied() => Err(LifecycleError::AwaitingCommit {
                phase,
                height: state.height(),
            }),
            _ => Ok(()),
        }
    }

    /// Flush the Finalize slot into the working layer and hash it.
    fn working_hash(&mut self) -> Hash {
        let Some(state) = self.slots.get_mut(Slot::Finalize) else {
            missing_finalize_state("working hash");
        };
        state.write();
        self.store.working_hash()
    }
}

impl<S, M, P> BlockLifecycleApi for BlockLifecycle<S, M, P>
where
    S: VersionedStore,
    M: Middleware,
    P: ParamStore,
{
    fn init_chain(&mut self, request: &InitChainRequest) -> LifecycleResult<InitChainResponse> {
        if request.chain_id != self.config.chain_id {
            return Err(LifecycleError::ChainMismatch {
                expected: self.config.chain_id.clone(),
                actual: request.chain_id.clone(),
            });
        }

        let initial_height = request.initial_height.max(1);
        info!(
            chain_id = %request.chain_id,
            initial_height,
            expected_validators = request.validators.len(),
            "InitChain"
        );

        let genesis = module_genesis(&request.app_state_bytes, &self.config.genesis_module)?;
        let mut state = self.reset_state(Phase::Genesis, initial_height, request.time);
        let updates = self.middleware.init_genesis(&mut state, &genesis)?;
        let validators = convert_validator_updates(&updates, &self.config.validator_key_type)?;

        if let Err(mismatch) = reconcile_validator_sets(&request.validators, &validators) {
            warn!(%mismatch, "Genesis validator set rejected");
            return Err(mismatch.into());
        }

        if initial_height > 1 {
            self.store.set_initial_version(initial_height)?;
        }
        if let Some(params) = &request.consensus_params {
            self.params.set(params.clone());
        }
        self.initial_height = initial_height;
        self.slots.reset(Slot::Finalize, state);
        self.status = LifecycleStatus::Initialized;

        let app_hash = self.store.last_commit_id().hash;
        info!(
            validators = validators.len(),
            app_hash = %hex::encode(app_hash),
            "Genesis applied"
        );

        Ok(InitChainResponse {
            consensus_params: request.consensus_params.clone(),
            validators,
            app_hash,
        })
    }

    fn info(&self) -> InfoResponse {
        let last = self.store.last_commit_id();
        let app_version = if last.is_empty() {
            0
        } else {
            self.params.get().version.app
        };

        InfoResponse {
            data: self.config.app_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            app_version,
            last_block_height: last.version,
            last_block_app_hash: last.hash,
        }
    }

    fn prepare_proposal(
        &mut self,
        request: &PrepareProposalRequest,
    ) -> LifecycleResult<PrepareProposalResponse> {
        ensure_valid_height(Phase::Prepare, request.height)?;
        self.ensure_not_awaiting_commit(Phase::Prepare)?;
        self.slots.clear(Slot::Prepare);

        let fresh = self.proposal_state(Phase::Prepare, request.height, request.time)?;
        let slot = SlotData {
            slot: request.height,
            time: request.time,
            proposer_address: request.proposer_address.clone(),
        };

        let state = self.slots.reset(Slot::Prepare, fresh);
        let built = self.middleware.prepare_proposal(state, &slot);
        self.slots.clear(Slot::Prepare);

        match built {
            Ok(proposal) => {
                debug!(height = request.height, "Prepared proposal");
                Ok(PrepareProposalResponse {
                    txs: proposal.into_txs(),
                })
            }
            Err(err) => {
                error!(
                    height = request.height,
                    time = %request.time,
                    %err,
                    "Failed to prepare proposal; returning request transactions"
                );
                Ok(PrepareProposalResponse {
                    txs: request.txs.clone(),
                })
            }
        }
    }

    fn process_proposal(
        &mut self,
        request: &ProcessProposalRequest,
    ) -> LifecycleResult<ProcessProposalResponse> {
        ensure_valid_height(Phase::Process, request.height)?;
        self.ensure_not_awaiting_commit(Phase::Process)?;
        self.slots.clear(Slot::Process);

        // Above the initial height the Finalize slot holds nothing worth
        // keeping; at the initial height it holds the genesis writes.
        if request.height > self.initial_height {
            let fresh = self.reset_state(Phase::Finalize, request.height, request.time);
            self.slots.reset(Slot::Finalize, fresh);
        }

        let fresh = self.proposal_state(Phase::Process, request.height, request.time)?;
        let state = self.slots.reset(Slot::Process, fresh);
        let verdict = self.middleware.process_proposal(state, request);
        self.slots.clear(Slot::Process);

        match verdict {
            Ok(status) => {
                debug!(height = request.height, ?status, "Processed proposal");
                Ok(ProcessProposalResponse { status })
            }
            Err(err) => {
                error!(
                    height = request.height,
                    hash = %hex::encode(request.hash),
                    %err,
                    "Failed to process proposal; rejecting"
                );
                Ok(ProcessProposalResponse::reject())
            }
        }
    }

    fn finalize_block(
        &mut self,
        request: &FinalizeBlockRequest,
    ) -> LifecycleResult<FinalizeBlockResponse> {
        let height = request.height;
        ensure_finalize_height(height, self.store.latest_version(), self.initial_height)?;
        self.ensure_not_awaiting_commit(Phase::Finalize)?;

        let ctx = self.context(Phase::Finalize, height, request.time);
        let mut attempt = match self.slots.get(Slot::Finalize) {
            Some(state) => state.fork(ctx),
            None => {
                debug!(height, "No finalize state; executing from the working layer");
                PhaseState::new(ctx, self.store.branch())
            }
        };

        let tx_results: Vec<ExecTxResult> = request
            .txs
            .iter()
            .map(|tx| {
                if self.middleware.is_envelope(tx) {
                    ExecTxResult::ok()
                } else {
                    ExecTxResult::skipped()
                }
            })
            .collect();

        let updates = self
            .middleware
            .finalize_block(&mut attempt, request)
            .map_err(|err| {
                warn!(height, %err, "Block execution failed");
                err
            })?;
        let validator_updates =
            convert_validator_updates(&updates, &self.config.validator_key_type)?;

        attempt.mark_block_applied();
        self.slots.reset(Slot::Finalize, attempt);
        let app_hash = self.working_hash();

        debug!(
            height,
            txs = tx_results.len(),
            validator_updates = validator_updates.len(),
            app_hash = %hex::encode(app_hash),
            "Finalized block"
        );

        Ok(FinalizeBlockResponse {
            tx_results,
            validator_updates,
            consensus_param_updates: Some(self.params.get()),
            app_hash,
        })
    }

    fn commit(&mut self) -> LifecycleResult<CommitResponse> {
        let height = match self.slots.get(Slot::Finalize) {
            Some(state) if state.block_applied() => state.height(),
            _ => missing_finalize_state("Commit"),
        };

        let committed = self.store.commit()?;
        if committed.version != height {
            committed_version_mismatch(height, committed.version);
        }

        let evidence_max_age = self.params.get().evidence.max_age_num_blocks;
        let retain_height = RetentionPolicy::new(self.config.min_retain_blocks, evidence_max_age)
            .retain_height(height);

        self.slots.clear(Slot::Finalize);
        self.status = LifecycleStatus::Running;

        if self.config.prune_state_on_commit && retain_height > 0 {
            match self.store.prune_versions(retain_height) {
                Ok(pruned) => debug!(retain_height, pruned, "Pruned state versions"),
                Err(err) => warn!(retain_height, %err, "Failed to prune state versions"),
            }
        }

        info!(
            height,
            retain_height,
            app_hash = %hex::encode(committed.hash),
            "Committed block"
        );

        Ok(CommitResponse {
            retain_height,
            committed_version: committed.version,
            committed_hash: committed.hash,
        })
    }

    fn create_query_context(&self, height: Height, prove: bool) -> LifecycleResult<QueryContext> {
        self.query_service().create_query_context(height, prove)
    }
}

/// The engine broke call ordering in a way that leaves no consistent state
/// to continue from.
#[track_caller]
fn missing_finalize_state(operation: &'static str) -> ! {
    error!(operation, "No finalized block state; consensus engine broke call ordering");
    panic!("{operation} called without a finalized block state");
}

/// The store numbered the new version differently from the finalized block,
/// so heights and versions no longer advance together.
#[track_caller]
fn committed_version_mismatch(height: Height, version: Height) -> ! {
    error!(height, version, "Committed store version differs from finalized height");
    panic!("Commit produced version {version} for finalized height {height}");
}
