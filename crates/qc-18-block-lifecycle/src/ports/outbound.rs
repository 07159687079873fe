//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The orchestrator owns sequencing and state lifetimes; everything the chain
//! actually computes happens behind `Middleware`. Consensus parameters live
//! behind `ParamStore` so they can change over the life of the chain.

use crate::domain::PhaseState;
use crate::error::MiddlewareError;
use shared_types::{
    BlockTime, ConsensusParams, FinalizeBlockRequest, Height, ProcessProposalRequest,
    ProposalStatus, ValidatorUpdate,
};

/// Slot information for building a proposal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotData {
    pub slot: Height,
    pub time: BlockTime,
    pub proposer_address: Vec<u8>,
}

/// Serialized proposal produced by the middleware
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuiltProposal {
    pub block: Vec<u8>,
    pub sidecars: Vec<u8>,
}

impl BuiltProposal {
    /// Transaction list handed back to the engine: block first, then sidecars.
    pub fn into_txs(self) -> Vec<Vec<u8>> {
        vec![self.block, self.sidecars]
    }
}

/// State-transition middleware
///
/// Every call receives the phase's own state; writes made to it are kept or
/// discarded by the orchestrator, never by the middleware.
pub trait Middleware: Send + Sync {
    /// Apply genesis and return the initial validator set.
    fn init_genesis(
        &self,
        state: &mut PhaseState,
        genesis: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, MiddlewareError>;

    /// Build the block and blob sidecars for a slot.
    fn prepare_proposal(
        &self,
        state: &mut PhaseState,
        slot: &SlotData,
    ) -> Result<BuiltProposal, MiddlewareError>;

    /// Verify a proposal. An error is treated as rejection.
    fn process_proposal(
        &self,
        state: &mut PhaseState,
        request: &ProcessProposalRequest,
    ) -> Result<ProposalStatus, MiddlewareError>;

    /// Execute a decided block and return the validator set delta.
    fn finalize_block(
        &self,
        state: &mut PhaseState,
        request: &FinalizeBlockRequest,
    ) -> Result<Vec<ValidatorUpdate>, MiddlewareError>;

    /// Whether a raw transaction is an application transaction. Anything
    /// else in the block is reported as skipped.
    fn is_envelope(&self, _tx: &[u8]) -> bool {
        false
    }
}

/// Consensus parameter storage
pub trait ParamStore: Send + Sync {
    /// Current parameters
    fn get(&self) -> ConsensusParams;

    /// Replace the parameters
    fn set(&self, params: ConsensusParams);
}
