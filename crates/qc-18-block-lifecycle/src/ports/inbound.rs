//! Driving Ports (API - Inbound)
//!
//! The consensus engine calls these entry points strictly sequentially, one
//! at a time. Historical queries run concurrently through `QueryService`.

use crate::error::LifecycleResult;
use crate::query::QueryContext;
use shared_types::{
    CommitResponse, FinalizeBlockRequest, FinalizeBlockResponse, Height, InfoResponse,
    InitChainRequest, InitChainResponse, PrepareProposalRequest, PrepareProposalResponse,
    ProcessProposalRequest, ProcessProposalResponse,
};

/// Primary Block Lifecycle API
pub trait BlockLifecycleApi {
    /// Initialize the chain from genesis. Nothing is committed.
    fn init_chain(&mut self, request: &InitChainRequest) -> LifecycleResult<InitChainResponse>;

    /// Last committed height and hash, for engine handshake.
    fn info(&self) -> InfoResponse;

    /// Build a proposal. Middleware failure falls back to the request's
    /// transactions.
    fn prepare_proposal(
        &mut self,
        request: &PrepareProposalRequest,
    ) -> LifecycleResult<PrepareProposalResponse>;

    /// Vote on a proposal. Middleware failure is a rejection, not an error.
    fn process_proposal(
        &mut self,
        request: &ProcessProposalRequest,
    ) -> LifecycleResult<ProcessProposalResponse>;

    /// Execute the decided block and compute its app hash.
    fn finalize_block(
        &mut self,
        request: &FinalizeBlockRequest,
    ) -> LifecycleResult<FinalizeBlockResponse>;

    /// Make the finalized block durable.
    ///
    /// # Panics
    ///
    /// When no FinalizeBlock preceded it in this height's cycle.
    fn commit(&mut self) -> LifecycleResult<CommitResponse>;

    /// Read-only view of a committed height. 0 means the latest.
    fn create_query_context(&self, height: Height, prove: bool) -> LifecycleResult<QueryContext>;
}
