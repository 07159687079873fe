//! Error types for the Block Lifecycle subsystem
//!
//! Two families live here: errors the orchestrator returns to the consensus
//! engine (`LifecycleError`) and errors the state-transition middleware
//! reports back (`MiddlewareError`).
//!
//! Ordering violations that leave no valid recovery (Commit or the working
//! hash without a Finalize state, or a commit that lands on a version other
//! than the finalized height) are not represented: they abort the process.

use crate::domain::Phase;
use qc_04_state_management::StoreError;
use shared_types::{Height, ValidatorUpdateError};
use thiserror::Error;

/// Block Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// InitChain carried a chain id other than the configured one
    #[error("Invalid chain id on InitChain: expected {expected}, got {actual}")]
    ChainMismatch { expected: String, actual: String },

    /// Genesis produced a validator set the engine did not expect
    #[error("Genesis validator set mismatch: {0}")]
    ValidatorSetMismatch(#[from] ValidatorSetMismatch),

    /// Height below 1 on a phase request
    #[error("{phase} called with invalid height {height}")]
    InvalidHeight { phase: Phase, height: Height },

    /// FinalizeBlock height does not follow the last committed height
    #[error("Invalid finalize height {actual}; expected {expected}")]
    HeightMismatch { expected: Height, actual: Height },

    /// A finalized block is waiting for Commit; no phase may run until then
    #[error("{phase} called while block {height} awaits Commit")]
    AwaitingCommit { phase: Phase, height: Height },

    /// Query issued before the first commit
    #[error("{app_name} is not ready; wait for the first block")]
    NotReady { app_name: String },

    /// Query height above the latest committed height
    #[error("Cannot query height {requested} in the future; latest height {latest}")]
    FutureHeight { requested: Height, latest: Height },

    /// Proof requested for a height with no prior version to prove against
    #[error("Cannot query with proof at height {height}; height must be greater than 1")]
    InvalidProofHeight { height: Height },

    /// Requested version is not retained by the store
    #[error("Failed to load state at height {height} (latest height {latest}): {source}")]
    VersionNotFound {
        height: Height,
        latest: Height,
        #[source]
        source: StoreError,
    },

    /// The state-transition middleware failed
    #[error("Middleware failure: {0}")]
    Middleware(#[from] MiddlewareError),

    /// Genesis application state is not a JSON object
    #[error("Invalid genesis app state: {0}")]
    InvalidGenesis(#[from] serde_json::Error),

    /// A validator update could not be expressed for the engine
    #[error("Validator update conversion failed: {0}")]
    ValidatorConversion(#[from] ValidatorUpdateError),

    /// A proposal at the initial height arrived before InitChain
    #[error("No genesis state for proposal at initial height {height}")]
    GenesisStateMissing { height: Height },

    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LifecycleError {
    /// True when the consensus engine broke the call protocol, as opposed to
    /// the application failing to execute a well-formed request.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::ChainMismatch { .. }
                | Self::InvalidHeight { .. }
                | Self::HeightMismatch { .. }
                | Self::AwaitingCommit { .. }
                | Self::GenesisStateMissing { .. }
        )
    }
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// First difference found between the expected genesis validators and the
/// set computed by the middleware. Indices refer to canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorSetMismatch {
    #[error("expected {expected} validators, genesis produced {actual}")]
    Count { expected: usize, actual: usize },

    #[error("mismatched power at index {index}: expected {expected}, got {actual}")]
    Power {
        index: usize,
        expected: i64,
        actual: i64,
    },

    #[error("mismatched public key bytes at index {index}")]
    PubKeyBytes { index: usize },

    #[error("mismatched public key type at index {index}: expected {expected}, got {actual}")]
    PubKeyType {
        index: usize,
        expected: String,
        actual: String,
    },
}

/// Errors reported by the state-transition middleware
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiddlewareError {
    #[error("Genesis initialization failed: {0}")]
    Genesis(String),

    #[error("Failed to build proposal: {0}")]
    BuildProposal(String),

    #[error("Proposal verification failed: {0}")]
    VerifyProposal(String),

    #[error("Failed to apply block: {0}")]
    ApplyBlock(String),
}
