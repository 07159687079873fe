//! # Consensus Engine Messages
//!
//! Request and response types for the application callbacks the consensus
//! engine drives, one pair per entry point.
//!
//! ```text
//! InitChain ──→ { PrepareProposal | ProcessProposal }* ──→ FinalizeBlock ──→ Commit
//!                        (per round)                          (per height)
//! ```

use crate::entities::{AbciValidatorUpdate, BlockTime, ConsensusParams, Hash, Height};
use serde::{Deserialize, Serialize};

/// Raw transaction bytes as carried in a proposal.
pub type RawTx = Vec<u8>;

// =============================================================================
// INIT / INFO
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitChainRequest {
    pub time: BlockTime,
    pub chain_id: String,
    pub consensus_params: Option<ConsensusParams>,
    /// Expected genesis validator set. Empty means "accept what genesis computes".
    pub validators: Vec<AbciValidatorUpdate>,
    /// Genesis application state: a JSON object keyed by module name.
    pub app_state_bytes: Vec<u8>,
    /// 0 is treated as 1.
    pub initial_height: Height,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitChainResponse {
    pub consensus_params: Option<ConsensusParams>,
    pub validators: Vec<AbciValidatorUpdate>,
    pub app_hash: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub data: String,
    pub version: String,
    pub app_version: u64,
    pub last_block_height: Height,
    pub last_block_app_hash: Hash,
}

// =============================================================================
// PROPOSALS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareProposalRequest {
    pub height: Height,
    pub time: BlockTime,
    /// Mempool transactions offered by the engine.
    pub txs: Vec<RawTx>,
    pub max_tx_bytes: i64,
    pub proposer_address: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareProposalResponse {
    pub txs: Vec<RawTx>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessProposalRequest {
    pub height: Height,
    pub time: BlockTime,
    pub txs: Vec<RawTx>,
    pub hash: Hash,
    pub proposer_address: Vec<u8>,
}

/// Outcome of validating a proposal. Rejection is a normal protocol outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessProposalResponse {
    pub status: ProposalStatus,
}

impl ProcessProposalResponse {
    pub fn accept() -> Self {
        Self {
            status: ProposalStatus::Accept,
        }
    }

    pub fn reject() -> Self {
        Self {
            status: ProposalStatus::Reject,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ProposalStatus::Accept
    }
}

// =============================================================================
// FINALIZE / COMMIT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeBlockRequest {
    pub height: Height,
    pub time: BlockTime,
    pub txs: Vec<RawTx>,
    pub hash: Hash,
    pub proposer_address: Vec<u8>,
}

/// Per-transaction execution result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecTxResult {
    pub code: u32,
    pub codespace: String,
    pub log: String,
    pub data: Vec<u8>,
    pub gas_wanted: i64,
    pub gas_used: i64,
}

impl ExecTxResult {
    /// Code used for transactions outside the application's envelope.
    pub const SKIPPED_CODE: u32 = 2;

    /// Result for a raw transaction that is not an application transaction
    /// (vote extensions, block/sidecar payloads). Recorded, never fatal.
    pub fn skipped() -> Self {
        Self {
            code: Self::SKIPPED_CODE,
            codespace: "sdk".to_string(),
            log: "skip decoding".to_string(),
            ..Default::default()
        }
    }

    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeBlockResponse {
    pub tx_results: Vec<ExecTxResult>,
    pub validator_updates: Vec<AbciValidatorUpdate>,
    pub consensus_param_updates: Option<ConsensusParams>,
    /// Working hash of the block's writes, computed before the durable commit.
    pub app_hash: Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// Blocks below this height may be discarded by the engine. 0 retains all.
    pub retain_height: Height,
    /// Version and content hash just made durable.
    pub committed_version: Height,
    pub committed_hash: Hash,
}
