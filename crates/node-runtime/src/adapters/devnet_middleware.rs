//! # Devnet Middleware
//!
//! A minimal state transition for running the lifecycle without an execution
//! client. Blocks are JSON headers chained by parent hash; the only state is
//! the validator registry, the chain head and the block index.

use crate::genesis::GenesisState;
use qc_18_block_lifecycle::{BuiltProposal, Middleware, MiddlewareError, PhaseState, SlotData};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{
    FinalizeBlockRequest, Hash, Height, ProcessProposalRequest, ProposalStatus, ValidatorUpdate,
    ZERO_HASH,
};
use tracing::debug;

const HEAD_HASH_KEY: &[u8] = b"chain/head_hash";
const HEAD_SLOT_KEY: &[u8] = b"chain/head_slot";

fn validator_key(pubkey: &[u8]) -> Vec<u8> {
    format!("validators/{}", hex::encode(pubkey)).into_bytes()
}

fn block_key(slot: Height) -> Vec<u8> {
    format!("blocks/{slot:020}").into_bytes()
}

/// Devnet block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevnetBlock {
    pub slot: Height,
    pub parent_hash: String,
    pub timestamp: i64,
    pub proposer: String,
}

impl DevnetBlock {
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn hash(bytes: &[u8]) -> Hash {
        Keccak256::digest(bytes).into()
    }
}

/// Devnet state transition
#[derive(Debug, Default)]
pub struct DevnetMiddleware;

impl DevnetMiddleware {
    pub fn new() -> Self {
        Self
    }

    fn head_hash(state: &PhaseState) -> Hash {
        state
            .get(HEAD_HASH_KEY)
            .and_then(|bytes| Hash::try_from(bytes.as_slice()).ok())
            .unwrap_or(ZERO_HASH)
    }
}

impl Middleware for DevnetMiddleware {
    fn init_genesis(
        &self,
        state: &mut PhaseState,
        genesis: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, MiddlewareError> {
        if genesis.is_empty() {
            return Err(MiddlewareError::Genesis("no genesis state".to_string()));
        }
        let genesis: GenesisState =
            serde_json::from_slice(genesis).map_err(|e| MiddlewareError::Genesis(e.to_string()))?;

        let mut updates = Vec::with_capacity(genesis.validators.len());
        for validator in &genesis.validators {
            let update = validator
                .to_update()
                .map_err(|e| MiddlewareError::Genesis(e.to_string()))?;
            state.set(
                validator_key(update.pubkey.as_bytes()),
                update.effective_balance.to_be_bytes().to_vec(),
            );
            updates.push(update);
        }

        debug!(validators = updates.len(), "Devnet genesis applied");
        Ok(updates)
    }

    fn prepare_proposal(
        &self,
        state: &mut PhaseState,
        slot: &SlotData,
    ) -> Result<BuiltProposal, MiddlewareError> {
        let block = DevnetBlock {
            slot: slot.slot,
            parent_hash: hex::encode(Self::head_hash(state)),
            timestamp: slot.time.timestamp(),
            proposer: hex::encode(&slot.proposer_address),
        };
        let block = serde_json::to_vec(&block)
            .map_err(|e| MiddlewareError::BuildProposal(e.to_string()))?;

        Ok(BuiltProposal {
            block,
            sidecars: b"[]".to_vec(),
        })
    }

    fn process_proposal(
        &self,
        state: &mut PhaseState,
        request: &ProcessProposalRequest,
    ) -> Result<ProposalStatus, MiddlewareError> {
        let raw = request
            .txs
            .first()
            .ok_or_else(|| MiddlewareError::VerifyProposal("empty proposal".to_string()))?;
        let block =
            DevnetBlock::decode(raw).map_err(|e| MiddlewareError::VerifyProposal(e.to_string()))?;

        if block.slot != request.height {
            debug!(slot = block.slot, height = request.height, "Proposal slot mismatch");
            return Ok(ProposalStatus::Reject);
        }
        if block.parent_hash != hex::encode(Self::head_hash(state)) {
            debug!(height = request.height, "Proposal does not extend the head");
            return Ok(ProposalStatus::Reject);
        }
        Ok(ProposalStatus::Accept)
    }

    fn finalize_block(
        &self,
        state: &mut PhaseState,
        request: &FinalizeBlockRequest,
    ) -> Result<Vec<ValidatorUpdate>, MiddlewareError> {
        if let Some(raw) = request.txs.first() {
            let block =
                DevnetBlock::decode(raw).map_err(|e| MiddlewareError::ApplyBlock(e.to_string()))?;
            if block.slot != request.height {
                return Err(MiddlewareError::ApplyBlock(format!(
                    "block slot {} at height {}",
                    block.slot, request.height
                )));
            }
            state.set(block_key(block.slot), raw.clone());
            state.set(HEAD_HASH_KEY.to_vec(), DevnetBlock::hash(raw).to_vec());
        }
        state.set(HEAD_SLOT_KEY.to_vec(), request.height.to_be_bytes().to_vec());
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use qc_04_state_management::{InMemoryVersionedStore, VersionedStore};
    use qc_18_block_lifecycle::{Phase, PhaseContext};

    fn state(store: &InMemoryVersionedStore, phase: Phase, height: Height) -> PhaseState {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        PhaseState::new(PhaseContext::new(phase, height, time, "qc-devnet"), store.branch())
    }

    fn slot(height: Height) -> SlotData {
        SlotData {
            slot: height,
            time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            proposer_address: vec![1; 20],
        }
    }

    fn process(height: Height, txs: Vec<Vec<u8>>) -> ProcessProposalRequest {
        ProcessProposalRequest {
            height,
            time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            txs,
            hash: [0; 32],
            proposer_address: vec![1; 20],
        }
    }

    #[test]
    fn test_proposal_round_trip_accepted() {
        let store = InMemoryVersionedStore::new();
        let middleware = DevnetMiddleware::new();

        let built = middleware
            .prepare_proposal(&mut state(&store, Phase::Prepare, 1), &slot(1))
            .unwrap();
        let verdict = middleware
            .process_proposal(
                &mut state(&store, Phase::Process, 1),
                &process(1, built.into_txs()),
            )
            .unwrap();
        assert_eq!(verdict, ProposalStatus::Accept);
    }

    #[test]
    fn test_wrong_slot_rejected() {
        let store = InMemoryVersionedStore::new();
        let middleware = DevnetMiddleware::new();

        let built = middleware
            .prepare_proposal(&mut state(&store, Phase::Prepare, 1), &slot(1))
            .unwrap();
        let verdict = middleware
            .process_proposal(
                &mut state(&store, Phase::Process, 2),
                &process(2, built.into_txs()),
            )
            .unwrap();
        assert_eq!(verdict, ProposalStatus::Reject);
    }

    #[test]
    fn test_garbage_proposal_is_an_error() {
        let store = InMemoryVersionedStore::new();
        let result = DevnetMiddleware::new().process_proposal(
            &mut state(&store, Phase::Process, 1),
            &process(1, vec![b"garbage".to_vec()]),
        );
        assert!(matches!(result, Err(MiddlewareError::VerifyProposal(_))));
    }

    #[test]
    fn test_empty_genesis_rejected() {
        let store = InMemoryVersionedStore::new();
        let result =
            DevnetMiddleware::new().init_genesis(&mut state(&store, Phase::Genesis, 1), b"");
        assert!(matches!(result, Err(MiddlewareError::Genesis(_))));
    }
}
