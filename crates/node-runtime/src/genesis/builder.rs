//! # Genesis Builder
//!
//! Creates the devnet InitChain request and the validator set it is expected
//! to produce.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{
    AbciValidatorUpdate, ConsensusParams, Height, InitChainRequest, ValidatorUpdate,
    ValidatorUpdateError, BLS_PUBKEY_LEN,
};
use thiserror::Error;

/// Effective balance of every devnet validator, in Gwei.
pub const DEVNET_EFFECTIVE_BALANCE: u64 = 32_000_000_000;

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// Invalid genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),

    /// Validator public key is not 48 hex-encoded bytes.
    #[error("Invalid validator public key: {0}")]
    InvalidPubkey(String),

    /// Genesis state could not be encoded or decoded.
    #[error("Genesis encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Validator balance does not fit voting power.
    #[error(transparent)]
    Validator(#[from] ValidatorUpdateError),
}

/// One genesis validator as it appears in the app state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    /// 0x-prefixed hex of the compressed BLS public key.
    pub pubkey: String,
    pub effective_balance: u64,
}

impl GenesisValidator {
    pub fn new(pubkey: [u8; BLS_PUBKEY_LEN], effective_balance: u64) -> Self {
        Self {
            pubkey: format!("0x{}", hex::encode(pubkey)),
            effective_balance,
        }
    }

    /// Decode into a middleware validator update.
    pub fn to_update(&self) -> Result<ValidatorUpdate, GenesisError> {
        let raw = self.pubkey.strip_prefix("0x").unwrap_or(&self.pubkey);
        let bytes =
            hex::decode(raw).map_err(|_| GenesisError::InvalidPubkey(self.pubkey.clone()))?;
        let key: [u8; BLS_PUBKEY_LEN] = bytes
            .try_into()
            .map_err(|_| GenesisError::InvalidPubkey(self.pubkey.clone()))?;
        Ok(ValidatorUpdate::new(key, self.effective_balance))
    }
}

/// Genesis state of the devnet module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub validators: Vec<GenesisValidator>,
}

/// Deterministic devnet genesis builder.
#[derive(Debug, Clone)]
pub struct DevnetGenesis {
    chain_id: String,
    genesis_module: String,
    initial_height: Height,
    time: DateTime<Utc>,
    params: ConsensusParams,
    validators: Vec<GenesisValidator>,
}

impl DevnetGenesis {
    pub fn new(chain_id: impl Into<String>, genesis_module: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            genesis_module: genesis_module.into(),
            initial_height: 1,
            time: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
            params: ConsensusParams::default(),
            validators: Vec::new(),
        }
    }

    /// Add `count` validators with keys derived from the chain id.
    pub fn with_validators(mut self, count: usize) -> Self {
        self.validators = (0..count)
            .map(|index| {
                GenesisValidator::new(
                    devnet_pubkey(&self.chain_id, index as u64),
                    DEVNET_EFFECTIVE_BALANCE,
                )
            })
            .collect();
        self
    }

    pub fn with_initial_height(mut self, height: Height) -> Self {
        self.initial_height = height;
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn with_params(mut self, params: ConsensusParams) -> Self {
        self.params = params;
        self
    }

    pub fn validators(&self) -> &[GenesisValidator] {
        &self.validators
    }

    /// Validator set InitChain must return for this genesis.
    pub fn expected_validators(
        &self,
        key_type: &str,
    ) -> Result<Vec<AbciValidatorUpdate>, GenesisError> {
        self.validators
            .iter()
            .map(|validator| {
                let update = validator.to_update()?;
                Ok(AbciValidatorUpdate::try_from_update(&update, key_type)?)
            })
            .collect()
    }

    /// Build the InitChain request.
    pub fn build(&self, key_type: &str) -> Result<InitChainRequest, GenesisError> {
        if self.validators.is_empty() {
            return Err(GenesisError::InvalidConfig(
                "at least one validator is required".to_string(),
            ));
        }

        let state = GenesisState {
            validators: self.validators.clone(),
        };
        let mut app_state = serde_json::Map::new();
        app_state.insert(self.genesis_module.clone(), serde_json::to_value(state)?);

        Ok(InitChainRequest {
            time: self.time,
            chain_id: self.chain_id.clone(),
            consensus_params: Some(self.params.clone()),
            validators: self.expected_validators(key_type)?,
            app_state_bytes: serde_json::to_vec(&app_state)?,
            initial_height: self.initial_height,
        })
    }
}

/// 48 bytes of key material: keccak(chain_id ‖ index) followed by the first
/// 16 bytes of its own hash.
fn devnet_pubkey(chain_id: &str, index: u64) -> [u8; BLS_PUBKEY_LEN] {
    let mut hasher = Keccak256::new();
    hasher.update(chain_id.as_bytes());
    hasher.update(index.to_be_bytes());
    let first = hasher.finalize();
    let second = Keccak256::digest(first);

    let mut key = [0u8; BLS_PUBKEY_LEN];
    key[..32].copy_from_slice(&first);
    key[32..].copy_from_slice(&second[..BLS_PUBKEY_LEN - 32]);
    key
}
