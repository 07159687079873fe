//! Lifecycle configuration

use serde::Deserialize;
use shared_types::BLS12_381_KEY_TYPE;
use std::env;

/// Block Lifecycle configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Chain id InitChain must carry
    pub chain_id: String,
    /// Reported by Info and in query readiness errors
    pub app_name: String,
    /// Blocks to keep locally regardless of evidence age. 0 keeps everything.
    pub min_retain_blocks: u64,
    /// Key of the genesis app-state object handed to the middleware
    pub genesis_module: String,
    /// Drop store versions below the retain height after each commit
    pub prune_state_on_commit: bool,
    /// Key type reported with every validator update
    pub validator_key_type: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            chain_id: "quantum-chain-devnet".to_string(),
            app_name: "quantum-chain".to_string(),
            min_retain_blocks: 0,
            genesis_module: "beacon".to_string(),
            prune_state_on_commit: false,
            validator_key_type: BLS12_381_KEY_TYPE.to_string(),
        }
    }
}

impl LifecycleConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_CHAIN_ID`: Chain id (default: quantum-chain-devnet)
    /// - `QC_APP_NAME`: Application name (default: quantum-chain)
    /// - `QC_MIN_RETAIN_BLOCKS`: Local retention floor (default: 0)
    /// - `QC_GENESIS_MODULE`: Genesis app-state key (default: beacon)
    /// - `QC_PRUNE_STATE`: Prune store versions on commit (default: false)
    /// - `QC_VALIDATOR_KEY_TYPE`: Validator key type (default: bls12_381)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            chain_id: env::var("QC_CHAIN_ID").unwrap_or(defaults.chain_id),

            app_name: env::var("QC_APP_NAME").unwrap_or(defaults.app_name),

            min_retain_blocks: env::var("QC_MIN_RETAIN_BLOCKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_retain_blocks),

            genesis_module: env::var("QC_GENESIS_MODULE").unwrap_or(defaults.genesis_module),

            prune_state_on_commit: env::var("QC_PRUNE_STATE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.prune_state_on_commit),

            validator_key_type: env::var("QC_VALIDATOR_KEY_TYPE")
                .unwrap_or(defaults.validator_key_type),
        }
    }

    /// Config for a given chain id with every other field defaulted.
    pub fn for_chain(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LifecycleConfig::default();
        assert_eq!(config.genesis_module, "beacon");
        assert_eq!(config.min_retain_blocks, 0);
        assert_eq!(config.validator_key_type, "bls12_381");
        assert!(!config.prune_state_on_commit);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: LifecycleConfig =
            serde_json::from_str(r#"{"chain_id":"qc-test","min_retain_blocks":20}"#).unwrap();
        assert_eq!(config.chain_id, "qc-test");
        assert_eq!(config.min_retain_blocks, 20);
        assert_eq!(config.app_name, "quantum-chain");
    }
}
