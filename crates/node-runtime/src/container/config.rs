//! # Node Configuration
//!
//! Runtime parameters for the devnet node. Lifecycle settings are loaded by
//! `LifecycleConfig::from_env` and embedded unchanged.

use qc_18_block_lifecycle::LifecycleConfig;
use std::env;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Block lifecycle configuration.
    pub lifecycle: LifecycleConfig,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable output.
    pub json_logs: bool,
    /// Interval between heights.
    pub block_time_ms: u64,
    /// Stop after this many blocks. `None` runs until interrupted.
    pub max_blocks: Option<u64>,
    /// First block height of the chain.
    pub initial_height: u64,
    /// Number of devnet validators created at genesis.
    pub validator_count: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleConfig::default(),
            log_level: "info".to_string(),
            json_logs: false,
            block_time_ms: 2_000,
            max_blocks: None,
            initial_height: 1,
            validator_count: 4,
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_LOG_LEVEL`: Log filter (default: info)
    /// - `QC_JSON_LOGS`: JSON log output (default: false)
    /// - `QC_BLOCK_TIME_MS`: Block interval in milliseconds (default: 2000)
    /// - `QC_MAX_BLOCKS`: Stop after this many blocks (default: unlimited)
    /// - `QC_INITIAL_HEIGHT`: First block height (default: 1)
    /// - `QC_VALIDATOR_COUNT`: Devnet validators (default: 4)
    ///
    /// See `LifecycleConfig::from_env` for the lifecycle variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            lifecycle: LifecycleConfig::from_env(),

            log_level: env::var("QC_LOG_LEVEL").unwrap_or(defaults.log_level),

            json_logs: env::var("QC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),

            block_time_ms: env::var("QC_BLOCK_TIME_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.block_time_ms),

            max_blocks: env::var("QC_MAX_BLOCKS")
                .ok()
                .and_then(|v| v.parse().ok()),

            initial_height: env::var("QC_INITIAL_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_height),

            validator_count: env::var("QC_VALIDATOR_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.validator_count),
        }
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lifecycle.chain_id.is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        if self.block_time_ms == 0 {
            return Err(ConfigError::ZeroBlockTime);
        }
        if self.validator_count == 0 {
            return Err(ConfigError::NoValidators);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("QC_CHAIN_ID must not be empty")]
    EmptyChainId,

    #[error("QC_BLOCK_TIME_MS must be greater than zero")]
    ZeroBlockTime,

    #[error("QC_VALIDATOR_COUNT must be greater than zero")]
    NoValidators,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_height, 1);
        assert!(config.max_blocks.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_block_time() {
        let config = NodeConfig {
            block_time_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBlockTime));
    }

    #[test]
    fn test_validate_rejects_empty_chain_id() {
        let config = NodeConfig {
            lifecycle: LifecycleConfig::for_chain(""),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyChainId));
    }
}
