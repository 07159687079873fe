//! # Quantum-Chain Devnet Node
//!
//! Runs the block lifecycle on a single node: builds a deterministic genesis,
//! then drives one height per block interval until Ctrl+C or `QC_MAX_BLOCKS`.
//!
//! ## Startup
//!
//! 1. Load `NodeConfig` from the environment and install logging
//! 2. Wire the lifecycle to the in-memory store and devnet middleware
//! 3. InitChain with the devnet genesis
//! 4. Prepare, Process, Finalize and Commit every tick

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use node_runtime::adapters::DevnetMiddleware;
use node_runtime::genesis::DevnetGenesis;
use node_runtime::logging::init_tracing;
use node_runtime::{run_until_shutdown, HeightDriver, NodeConfig};
use qc_04_state_management::InMemoryVersionedStore;
use qc_18_block_lifecycle::{
    BlockLifecycle, BlockLifecycleApi, LifecycleDependencies, SharedParamStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env();
    init_tracing(&config)?;
    config.validate().context("invalid node configuration")?;

    info!(
        chain_id = %config.lifecycle.chain_id,
        block_time_ms = config.block_time_ms,
        min_retain_blocks = config.lifecycle.min_retain_blocks,
        "Starting Quantum-Chain devnet node"
    );

    let lifecycle = BlockLifecycle::new(
        config.lifecycle.clone(),
        LifecycleDependencies {
            store: Arc::new(InMemoryVersionedStore::new()),
            middleware: Arc::new(DevnetMiddleware::new()),
            params: Arc::new(SharedParamStore::default()),
        },
    );
    let queries = lifecycle.query_service();
    let mut driver = HeightDriver::new(lifecycle, b"qc-devnet-proposer".to_vec());

    let genesis = DevnetGenesis::new(&config.lifecycle.chain_id, &config.lifecycle.genesis_module)
        .with_validators(config.validator_count)
        .with_initial_height(config.initial_height)
        .with_time(Utc::now())
        .build(&config.lifecycle.validator_key_type)
        .context("failed to build devnet genesis")?;
    let init = driver.init_chain(&genesis)?;
    info!(
        validators = init.validators.len(),
        initial_height = driver.next_height(),
        "Chain initialized"
    );

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "Cannot listen for Ctrl+C; running until the block limit");
            std::future::pending::<()>().await;
        }
    };
    let produced = run_until_shutdown(
        &mut driver,
        &queries,
        Duration::from_millis(config.block_time_ms),
        config.max_blocks,
        shutdown,
    )
    .await?;

    let info = driver.lifecycle().info();
    info!(
        produced,
        height = info.last_block_height,
        app_hash = %hex::encode(info.last_block_app_hash),
        "Node stopped"
    );
    Ok(())
}
