//! # Devnet Node Tests
//!
//! Drives the devnet wiring end to end: genesis, block production, pruning
//! and restart over a shared in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use node_runtime::adapters::{DevnetBlock, DevnetMiddleware};
use node_runtime::genesis::DevnetGenesis;
use node_runtime::HeightDriver;
use qc_04_state_management::InMemoryVersionedStore;
use qc_18_block_lifecycle::{
    BlockLifecycle, BlockLifecycleApi, LifecycleConfig, LifecycleDependencies, LifecycleError,
    LifecycleStatus, SharedParamStore,
};
use shared_types::{ConsensusParams, BLS12_381_KEY_TYPE};

const CHAIN_ID: &str = "qc-devnet-test";

type DevnetDriver = HeightDriver<InMemoryVersionedStore, DevnetMiddleware, SharedParamStore>;

fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn driver(config: LifecycleConfig, store: Arc<InMemoryVersionedStore>) -> DevnetDriver {
    let lifecycle = BlockLifecycle::new(
        config,
        LifecycleDependencies {
            store,
            middleware: Arc::new(DevnetMiddleware::new()),
            params: Arc::new(SharedParamStore::default()),
        },
    );
    HeightDriver::new(lifecycle, vec![9; 20])
}

fn block_key(slot: u64) -> Vec<u8> {
    format!("blocks/{slot:020}").into_bytes()
}

#[test]
fn test_blocks_are_chained_by_parent_hash() {
    let store = Arc::new(InMemoryVersionedStore::new());
    let mut driver = driver(LifecycleConfig::for_chain(CHAIN_ID), store);
    let genesis = DevnetGenesis::new(CHAIN_ID, "beacon")
        .with_validators(2)
        .build(BLS12_381_KEY_TYPE)
        .unwrap();
    driver.init_chain(&genesis).unwrap();

    for i in 1..=4 {
        driver
            .produce_block(start_time() + Duration::seconds(i))
            .unwrap();
    }

    let ctx = driver.lifecycle().create_query_context(4, true).unwrap();
    let parent = ctx.get(&block_key(3)).unwrap();
    let head = DevnetBlock::decode(ctx.get(&block_key(4)).unwrap()).unwrap();
    assert_eq!(head.slot, 4);
    assert_eq!(head.parent_hash, hex::encode(DevnetBlock::hash(parent)));
    assert_eq!(
        ctx.get(b"chain/head_hash").unwrap().as_slice(),
        DevnetBlock::hash(ctx.get(&block_key(4)).unwrap()).as_slice()
    );
}

#[test]
fn test_pruning_node_drops_old_versions() {
    let store = Arc::new(InMemoryVersionedStore::new());
    let config = LifecycleConfig {
        min_retain_blocks: 3,
        prune_state_on_commit: true,
        ..LifecycleConfig::for_chain(CHAIN_ID)
    };
    let mut driver = driver(config, Arc::clone(&store));

    let mut params = ConsensusParams::default();
    params.evidence.max_age_num_blocks = 2;
    let genesis = DevnetGenesis::new(CHAIN_ID, "beacon")
        .with_validators(1)
        .with_params(params)
        .build(BLS12_381_KEY_TYPE)
        .unwrap();
    driver.init_chain(&genesis).unwrap();

    let mut last = None;
    for i in 1..=8 {
        last = Some(
            driver
                .produce_block(start_time() + Duration::seconds(i))
                .unwrap(),
        );
    }

    // commit 8: evidence floor 6, local floor 5
    let summary = last.unwrap();
    assert_eq!(summary.retain_height, 5);
    assert_eq!(store.earliest_version(), Some(5));

    assert!(driver.lifecycle().create_query_context(5, false).is_ok());
    assert!(matches!(
        driver.lifecycle().create_query_context(4, false),
        Err(LifecycleError::VersionNotFound { height: 4, .. })
    ));
}

#[test]
fn test_restarted_node_resumes_after_last_commit() {
    let store = Arc::new(InMemoryVersionedStore::new());
    let mut first = driver(LifecycleConfig::for_chain(CHAIN_ID), Arc::clone(&store));
    let genesis = DevnetGenesis::new(CHAIN_ID, "beacon")
        .with_validators(1)
        .build(BLS12_381_KEY_TYPE)
        .unwrap();
    first.init_chain(&genesis).unwrap();
    for i in 1..=3 {
        first
            .produce_block(start_time() + Duration::seconds(i))
            .unwrap();
    }
    drop(first);

    let mut restarted = driver(LifecycleConfig::for_chain(CHAIN_ID), Arc::clone(&store));
    assert_eq!(restarted.lifecycle().status(), LifecycleStatus::Running);
    assert_eq!(restarted.next_height(), 4);

    let summary = restarted
        .produce_block(start_time() + Duration::seconds(4))
        .unwrap();
    assert_eq!(summary.height, 4);
    assert_eq!(summary.rounds, 1);
    assert_eq!(restarted.lifecycle().info().last_block_height, 4);
}
