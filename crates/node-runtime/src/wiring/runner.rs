//! # Block Loop
//!
//! Produces one height per tick until the block limit or shutdown. The
//! shutdown future is pinned once, so a signal that arrives while a block is
//! being produced is seen on the next turn of the loop.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use qc_04_state_management::VersionedStore;
use qc_18_block_lifecycle::{Middleware, ParamStore, QueryService};
use tracing::{debug, info};

use super::driver::HeightDriver;

/// Drive heights until `max_blocks` is reached or `shutdown` completes.
/// Returns the number of blocks produced.
pub async fn run_until_shutdown<S, M, P, F>(
    driver: &mut HeightDriver<S, M, P>,
    queries: &QueryService<S>,
    block_time: Duration,
    max_blocks: Option<u64>,
    shutdown: F,
) -> Result<u64>
where
    S: VersionedStore,
    M: Middleware,
    P: ParamStore,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(block_time);
    tokio::pin!(shutdown);
    let mut produced = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                driver.produce_block(Utc::now())?;
                produced += 1;

                if let Ok(ctx) = queries.create_query_context(0, false) {
                    debug!(height = ctx.height(), entries = ctx.view().len(), "Latest committed state");
                }
                if max_blocks.is_some_and(|max| produced >= max) {
                    info!(produced, "Reached block limit");
                    break;
                }
            }
            () = &mut shutdown => {
                info!(produced, "Shutdown signal received");
                break;
            }
        }
    }

    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DevnetMiddleware;
    use crate::genesis::DevnetGenesis;
    use qc_04_state_management::InMemoryVersionedStore;
    use qc_18_block_lifecycle::{
        BlockLifecycle, LifecycleConfig, LifecycleDependencies, SharedParamStore,
    };
    use shared_types::BLS12_381_KEY_TYPE;
    use std::sync::Arc;

    type DevnetDriver = HeightDriver<InMemoryVersionedStore, DevnetMiddleware, SharedParamStore>;

    fn started() -> (DevnetDriver, QueryService<InMemoryVersionedStore>) {
        let lifecycle = BlockLifecycle::new(
            LifecycleConfig::for_chain("qc-devnet"),
            LifecycleDependencies {
                store: Arc::new(InMemoryVersionedStore::new()),
                middleware: Arc::new(DevnetMiddleware::new()),
                params: Arc::new(SharedParamStore::default()),
            },
        );
        let queries = lifecycle.query_service();
        let mut driver = HeightDriver::new(lifecycle, vec![3; 20]);
        let genesis = DevnetGenesis::new("qc-devnet", "beacon")
            .with_validators(1)
            .build(BLS12_381_KEY_TYPE)
            .unwrap();
        driver.init_chain(&genesis).unwrap();
        (driver, queries)
    }

    #[tokio::test]
    async fn test_stops_at_block_limit() {
        let (mut driver, queries) = started();
        let produced = run_until_shutdown(
            &mut driver,
            &queries,
            Duration::from_millis(1),
            Some(3),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(produced, 3);
        assert_eq!(driver.next_height(), 4);
    }

    #[tokio::test]
    async fn test_pending_shutdown_is_observed() {
        let (mut driver, queries) = started();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tx.send(()).unwrap();

        // The next tick is an hour away; only the shutdown can end the loop.
        let produced = run_until_shutdown(
            &mut driver,
            &queries,
            Duration::from_secs(3600),
            None,
            async move {
                let _ = rx.await;
            },
        )
        .await
        .unwrap();

        assert!(produced <= 1);
        assert_eq!(driver.next_height(), produced + 1);
    }
}
