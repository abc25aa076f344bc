//! Expiry Sweep Task
//!
//! Background task that periodically drops expired entries so that keys
//! nobody reads again still give back their bytes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::Store;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval_secs` between runs and exits once
/// `shutdown` is cancelled. Backends with native expiry report nothing to
/// sweep, so the task is harmless for them.
///
/// # Example
/// ```ignore
/// let shutdown = CancellationToken::new();
/// let handle = spawn_sweep_task(store.clone(), 1, shutdown.clone());
/// // Later, during shutdown:
/// shutdown.cancel();
/// handle.await?;
/// ```
pub fn spawn_sweep_task(
    store: Arc<dyn Store>,
    interval_secs: u64,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep for {} every {} seconds",
            store, interval_secs
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let removed = store.sweep_expired();
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }

        info!("Expiry sweep stopped");
    })
}
