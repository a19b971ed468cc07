//! Sweep Task
//!
//! Background task that periodically purges expired cache entries.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Handle to the periodic sweep task of one store.
///
/// The task holds only a weak reference to the store and ends on its own
/// once the store is dropped. `stop` ends it deterministically; dropping the
/// handle cancels and aborts it.
#[derive(Debug)]
pub struct Sweeper {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Starts sweeping with the store's configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: &Arc<CacheStore>) -> Self {
        Self::spawn(store, store.sweep_interval())
    }

    /// Starts sweeping every `interval`.
    ///
    /// # Example
    /// ```ignore
    /// let store = Arc::new(CacheStore::new(StoreConfig::default())?);
    /// let sweeper = Sweeper::spawn(&store, Duration::from_secs(1));
    /// // Later, during shutdown:
    /// sweeper.stop().await;
    /// ```
    pub fn spawn(store: &Arc<CacheStore>, interval: Duration) -> Self {
        // tokio intervals reject a zero period
        let interval = interval.max(Duration::from_millis(1));
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::downgrade(store), interval, token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    // == Stop ==
    /// Cancels the task and waits for it to exit.
    ///
    /// A sweep pass in progress completes before the task exits.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Sweep task stopped");
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run(store: Weak<CacheStore>, period: Duration, token: CancellationToken) {
    info!(interval_ms = period.as_millis() as u64, "Starting sweep task");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so the first pass runs
    // one full period after start.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(cache) = store.upgrade() else {
            debug!("Cache store dropped, ending sweep task");
            break;
        };
        let outcome = cache.sweep();
        drop(cache);

        if outcome.expired > 0 {
            info!(
                expired = outcome.expired,
                scanned = outcome.scanned,
                faults = outcome.faults,
                "Sweep removed expired entries"
            );
        } else {
            debug!(scanned = outcome.scanned, "Sweep found no expired entries");
        }
    }
}
