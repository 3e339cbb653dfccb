//! Periodic removal of expired cache entries.
//!
//! Lookups never depend on this task; it only bounds memory held by
//! entries nobody asks for again.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::cache::store::ResponseCache;
use crate::observability::metrics;

pub struct CacheSweeper<V> {
    cache: Arc<ResponseCache<V>>,
    interval: Duration,
}

impl<V: Clone + Send + Sync + 'static> CacheSweeper<V> {
    pub fn new(cache: Arc<ResponseCache<V>>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Cache sweeper starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be expired yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn sweep(&self) {
        let evicted = self.cache.purge_expired();
        let remaining = self.cache.len();
        metrics::record_cache_sweep(evicted, remaining);
        tracing::debug!(evicted, remaining, "Cache sweep complete");
    }
}
