//! Periodic sweep of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use docfetch_core::CacheStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawn a task that calls [`CacheStore::clear_expired`] every `interval`.
///
/// The first sweep runs one full interval after start.
pub fn spawn_cleanup(cache: Arc<CacheStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = cache.clear_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = cache.len(), "swept expired cache entries");
            }
        }
    })
}
