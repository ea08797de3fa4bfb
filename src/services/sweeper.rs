use std::time::Duration;

use tokio::time;

use crate::AppState;

const SWEEP_EVERY: Duration = Duration::from_secs(30);

/// Periodic housekeeping: expired cache entries, finished rate-limit
/// windows, and live-chart pollers nobody listens to any more.
pub fn spawn_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(SWEEP_EVERY);
        // first tick fires immediately; nothing to sweep yet
        interval.tick().await;

        loop {
            interval.tick().await;
            sweep_once(&state);
        }
    })
}

pub fn sweep_once(state: &AppState) {
    let expired = state.live_chart.cache().purge_expired()
        + state.quote_cache.purge_expired()
        + state.search_cache.purge_expired();
    let windows = state.api_limiter.sweep() + state.chat_limiter.sweep();
    let stopped = state.live_hub.prune();

    if expired + windows > 0 || !stopped.is_empty() {
        tracing::debug!(
            "sweep: {expired} cache entries, {windows} rate windows, pollers stopped {:?}",
            stopped
        );
    }
}
