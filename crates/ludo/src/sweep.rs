//! Periodic removal of finished, abandoned, and idle sessions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ludo_protocol::Codec;
use ludo_session::SessionRegistry;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::server::ServerState;

/// Shortest period accepted; `tokio::time::interval` panics on zero.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns the sweeper. The first pass runs one full `period` after start.
pub(crate) fn spawn_sweeper<C: Codec>(state: Arc<ServerState<C>>, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately once
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let swept = SessionRegistry::sweep(&state.registry, Instant::now()).await;
            if !swept.is_empty() {
                let remaining = state.registry.lock().await.session_count();
                tracing::info!(removed = swept.len(), remaining, "session sweep finished");
            }
        }
    })
}
