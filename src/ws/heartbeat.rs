//! Per-connection heartbeat task.
//!
//! One task per registered connection. It sleeps a full interval, then asks
//! the manager to write a `ping` envelope. It stops when the ping fails, when
//! the connection is no longer registered or when the manager is dropped.
//! [`super::ConnectionManager::disconnect`] aborts it through the stored
//! [`AbortHandle`].

use std::sync::Weak;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::ConnectionManager;
use super::connection_id::ConnectionId;

/// Shortest accepted period; `interval_at` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns the heartbeat for `id`; the first ping is due after `interval`,
/// raised to one second if shorter.
pub(crate) fn spawn(
    manager: Weak<ConnectionManager>,
    id: ConnectionId,
    interval: Duration,
) -> AbortHandle {
    tokio::spawn(run(manager, id, interval)).abort_handle()
}

async fn run(manager: Weak<ConnectionManager>, id: ConnectionId, interval: Duration) {
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(manager) = manager.upgrade() else {
            break;
        };
        if !manager.ping(id).await {
            break;
        }
    }

    tracing::debug!(connection_id = %id, "heartbeat stopped");
}
