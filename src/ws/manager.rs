//! Registry of live WebSocket connections with broadcast and heartbeat.
//!
//! [`ConnectionManager`] stores every connection in a `RwLock<HashMap<..>>`
//! keyed by [`ConnectionId`]. Each entry owns the connection's
//! [`ClientChannel`], its optional client label and the abort handle of its
//! heartbeat task.
//!
//! # Concurrency
//!
//! - Registration, removal and broadcast snapshots take the registry lock;
//!   no frame is ever written while holding it.
//! - Writes to one channel are serialized by the channel itself, so a client
//!   sees frames in the order they were issued against the manager.
//! - Broadcast writes to all channels concurrently; a slow client only delays
//!   itself and is dropped once its write times out.
//! - A failed write ends in eviction: the channel is dropped without a close
//!   handshake, so an unresponsive peer costs at most one write timeout.
//!   [`ConnectionManager::disconnect`] is the graceful path. Both are
//!   idempotent.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;

use super::channel::{ClientChannel, FrameSink};
use super::connection_id::ConnectionId;
use super::heartbeat;
use super::messages::{Envelope, ServerEvent};
use crate::config::WsConfig;
use crate::error::ChannelError;

/// Per-connection state held by the registry.
#[derive(Debug)]
struct ConnectionEntry {
    channel: Arc<ClientChannel>,
    client_id: Option<String>,
    heartbeat: AbortHandle,
}

/// Why a connection leaves the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    /// Explicit [`ConnectionManager::disconnect`]: close handshake.
    Requested,
    /// A write failed or timed out: drop the sink.
    Failed,
    /// The connection's own heartbeat failed: drop the sink, the task ends
    /// by itself.
    Heartbeat,
}

/// Owner of all live client connections.
///
/// Construct once at startup, wrap in an [`Arc`] and hand clones to every
/// component that needs to push data to browsers.
#[derive(Debug)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
    config: WsConfig,
}

impl ConnectionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(config: WsConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the heartbeat / write-timeout settings.
    #[must_use]
    pub const fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Registers a handshaken channel, starts its heartbeat and sends the
    /// `connection_established` welcome.
    ///
    /// Each call mints a fresh [`ConnectionId`]; the sink is moved in, so the
    /// same channel cannot be registered twice. If the welcome cannot be
    /// delivered the connection is torn down again before this returns.
    pub async fn connect(
        self: &Arc<Self>,
        sink: FrameSink,
        client_id: Option<String>,
    ) -> ConnectionId {
        let id = ConnectionId::new();
        let channel = Arc::new(ClientChannel::new(sink, self.config.write_timeout));

        let count = {
            let mut map = self.connections.write().await;
            // Spawned under the lock so the first tick always finds the entry.
            let heartbeat =
                heartbeat::spawn(Arc::downgrade(self), id, self.config.heartbeat_interval);
            map.insert(
                id,
                ConnectionEntry {
                    channel,
                    client_id: client_id.clone(),
                    heartbeat,
                },
            );
            map.len()
        };

        tracing::info!(
            connection_id = %id,
            client_id = client_id.as_deref().unwrap_or("anonymous"),
            connections = count,
            "websocket connected"
        );

        let welcome = ServerEvent::connection_established(client_id.as_deref(), Utc::now());
        self.send_personal_message(welcome, id).await;
        id
    }

    /// Deregisters a connection: cancels its heartbeat, then closes its
    /// channel.
    ///
    /// Idempotent; returns `false` if `id` was not registered. Once this
    /// returns no further frame, ping included, reaches the channel.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        self.remove(id, Removal::Requested).await
    }

    /// Sends `event` to one connection.
    ///
    /// Returns `true` if the frame was written. Any failure is logged and the
    /// connection is deregistered; there is no retry.
    pub async fn send_personal_message(&self, event: ServerEvent, id: ConnectionId) -> bool {
        let kind = event.kind();
        match self.deliver(id, event).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(connection_id = %id, kind, error = %err, "send failed, disconnecting");
                self.remove(id, Removal::Failed).await;
                false
            }
        }
    }

    /// Sends `event` to every registered connection.
    ///
    /// Returns how many connections received it. Connections whose write
    /// failed are evicted together after the fan-out completes, so the call
    /// takes at most one write timeout. Failures are never reported to the
    /// caller.
    pub async fn broadcast(&self, event: ServerEvent) -> usize {
        let targets: Vec<(ConnectionId, Arc<ClientChannel>)> = {
            let map = self.connections.read().await;
            map.iter()
                .map(|(id, entry)| (*id, Arc::clone(&entry.channel)))
                .collect()
        };

        let kind = event.kind();
        if targets.is_empty() {
            tracing::debug!(kind, "no active connections, skipping broadcast");
            return 0;
        }

        let text = match Envelope::stamp(event).to_text() {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(kind, error = %err, "broadcast envelope could not be encoded");
                return 0;
            }
        };
        tracing::debug!(kind, connections = targets.len(), "broadcasting");

        let results = join_all(targets.iter().map(|(id, channel)| {
            let frame = Message::Text(text.clone());
            async move { (*id, channel.send(frame).await) }
        }))
        .await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(connection_id = %id, kind, error = %err, "broadcast failed, marking for disconnect");
                    failed.push(id);
                }
            }
        }

        join_all(failed.into_iter().map(|id| self.remove(id, Removal::Failed))).await;
        delivered
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Client label recorded for `id`, if it is registered and has one.
    pub async fn client_id(&self, id: ConnectionId) -> Option<String> {
        self.connections
            .read()
            .await
            .get(&id)
            .and_then(|entry| entry.client_id.clone())
    }

    /// Returns `true` while `id` is registered.
    pub async fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Disconnects every registered connection. Used on process shutdown.
    pub async fn shutdown(&self) {
        let ids: Vec<ConnectionId> = self.connections.read().await.keys().copied().collect();
        tracing::info!(connections = ids.len(), "closing all websocket connections");
        join_all(ids.into_iter().map(|id| self.disconnect(id))).await;
    }

    /// Sends one heartbeat ping. Returns `false` when the heartbeat should stop.
    ///
    /// Runs on the heartbeat task itself, so a failure evicts the connection
    /// without aborting that task.
    pub(crate) async fn ping(&self, id: ConnectionId) -> bool {
        match self.deliver(id, ServerEvent::Ping).await {
            Ok(()) => {
                tracing::debug!(connection_id = %id, "heartbeat ping sent");
                true
            }
            Err(ChannelError::Closed) => {
                tracing::debug!(connection_id = %id, "heartbeat found connection closed");
                self.remove(id, Removal::Heartbeat).await;
                false
            }
            Err(err) => {
                tracing::warn!(connection_id = %id, error = %err, "heartbeat ping failed");
                self.remove(id, Removal::Heartbeat).await;
                false
            }
        }
    }

    /// Single teardown path behind [`disconnect`](Self::disconnect) and
    /// eviction.
    ///
    /// The heartbeat is aborted before the channel lock is taken, so a ping
    /// blocked on a slow write is cancelled instead of waited for.
    async fn remove(&self, id: ConnectionId, removal: Removal) -> bool {
        let (entry, remaining) = {
            let mut map = self.connections.write().await;
            let entry = map.remove(&id);
            (entry, map.len())
        };
        let Some(entry) = entry else {
            return false;
        };

        if removal != Removal::Heartbeat {
            entry.heartbeat.abort();
        }
        match removal {
            Removal::Requested => entry.channel.close().await,
            Removal::Failed | Removal::Heartbeat => entry.channel.abandon().await,
        }

        tracing::info!(
            connection_id = %id,
            client_id = entry.client_id.as_deref().unwrap_or("unknown"),
            connections = remaining,
            graceful = removal == Removal::Requested,
            "websocket disconnected"
        );
        true
    }

    /// Stamps and writes `event` to one channel without touching the registry
    /// on failure.
    async fn deliver(&self, id: ConnectionId, event: ServerEvent) -> Result<(), ChannelError> {
        let channel = self
            .connections
            .read()
            .await
            .get(&id)
            .map(|entry| Arc::clone(&entry.channel))
            .ok_or(ChannelError::Closed)?;
        let frame = Envelope::stamp(event).to_message()?;
        channel.send(frame).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use crate::ws::channel::test_support::{gated_sink, memory_sink, stalling_sink};

    fn manager() -> Arc<ConnectionManager> {
        Arc::new(ConnectionManager::new(WsConfig::default()))
    }

    async fn next_json(rx: &mut UnboundedReceiver<Message>) -> Value {
        let Some(Message::Text(text)) = rx.recv().await else {
            panic!("expected a text frame");
        };
        let Ok(value) = serde_json::from_str(text.as_str()) else {
            panic!("frame is not json");
        };
        value
    }

    async fn connect_memory(
        mgr: &Arc<ConnectionManager>,
        client_id: Option<&str>,
    ) -> (ConnectionId, UnboundedReceiver<Message>) {
        let (sink, mut rx) = memory_sink();
        let id = mgr.connect(sink, client_id.map(str::to_string)).await;
        let welcome = next_json(&mut rx).await;
        assert_eq!(welcome["type"], "connection_established");
        (id, rx)
    }

    #[tokio::test]
    async fn connect_and_disconnect_adjust_count() {
        let mgr = manager();
        assert_eq!(mgr.connection_count().await, 0);

        let (id, _rx) = connect_memory(&mgr, Some("127.0.0.1:5000")).await;
        assert_eq!(mgr.connection_count().await, 1);
        assert_eq!(mgr.client_id(id).await.as_deref(), Some("127.0.0.1:5000"));

        assert!(mgr.disconnect(id).await);
        assert_eq!(mgr.connection_count().await, 0);
        assert!(mgr.client_id(id).await.is_none());

        assert!(!mgr.disconnect(id).await);
        assert_eq!(mgr.connection_count().await, 0);
    }

    #[tokio::test]
    async fn welcome_carries_client_id() {
        let mgr = manager();
        let (sink, mut rx) = memory_sink();
        mgr.connect(sink, Some("desk-1".to_string())).await;
        let welcome = next_json(&mut rx).await;
        assert_eq!(welcome["data"]["client_id"], "desk-1");
        assert!(welcome["data"]["server_time"].is_string());
    }

    #[tokio::test]
    async fn failed_welcome_tears_down() {
        let mgr = manager();
        let (sink, rx) = memory_sink();
        drop(rx);
        let id = mgr.connect(sink, None).await;
        assert!(!mgr.is_connected(id).await);
        assert_eq!(mgr.connection_count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let mgr = manager();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (_, rx) = connect_memory(&mgr, None).await;
            receivers.push(rx);
        }

        let delivered = mgr
            .broadcast(ServerEvent::price_update("BTCUSDT", 50000.0, 0.02))
            .await;
        assert_eq!(delivered, 3);

        for rx in &mut receivers {
            let frame = next_json(rx).await;
            assert_eq!(frame["type"], "price_update");
            assert_eq!(
                frame["data"],
                json!({"symbol": "BTCUSDT", "price": 50000.0, "change_24h": 0.02})
            );
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn broadcast_without_connections_is_noop() {
        let mgr = manager();
        assert_eq!(mgr.broadcast(ServerEvent::Ping).await, 0);
    }

    #[tokio::test]
    async fn broadcast_drops_closed_connection_only() {
        let mgr = manager();
        let (_, mut rx_a) = connect_memory(&mgr, None).await;
        let (closed_id, rx_b) = connect_memory(&mgr, None).await;
        let (_, mut rx_c) = connect_memory(&mgr, None).await;
        drop(rx_b);

        let delivered = mgr
            .broadcast(ServerEvent::system_status("auto", 45.0, 100.0))
            .await;
        assert_eq!(delivered, 2);
        assert_eq!(mgr.connection_count().await, 2);
        assert!(!mgr.is_connected(closed_id).await);

        assert_eq!(next_json(&mut rx_a).await["type"], "system_status");
        assert_eq!(next_json(&mut rx_c).await["type"], "system_status");
    }

    #[tokio::test]
    async fn personal_messages_keep_order() {
        let mgr = manager();
        let (id, mut rx) = connect_memory(&mgr, None).await;

        assert!(mgr.send_personal_message(ServerEvent::echo("A"), id).await);
        assert!(mgr.send_personal_message(ServerEvent::echo("B"), id).await);

        assert_eq!(next_json(&mut rx).await["data"]["message"], "server received: A");
        assert_eq!(next_json(&mut rx).await["data"]["message"], "server received: B");
    }

    #[tokio::test]
    async fn personal_send_failure_disconnects() {
        let mgr = manager();
        let (id, rx) = connect_memory(&mgr, None).await;
        drop(rx);
        assert!(!mgr.send_personal_message(ServerEvent::echo("x"), id).await);
        assert!(!mgr.is_connected(id).await);
    }

    #[tokio::test]
    async fn personal_send_to_unknown_connection_is_harmless() {
        let mgr = manager();
        assert!(!mgr.send_personal_message(ServerEvent::Ping, ConnectionId::new()).await);
        assert_eq!(mgr.connection_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_client_does_not_block_others() {
        let mgr = manager();
        let (sink, mut stalled_rx) = stalling_sink(1);
        let stalled_id = mgr.connect(sink, None).await;
        assert_eq!(next_json(&mut stalled_rx).await["type"], "connection_established");
        let (_, mut rx) = connect_memory(&mgr, None).await;

        let delivered = mgr
            .broadcast(ServerEvent::price_update("ETHUSDT", 3000.0, -0.01))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(next_json(&mut rx).await["type"], "price_update");
        assert!(!mgr.is_connected(stalled_id).await);
        assert_eq!(mgr.connection_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_clients_cost_one_write_timeout() {
        let mgr = manager();
        let write_timeout = mgr.config().write_timeout;
        let mut stalled = Vec::new();
        for _ in 0..3 {
            let (sink, mut rx) = stalling_sink(1);
            let id = mgr.connect(sink, None).await;
            assert_eq!(next_json(&mut rx).await["type"], "connection_established");
            stalled.push((id, rx));
        }
        let (_, mut rx) = connect_memory(&mgr, None).await;

        let start = tokio::time::Instant::now();
        let delivered = mgr
            .broadcast(ServerEvent::price_update("BTCUSDT", 50000.0, 0.0))
            .await;
        let elapsed = start.elapsed();

        assert_eq!(delivered, 1);
        assert!(
            elapsed <= write_timeout + Duration::from_millis(100),
            "broadcast took {elapsed:?}"
        );
        assert_eq!(mgr.connection_count().await, 1);
        for (id, mut rx) in stalled {
            assert!(!mgr.is_connected(id).await);
            assert!(rx.recv().await.is_none());
        }
        assert_eq!(next_json(&mut rx).await["type"], "price_update");

        // The next broadcast is not held up by the evicted clients.
        let start = tokio::time::Instant::now();
        assert_eq!(mgr.broadcast(ServerEvent::Ping).await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_blocked_ping() {
        let mgr = Arc::new(ConnectionManager::new(WsConfig {
            heartbeat_interval: Duration::from_secs(1),
            write_timeout: Duration::from_secs(10),
        }));
        let (sink, mut rx, gate) = gated_sink();
        gate.add_permits(1);
        let id = mgr.connect(sink, None).await;
        assert_eq!(next_json(&mut rx).await["type"], "connection_established");

        // The first ping is now waiting on the gate while holding the channel.
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let disconnect = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            async move { mgr.disconnect(id).await }
        });
        tokio::task::yield_now().await;
        gate.add_permits(10);

        let Ok(removed) = disconnect.await else {
            panic!("disconnect task failed");
        };
        assert!(removed);

        // Whatever was written before disconnect returned is buffered; the
        // sink itself must be gone, so nothing can follow.
        loop {
            match rx.try_recv() {
                Ok(_) => {}
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => panic!("sink still alive after disconnect"),
            }
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!mgr.is_connected(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_heartbeat_interval_does_not_kill_heartbeat() {
        let mgr = Arc::new(ConnectionManager::new(WsConfig {
            heartbeat_interval: Duration::ZERO,
            ..WsConfig::default()
        }));
        let (id, mut rx) = connect_memory(&mgr, None).await;

        let ping = tokio::time::timeout(Duration::from_secs(5), next_json(&mut rx)).await;
        let Ok(ping) = ping else {
            panic!("heartbeat never ran");
        };
        assert_eq!(ping["type"], "ping");
        assert!(mgr.is_connected(id).await);
        mgr.disconnect(id).await;
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_pings_idle_connection() {
        let mgr = manager();
        let (id, mut rx) = connect_memory(&mgr, None).await;

        let ping = tokio::time::timeout(Duration::from_secs(31), next_json(&mut rx)).await;
        let Ok(ping) = ping else {
            panic!("no ping within the heartbeat interval");
        };
        assert_eq!(ping["type"], "ping");
        assert!(ping.get("data").is_none());
        assert!(mgr.is_connected(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_stops_heartbeat() {
        let mgr = manager();
        let (id, mut rx) = connect_memory(&mgr, None).await;

        tokio::time::sleep(Duration::from_secs(29)).await;
        mgr.disconnect(id).await;
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(rx.recv().await.is_none(), "no frame may follow disconnect");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ping_deregisters() {
        let mgr = manager();
        let (id, rx) = connect_memory(&mgr, None).await;
        drop(rx);

        tokio::time::sleep(Duration::from_secs(31)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!mgr.is_connected(id).await);
    }

    #[tokio::test]
    async fn shutdown_disconnects_everyone() {
        let mgr = manager();
        let (_, mut rx_a) = connect_memory(&mgr, None).await;
        let (_, mut rx_b) = connect_memory(&mgr, None).await;

        mgr.shutdown().await;
        assert_eq!(mgr.connection_count().await, 0);
        assert!(rx_a.recv().await.is_none());
        assert!(rx_b.recv().await.is_none());
    }
}
