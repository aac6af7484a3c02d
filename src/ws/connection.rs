//! Read loop of a single WebSocket connection.
//!
//! Registers the write half with the [`ConnectionManager`], then reads client
//! frames until the socket closes: `pong` is ignored, any other text is echoed.
//! Every exit path ends in [`ConnectionManager::disconnect`].

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, Stream, StreamExt};

use super::ConnectionManager;
use super::channel::FrameSink;
use super::connection_id::ConnectionId;
use super::messages::{ClientFrame, ServerEvent};
use crate::error::ChannelError;

/// Runs one upgraded socket to completion.
pub async fn run_connection(
    socket: WebSocket,
    manager: Arc<ConnectionManager>,
    client_id: Option<String>,
) {
    let (ws_tx, ws_rx) = socket.split();
    let sink: FrameSink = Box::pin(ws_tx.sink_map_err(ChannelError::from));
    let id = manager.connect(sink, client_id).await;
    read_loop(ws_rx, &manager, id).await;
    manager.disconnect(id).await;
}

/// Consumes inbound frames for `id` until the stream ends, errors, or the
/// connection is deregistered.
pub(crate) async fn read_loop<S, E>(mut stream: S, manager: &ConnectionManager, id: ConnectionId)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if !handle_text(text.as_str(), manager, id).await {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %id, "client sent close");
                break;
            }
            // Binary frames are not part of the protocol; transport pings are
            // answered by axum.
            Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_)) => {}
            Err(err) => {
                tracing::debug!(connection_id = %id, error = %err, "websocket read failed");
                break;
            }
        }
    }
}

/// Returns `false` once the connection has been dropped by the manager.
async fn handle_text(text: &str, manager: &ConnectionManager, id: ConnectionId) -> bool {
    match ClientFrame::parse(text) {
        ClientFrame::Pong => true,
        ClientFrame::Text(text) => manager.send_personal_message(ServerEvent::echo(text), id).await,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::convert::Infallible;

    use futures_util::stream;
    use serde_json::Value;

    use super::*;
    use crate::config::WsConfig;
    use crate::ws::channel::test_support::memory_sink;

    #[tokio::test]
    async fn pong_is_silent_and_text_is_echoed() {
        let manager = Arc::new(ConnectionManager::new(WsConfig::default()));
        let (sink, mut rx) = memory_sink();
        let id = manager.connect(sink, None).await;
        let Some(Message::Text(_welcome)) = rx.recv().await else {
            panic!("expected welcome");
        };

        let inbound = stream::iter(vec![
            Ok::<_, Infallible>(Message::text("pong")),
            Ok(Message::text("hello")),
            Ok(Message::Close(None)),
            Ok(Message::text("after close")),
        ]);
        read_loop(inbound, &manager, id).await;

        let Some(Message::Text(text)) = rx.recv().await else {
            panic!("expected echo");
        };
        let Ok(echo) = serde_json::from_str::<Value>(text.as_str()) else {
            panic!("echo is not json");
        };
        assert_eq!(echo["type"], "echo");
        assert_eq!(echo["data"]["message"], "server received: hello");
        assert!(rx.try_recv().is_err(), "pong and post-close text get no reply");
        assert!(manager.is_connected(id).await);
    }

    #[tokio::test]
    async fn loop_stops_when_echo_cannot_be_sent() {
        let manager = Arc::new(ConnectionManager::new(WsConfig::default()));
        let (sink, mut rx) = memory_sink();
        let id = manager.connect(sink, None).await;
        assert!(rx.recv().await.is_some());
        drop(rx);

        let inbound = stream::iter(vec![
            Ok::<_, Infallible>(Message::text("one")),
            Ok(Message::text("two")),
        ]);
        read_loop(inbound, &manager, id).await;
        assert!(!manager.is_connected(id).await);
    }
}
