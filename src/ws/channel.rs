//! Write half of one client connection.
//!
//! [`ClientChannel`] owns the outbound [`FrameSink`] behind a FIFO
//! [`tokio::sync::Mutex`], so concurrent senders (broadcast, personal sends,
//! heartbeat) are serialized per channel and observed by the client in the
//! order they acquired the lock. Every write is bounded by a timeout.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use tokio::sync::Mutex;

use crate::error::ChannelError;

/// Boxed outbound frame sink.
///
/// For real connections this is the write half of an axum [`WebSocket`]
/// with its error mapped into [`ChannelError`]; tests plug in an in-memory
/// sink.
///
/// [`WebSocket`]: axum::extract::ws::WebSocket
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = ChannelError> + Send>>;

/// Task-safe, write-serialized handle to one client.
pub struct ClientChannel {
    sink: Mutex<Option<FrameSink>>,
    write_timeout: Duration,
}

impl ClientChannel {
    /// Wraps `sink`, bounding every write by `write_timeout`.
    #[must_use]
    pub fn new(sink: FrameSink, write_timeout: Duration) -> Self {
        Self {
            sink: Mutex::new(Some(sink)),
            write_timeout,
        }
    }

    /// Writes one frame.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Closed`] if the channel was already closed.
    /// - [`ChannelError::Timeout`] if the write exceeded the write timeout.
    /// - Any error reported by the underlying sink.
    pub async fn send(&self, frame: Message) -> Result<(), ChannelError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ChannelError::Closed)?;
        match tokio::time::timeout(self.write_timeout, sink.send(frame)).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Timeout(self.write_timeout)),
        }
    }

    /// Closes the sink and drops it. Later sends fail with
    /// [`ChannelError::Closed`].
    ///
    /// Waits for an in-flight write to finish first. The close handshake is
    /// best-effort and bounded by the write timeout.
    pub async fn close(&self) {
        let taken = self.sink.lock().await.take();
        if let Some(mut sink) = taken
            && let Ok(Err(err)) = tokio::time::timeout(self.write_timeout, sink.close()).await
        {
            tracing::debug!(error = %err, "close frame not delivered");
        }
    }

    /// Drops the sink without a close handshake. Later sends fail with
    /// [`ChannelError::Closed`].
    ///
    /// Used once a write has already failed or timed out, where a close frame
    /// would only wait out another timeout.
    pub async fn abandon(&self) {
        drop(self.sink.lock().await.take());
    }

    /// Returns `true` once [`close`](Self::close) or
    /// [`abandon`](Self::abandon) has run.
    pub async fn is_closed(&self) -> bool {
        self.sink.lock().await.is_none()
    }
}

impl fmt::Debug for ClientChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientChannel")
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}
