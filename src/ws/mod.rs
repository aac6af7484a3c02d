//! WebSocket layer: connection registry, broadcast, heartbeat, read loop.
//!
//! The endpoint at `/ws` streams price, orderbook, trade and system-status
//! envelopes to every connected dashboard. Producers push through
//! [`ConnectionManager::broadcast`].

pub mod channel;
pub mod connection;
pub mod connection_id;
pub mod handler;
mod heartbeat;
pub mod manager;
pub mod messages;

pub use channel::{ClientChannel, FrameSink};
pub use connection_id::ConnectionId;
pub use manager::ConnectionManager;
pub use messages::{Envelope, ServerEvent, TradeSide};
