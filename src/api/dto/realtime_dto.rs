//! DTOs for the `/api/ws` admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ws::ServerEvent;
use crate::ws::messages::{OrderbookUpdate, PriceUpdate, SystemStatus, TradeExecuted};

/// Event to fan out to every connected dashboard.
///
/// Same `{"type", "data"}` shape as the outbound envelope, restricted to the
/// market and status events.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BroadcastRequest {
    /// Push a price update.
    PriceUpdate(PriceUpdate),
    /// Push an orderbook snapshot.
    OrderbookUpdate(OrderbookUpdate),
    /// Push a trade fill.
    TradeExecuted(TradeExecuted),
    /// Push a status update.
    SystemStatus(SystemStatus),
}

impl From<BroadcastRequest> for ServerEvent {
    fn from(req: BroadcastRequest) -> Self {
        match req {
            BroadcastRequest::PriceUpdate(p) => Self::PriceUpdate(p),
            BroadcastRequest::OrderbookUpdate(o) => Self::OrderbookUpdate(o),
            BroadcastRequest::TradeExecuted(t) => Self::TradeExecuted(t),
            BroadcastRequest::SystemStatus(s) => Self::SystemStatus(s),
        }
    }
}

/// Result of a broadcast.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastResult {
    /// Event tag that was sent.
    pub kind: String,
    /// Connections that received it.
    pub delivered: usize,
}

/// WebSocket registry status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RealtimeStatus {
    /// Registered connections.
    pub connections: usize,
    /// Seconds between heartbeat pings.
    pub heartbeat_interval_secs: u64,
    /// Write timeout in seconds.
    pub write_timeout_secs: u64,
}
