//! WebSocket message types: outbound events, the wire envelope, inbound frames.
//!
//! Every outbound frame is an [`Envelope`]:
//!
//! ```json
//! { "type": "price_update", "data": { ... }, "timestamp": "2024-01-01T00:00:00.000000Z" }
//! ```
//!
//! The `type`/`data` pair comes from the adjacently tagged [`ServerEvent`];
//! `timestamp` is stamped when the envelope is built for sending.

use axum::extract::ws::{Message, Utf8Bytes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::clock;
use crate::error::ChannelError;

/// Literal text a client sends to acknowledge a heartbeat ping.
pub const PONG_TEXT: &str = "pong";

/// Prefix of the `echo` reply to unrecognized client text.
pub const ECHO_PREFIX: &str = "server received: ";

/// Closed set of server → client events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Welcome message sent once after registration.
    ConnectionEstablished(ConnectionEstablished),
    /// Heartbeat. Carries no `data`.
    Ping,
    /// Reply to free-form client text.
    Echo(Echo),
    /// Last traded price of a symbol.
    PriceUpdate(PriceUpdate),
    /// Top-of-book snapshot.
    OrderbookUpdate(OrderbookUpdate),
    /// A fill of one of our orders.
    TradeExecuted(TradeExecuted),
    /// Strategy runtime status.
    SystemStatus(SystemStatus),
}

/// Payload of [`ServerEvent::ConnectionEstablished`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionEstablished {
    /// Client-supplied identifier, or `"anonymous"`.
    pub client_id: String,
    /// Server clock at registration time.
    pub server_time: String,
}

/// Payload of [`ServerEvent::Echo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Echo {
    /// Text echoed back to the client.
    pub message: String,
}

/// Payload of [`ServerEvent::PriceUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceUpdate {
    /// Trading pair, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Last price.
    pub price: f64,
    /// Relative change over 24 hours.
    pub change_24h: f64,
}

/// Payload of [`ServerEvent::OrderbookUpdate`]. Levels are `[price, quantity]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderbookUpdate {
    /// Bid levels, best first.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub bids: Vec<[f64; 2]>,
    /// Ask levels, best first.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub asks: Vec<[f64; 2]>,
}

/// Side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Bought the base asset.
    Buy,
    /// Sold the base asset.
    Sell,
}

/// Payload of [`ServerEvent::TradeExecuted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TradeExecuted {
    /// Trade direction.
    pub side: TradeSide,
    /// Fill price.
    pub price: f64,
    /// Filled quantity.
    pub quantity: f64,
    /// Fee paid.
    pub cost: f64,
}

/// Payload of [`ServerEvent::SystemStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SystemStatus {
    /// Operating mode, e.g. `auto` or `manual`.
    pub mode: String,
    /// Points earned today.
    pub points_today: f64,
    /// Volume traded today.
    pub volume_today: f64,
}

impl ServerEvent {
    /// Builds a `price_update` event.
    #[must_use]
    pub fn price_update(symbol: impl Into<String>, price: f64, change_24h: f64) -> Self {
        Self::PriceUpdate(PriceUpdate {
            symbol: symbol.into(),
            price,
            change_24h,
        })
    }

    /// Builds an `orderbook_update` event.
    #[must_use]
    pub fn orderbook_update(bids: Vec<[f64; 2]>, asks: Vec<[f64; 2]>) -> Self {
        Self::OrderbookUpdate(OrderbookUpdate { bids, asks })
    }

    /// Builds a `trade_executed` event.
    #[must_use]
    pub fn trade_executed(side: TradeSide, price: f64, quantity: f64, cost: f64) -> Self {
        Self::TradeExecuted(TradeExecuted {
            side,
            price,
            quantity,
            cost,
        })
    }

    /// Builds a `system_status` event.
    #[must_use]
    pub fn system_status(mode: impl Into<String>, points_today: f64, volume_today: f64) -> Self {
        Self::SystemStatus(SystemStatus {
            mode: mode.into(),
            points_today,
            volume_today,
        })
    }

    /// Builds the welcome event; a missing client id is reported as `anonymous`.
    #[must_use]
    pub fn connection_established(client_id: Option<&str>, server_time: DateTime<Utc>) -> Self {
        Self::ConnectionEstablished(ConnectionEstablished {
            client_id: client_id.unwrap_or("anonymous").to_string(),
            server_time: clock::format_iso(server_time),
        })
    }

    /// Builds the echo reply for `text`.
    #[must_use]
    pub fn echo(text: &str) -> Self {
        Self::Echo(Echo {
            message: format!("{ECHO_PREFIX}{text}"),
        })
    }

    /// Wire tag of this event.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished(_) => "connection_established",
            Self::Ping => "ping",
            Self::Echo(_) => "echo",
            Self::PriceUpdate(_) => "price_update",
            Self::OrderbookUpdate(_) => "orderbook_update",
            Self::TradeExecuted(_) => "trade_executed",
            Self::SystemStatus(_) => "system_status",
        }
    }
}

/// A [`ServerEvent`] stamped with its send time.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// The event, flattened into `type` and `data`.
    #[serde(flatten)]
    pub event: ServerEvent,
    /// ISO-8601 UTC send time.
    pub timestamp: String,
}

impl Envelope {
    /// Stamps `event` with the current time.
    #[must_use]
    pub fn stamp(event: ServerEvent) -> Self {
        Self {
            event,
            timestamp: clock::now_iso(),
        }
    }

    /// Encodes the envelope as a JSON text frame. Non-ASCII is kept literal.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Encode`] if JSON encoding fails.
    pub fn to_text(&self) -> Result<Utf8Bytes, ChannelError> {
        Ok(serde_json::to_string(self)?.into())
    }

    /// Encodes the envelope as a WebSocket text [`Message`].
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Encode`] if JSON encoding fails.
    pub fn to_message(&self) -> Result<Message, ChannelError> {
        self.to_text().map(Message::Text)
    }
}

/// Classified inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame<'a> {
    /// Heartbeat acknowledgment; ignored.
    Pong,
    /// Anything else; answered with an echo.
    Text(&'a str),
}

impl<'a> ClientFrame<'a> {
    /// Classifies raw client text.
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        if text == PONG_TEXT {
            Self::Pong
        } else {
            Self::Text(text)
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn encode(event: ServerEvent) -> Value {
        let Ok(text) = Envelope::stamp(event).to_text() else {
            panic!("encoding failed");
        };
        let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
            panic!("not json");
        };
        value
    }

    #[test]
    fn price_update_wire_shape() {
        let value = encode(ServerEvent::price_update("BTCUSDT", 50000.0, 0.02));
        assert_eq!(value["type"], "price_update");
        assert_eq!(
            value["data"],
            json!({"symbol": "BTCUSDT", "price": 50000.0, "change_24h": 0.02})
        );
        assert!(value["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
    }

    #[test]
    fn ping_has_no_data() {
        let value = encode(ServerEvent::Ping);
        assert_eq!(value["type"], "ping");
        assert!(value.get("data").is_none());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn orderbook_levels_are_pairs() {
        let value = encode(ServerEvent::orderbook_update(
            vec![[100.5, 2.0]],
            vec![[101.0, 1.5], [101.5, 3.0]],
        ));
        assert_eq!(value["data"]["bids"], json!([[100.5, 2.0]]));
        assert_eq!(value["data"]["asks"], json!([[101.0, 1.5], [101.5, 3.0]]));
    }

    #[test]
    fn trade_side_is_lowercase() {
        let value = encode(ServerEvent::trade_executed(TradeSide::Sell, 1.0, 2.0, 0.01));
        assert_eq!(value["data"]["side"], "sell");
        assert_eq!(value["data"]["cost"], 0.01);
    }

    #[test]
    fn system_status_fields() {
        let value = encode(ServerEvent::system_status("auto", 45.0, 15234.56));
        assert_eq!(
            value["data"],
            json!({"mode": "auto", "points_today": 45.0, "volume_today": 15234.56})
        );
    }

    #[test]
    fn welcome_defaults_to_anonymous() {
        let value = encode(ServerEvent::connection_established(None, Utc::now()));
        assert_eq!(value["type"], "connection_established");
        assert_eq!(value["data"]["client_id"], "anonymous");
        assert!(
            value["data"]["server_time"]
                .as_str()
                .is_some_and(|t| t.ends_with('Z'))
        );
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let Ok(text) = Envelope::stamp(ServerEvent::echo("价格")).to_text() else {
            panic!("encoding failed");
        };
        assert!(text.as_str().contains("价格"));
        assert!(!text.as_str().contains("\\u"));
    }

    #[test]
    fn helpers_are_pure() {
        let a = ServerEvent::price_update("X", 1.0, 0.1);
        let b = ServerEvent::price_update("X", 1.0, 0.1);
        assert_eq!(a, b);
        assert_eq!(a.kind(), "price_update");
    }

    #[test]
    fn kind_matches_serialized_tag() {
        for event in [
            ServerEvent::Ping,
            ServerEvent::echo("x"),
            ServerEvent::system_status("manual", 0.0, 0.0),
        ] {
            let kind = event.kind();
            assert_eq!(encode(event)["type"], kind);
        }
    }

    #[test]
    fn client_frame_classification() {
        assert_eq!(ClientFrame::parse("pong"), ClientFrame::Pong);
        assert_eq!(ClientFrame::parse("hello"), ClientFrame::Text("hello"));
        assert_eq!(ClientFrame::parse("PONG"), ClientFrame::Text("PONG"));
    }
}
