//! DTOs for the `/api/trades` endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::ws::TradeSide;

/// Query parameters of `GET /api/trades/history`.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// First day (`YYYY-MM-DD`), defaults to seven days ago.
    pub start_date: Option<String>,
    /// Last day (`YYYY-MM-DD`), defaults to today.
    pub end_date: Option<String>,
    /// Maximum records, 1..=1000. Defaults to 100.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Records to skip. Defaults to 0.
    #[serde(default)]
    pub offset: u32,
}

/// Query parameters of `GET /api/trades/market`.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct MarketQuery {
    /// Trading pair symbol. Defaults to `BTCUSDT`.
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

pub(crate) const fn default_limit() -> u32 {
    100
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

/// Daily trading statistics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradingStats {
    /// Day the statistics cover.
    pub date: String,
    /// Traded volume in quote currency.
    pub volume: f64,
    /// Number of trades.
    pub count: u32,
    /// Fees paid.
    pub cost: f64,
    /// Realized profit.
    pub profit: f64,
    /// Percentage of profitable trades.
    pub success_rate: f64,
}

/// One historical trade.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradeRecord {
    /// Sequential record id.
    pub id: u32,
    /// Trading pair.
    pub symbol: String,
    /// Direction.
    pub side: TradeSide,
    /// Fill price.
    pub price: f64,
    /// Filled quantity.
    pub quantity: f64,
    /// Fill time.
    pub timestamp: String,
}

/// Trade history page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradeHistory {
    /// Trades, newest first.
    pub trades: Vec<TradeRecord>,
    /// Number of trades returned.
    pub total: usize,
    /// Effective first day.
    pub start_date: String,
    /// Effective last day.
    pub end_date: String,
    /// Requested limit.
    pub limit: u32,
    /// Requested offset.
    pub offset: u32,
}

/// Strategy runtime status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradingStatus {
    /// Operating mode.
    pub mode: String,
    /// Seconds since the strategy started.
    pub uptime: u64,
    /// Time of the last strategy action.
    pub last_operation: String,
    /// Whether the strategy is placing orders.
    pub is_trading: bool,
    /// Coarse health indicator.
    pub health: String,
}

/// Top-of-book market snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarketSnapshot {
    /// Trading pair.
    pub symbol: String,
    /// Best bid.
    pub bid_price: f64,
    /// Best ask.
    pub ask_price: f64,
    /// Ask minus bid.
    pub spread: f64,
    /// Average true range.
    pub atr: f64,
    /// Snapshot time.
    pub timestamp: String,
}

/// Account funds breakdown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FundsOverview {
    /// Free balance.
    pub available: f64,
    /// Value held in open positions.
    pub position: f64,
    /// Value reserved by grid orders.
    pub grid: f64,
    /// Total account value.
    pub total: f64,
    /// Quote currency.
    pub currency: String,
    /// Snapshot time.
    pub timestamp: String,
}

/// Daily points progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointsData {
    /// Day the points cover.
    pub date: String,
    /// Points earned so far.
    pub current: u32,
    /// Daily target.
    pub target: u32,
    /// `current / target` in percent.
    pub percentage: f64,
    /// Points earned from balance.
    pub balance_points: u32,
    /// Points earned from volume.
    pub volume_points: u32,
}
