//! Trading statistics endpoints.
//!
//! There is no trading engine behind these yet: every handler validates its
//! parameters and answers with fixed sample figures so the dashboard can be
//! developed against a stable shape.

use axum::extract::Query;
use axum::response::IntoResponse;
use axum::Router;
use axum::routing::get;
use chrono::{Days, Duration, Utc};

use super::resolve_date;
use crate::api::dto::{
    ApiResponse, DateQuery, FundsOverview, HistoryQuery, MarketQuery, MarketSnapshot, PointsData,
    TradeHistory, TradeRecord, TradingStats, TradingStatus,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::clock;
use crate::error::ApiError;
use crate::ws::TradeSide;

/// Sample history never returns more rows than this.
const SAMPLE_HISTORY_ROWS: u32 = 10;

/// `GET /trades/stats`: Daily trading statistics.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if `date` is not `YYYY-MM-DD`.
#[utoipa::path(
    get,
    path = "/api/trades/stats",
    tag = "Trades",
    summary = "Daily trading statistics",
    params(DateQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Statistics", body = ApiResponse<TradingStats>),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_trading_stats(
    _user: AuthUser,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = resolve_date(query.date.as_deref())?;
    tracing::info!(%date, "querying trading stats");

    Ok(ApiResponse::ok(
        "Trading stats retrieved successfully",
        TradingStats {
            date: date.to_string(),
            volume: 15234.56,
            count: 128,
            cost: 12.34,
            profit: 45.67,
            success_rate: 78.5,
        },
    ))
}

/// `GET /trades/history`: Trade history between two days.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] on a malformed date, a start after
/// the end, or a `limit` outside `1..=1000`.
#[utoipa::path(
    get,
    path = "/api/trades/history",
    tag = "Trades",
    summary = "Trade history",
    params(HistoryQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "History page", body = ApiResponse<TradeHistory>),
        (status = 400, description = "Invalid parameters"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_trading_history(
    _user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !(1..=1000).contains(&query.limit) {
        return Err(ApiError::InvalidRequest(format!(
            "limit must be within 1..=1000, got {}",
            query.limit
        )));
    }
    let end_date = resolve_date(query.end_date.as_deref())?;
    let start_date = match query.start_date.as_deref() {
        Some(raw) => resolve_date(Some(raw))?,
        None => end_date.checked_sub_days(Days::new(7)).unwrap_or(end_date),
    };
    if start_date > end_date {
        return Err(ApiError::InvalidRequest(format!(
            "start_date {start_date} is after end_date {end_date}"
        )));
    }
    tracing::info!(%start_date, %end_date, limit = query.limit, "querying trading history");

    let trades = sample_trades(query.limit.min(SAMPLE_HISTORY_ROWS));
    Ok(ApiResponse::ok(
        "Trading history retrieved successfully",
        TradeHistory {
            total: trades.len(),
            trades,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            limit: query.limit,
            offset: query.offset,
        },
    ))
}

/// `GET /trades/status`: Strategy runtime status.
#[utoipa::path(
    get,
    path = "/api/trades/status",
    tag = "Trades",
    summary = "Strategy status",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Status", body = ApiResponse<TradingStatus>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_system_status(_user: AuthUser) -> impl IntoResponse {
    tracing::info!("querying system status");
    ApiResponse::ok(
        "System status retrieved successfully",
        TradingStatus {
            mode: "auto".to_string(),
            uptime: 7235,
            last_operation: clock::now_iso(),
            is_trading: true,
            health: "healthy".to_string(),
        },
    )
}

/// `GET /trades/market`: Top-of-book snapshot for a symbol.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if `symbol` is blank.
#[utoipa::path(
    get,
    path = "/api/trades/market",
    tag = "Trades",
    summary = "Market snapshot",
    params(MarketQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Snapshot", body = ApiResponse<MarketSnapshot>),
        (status = 400, description = "Blank symbol"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_market_data(
    _user: AuthUser,
    Query(query): Query<MarketQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = query.symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::InvalidRequest("symbol must not be empty".to_string()));
    }
    tracing::info!(%symbol, "querying market data");

    Ok(ApiResponse::ok(
        "Market data retrieved successfully",
        MarketSnapshot {
            symbol,
            bid_price: 0.05234,
            ask_price: 0.05236,
            spread: 0.00002,
            atr: 0.00015,
            timestamp: clock::now_iso(),
        },
    ))
}

/// `GET /trades/funds`: Account funds breakdown.
#[utoipa::path(
    get,
    path = "/api/trades/funds",
    tag = "Trades",
    summary = "Funds overview",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Funds", body = ApiResponse<FundsOverview>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_funds_overview(_user: AuthUser) -> impl IntoResponse {
    tracing::info!("querying funds overview");
    ApiResponse::ok(
        "Funds overview retrieved successfully",
        FundsOverview {
            available: 8543.21,
            position: 2456.78,
            grid: 1000.00,
            total: 12000.00,
            currency: "USDT".to_string(),
            timestamp: clock::now_iso(),
        },
    )
}

/// `GET /trades/points`: Daily points progress.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if `date` is not `YYYY-MM-DD`.
#[utoipa::path(
    get,
    path = "/api/trades/points",
    tag = "Trades",
    summary = "Points progress",
    params(DateQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Points", body = ApiResponse<PointsData>),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_points_data(
    _user: AuthUser,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = resolve_date(query.date.as_deref())?;
    tracing::info!(%date, "querying points data");

    Ok(ApiResponse::ok(
        "Points data retrieved successfully",
        PointsData {
            date: date.to_string(),
            current: 45,
            target: 100,
            percentage: 45.0,
            balance_points: 25,
            volume_points: 20,
        },
    ))
}

/// `n` sample fills, newest first, one hour apart.
fn sample_trades(n: u32) -> Vec<TradeRecord> {
    let now = Utc::now();
    (0..n)
        .map(|i| TradeRecord {
            id: i,
            symbol: "BTCUSDT".to_string(),
            side: if i % 2 == 0 { TradeSide::Buy } else { TradeSide::Sell },
            price: 50_000.0 + f64::from(i) * 10.0,
            quantity: 0.001,
            timestamp: clock::format_iso(now - Duration::hours(i64::from(i))),
        })
        .collect()
}

/// Trade routes, mounted under `/api/trades`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_trading_stats))
        .route("/history", get(get_trading_history))
        .route("/status", get(get_system_status))
        .route("/market", get(get_market_data))
        .route("/funds", get(get_funds_overview))
        .route("/points", get(get_points_data))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::app_state::test_support;

    async fn admin() -> AuthUser {
        test_support::admin(&test_support::state(std::env::temp_dir()).await).await
    }

    #[test]
    fn sample_trades_alternate_sides() {
        let trades = sample_trades(4);
        assert_eq!(trades.len(), 4);
        let sides: Vec<TradeSide> = trades.iter().map(|t| t.side).collect();
        assert_eq!(
            sides,
            vec![TradeSide::Buy, TradeSide::Sell, TradeSide::Buy, TradeSide::Sell]
        );
        assert!(trades.iter().zip(0u32..).all(|(t, i)| t.id == i));
    }

    #[tokio::test]
    async fn history_rejects_zero_limit() {
        let query = HistoryQuery {
            start_date: None,
            end_date: None,
            limit: 0,
            offset: 0,
        };
        assert!(matches!(
            get_trading_history(admin().await, Query(query)).await,
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn history_rejects_inverted_range() {
        let query = HistoryQuery {
            start_date: Some("2024-05-10".to_string()),
            end_date: Some("2024-05-01".to_string()),
            limit: 10,
            offset: 0,
        };
        assert!(get_trading_history(admin().await, Query(query)).await.is_err());
    }

    #[tokio::test]
    async fn stats_rejects_malformed_date() {
        let query = DateQuery {
            date: Some("10/05/2024".to_string()),
        };
        assert!(get_trading_stats(admin().await, Query(query)).await.is_err());
    }
}
