//! System endpoints: welcome, health check, API catalogue.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Router;
use axum::routing::get;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::dto::ApiResponse;
use crate::app_state::AppState;
use crate::clock;

/// Health check payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_secs: u64,
    ws_connections: usize,
    timestamp: String,
}

/// `GET /`: Welcome message and API map.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Welcome",
    responses(
        (status = 200, description = "Service banner", body = ApiResponse<serde_json::Value>),
    )
)]
pub async fn root_handler() -> impl IntoResponse {
    tracing::info!("root endpoint accessed");
    ApiResponse::ok(
        "Welcome to Alpha-Score API",
        json!({
            "service": "Alpha-Score Backend",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running",
            "apis": {
                "trades": "/api/trades/*",
                "logs": "/api/logs/*",
                "realtime": "/api/ws/*",
                "websocket": "/ws",
            }
        }),
    )
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, uptime and the number of live WebSocket connections.",
    responses(
        (status = 200, description = "Service is healthy", body = ApiResponse<HealthStatus>),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!("health check");
    ApiResponse::ok(
        "Service is healthy",
        HealthStatus {
            status: "healthy",
            service: "alpha-score-gateway",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.started_at.elapsed().as_secs(),
            ws_connections: state.connections.connection_count().await,
            timestamp: clock::now_iso(),
        },
    )
}

/// `GET /api`: Endpoint catalogue.
#[utoipa::path(
    get,
    path = "/api",
    tag = "System",
    summary = "API information",
    responses(
        (status = 200, description = "Endpoint catalogue", body = ApiResponse<serde_json::Value>),
    )
)]
pub async fn api_info_handler() -> impl IntoResponse {
    ApiResponse::ok(
        "API Information",
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": {
                    "prefix": "/api/auth",
                    "description": "Login and current user",
                    "routes": ["POST /login", "POST /logout", "GET /me"]
                },
                "config": {
                    "prefix": "/api/config",
                    "description": "Dashboard configuration",
                    "routes": ["GET /", "PUT /", "POST /reload", "GET /schema"]
                },
                "trades": {
                    "prefix": "/api/trades",
                    "description": "Trading statistics",
                    "routes": ["GET /stats", "GET /history", "GET /status", "GET /market", "GET /funds", "GET /points"]
                },
                "logs": {
                    "prefix": "/api/logs",
                    "description": "Log file queries",
                    "routes": ["GET /", "GET /files", "GET /stats"]
                },
                "realtime": {
                    "prefix": "/api/ws",
                    "description": "WebSocket registry status and broadcast",
                    "routes": ["GET /status", "POST /broadcast"]
                },
                "websocket": {
                    "path": "/ws",
                    "description": "Price, orderbook, trade and status stream",
                    "events": ["connection_established", "ping", "echo", "price_update", "orderbook_update", "trade_executed", "system_status"]
                }
            },
            "documentation": {
                "swagger": "/docs",
                "openapi": "/api-docs/openapi.json"
            }
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api", get(api_info_handler))
}
