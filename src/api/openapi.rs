//! OpenAPI document for the REST surface.
//!
//! Served as JSON at `/api-docs/openapi.json`; with the `swagger-ui` feature
//! the interactive UI is mounted at `/docs`.

use std::collections::BTreeMap;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    ApiResponse, BroadcastRequest, BroadcastResult, Empty, FundsOverview, LogFileInfo,
    LogFileList, LogFilters, LogQueryResult, LogTypeStats, LoginRequest, LoginResponse,
    MarketSnapshot, PointsData, RealtimeStatus, SettingsUpdateRequest, TradeHistory, TradeRecord,
    TradingStats, TradingStatus, UserInfo,
};
use crate::api::handlers::system::HealthStatus;
use crate::settings::AppSettings;
use crate::ws::TradeSide;
use crate::ws::messages::{OrderbookUpdate, PriceUpdate, SystemStatus, TradeExecuted};

/// Alpha-Score gateway API document.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Alpha-Score API",
        description = "Trading dashboard backend: trading statistics, log queries, configuration and the realtime broadcast channel at `/ws`.",
        license(name = "MIT")
    ),
    tags(
        (name = "System", description = "Service banner and health"),
        (name = "Auth", description = "Login and current user"),
        (name = "Config", description = "Dashboard configuration files"),
        (name = "Trades", description = "Trading statistics"),
        (name = "Logs", description = "Log file queries"),
        (name = "Realtime", description = "WebSocket registry status and broadcast")
    ),
    components(
        schemas(
            ApiResponse<HealthStatus>,
            ApiResponse<LoginResponse>,
            ApiResponse<UserInfo>,
            ApiResponse<Empty>,
            ApiResponse<TradingStats>,
            ApiResponse<TradeHistory>,
            ApiResponse<TradingStatus>,
            ApiResponse<MarketSnapshot>,
            ApiResponse<FundsOverview>,
            ApiResponse<PointsData>,
            ApiResponse<LogQueryResult>,
            ApiResponse<LogFileList>,
            ApiResponse<BTreeMap<String, LogTypeStats>>,
            ApiResponse<RealtimeStatus>,
            ApiResponse<BroadcastResult>,
            LoginRequest,
            SettingsUpdateRequest,
            AppSettings,
            TradeRecord,
            TradeSide,
            LogFileInfo,
            LogFilters,
            BroadcastRequest,
            PriceUpdate,
            OrderbookUpdate,
            TradeExecuted,
            SystemStatus,
        )
    ),
    paths(
        crate::api::handlers::system::root_handler,
        crate::api::handlers::system::health_handler,
        crate::api::handlers::system::api_info_handler,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::current_user,
        crate::api::handlers::settings::get_settings,
        crate::api::handlers::settings::update_settings,
        crate::api::handlers::settings::reload_settings,
        crate::api::handlers::settings::settings_schema,
        crate::api::handlers::trades::get_trading_stats,
        crate::api::handlers::trades::get_trading_history,
        crate::api::handlers::trades::get_system_status,
        crate::api::handlers::trades::get_market_data,
        crate::api::handlers::trades::get_funds_overview,
        crate::api::handlers::trades::get_points_data,
        crate::api::handlers::logs::query_logs,
        crate::api::handlers::logs::list_log_files,
        crate::api::handlers::logs::get_log_stats,
        crate::api::handlers::realtime::ws_status,
        crate::api::handlers::realtime::broadcast_event,
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT scheme that guarded paths refer to.
#[derive(Debug)]
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI at `/docs`, backed by `/api-docs/openapi.json`.
#[cfg(feature = "swagger-ui")]
pub fn swagger_ui_router<S>() -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    utoipa_swagger_ui::SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

/// Plain OpenAPI JSON at `/api-docs/openapi.json` when Swagger UI is disabled.
#[cfg(not(feature = "swagger-ui"))]
pub fn swagger_ui_router<S>() -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    axum::Router::new().route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/config",
            "/api/config/schema",
            "/api/trades/history",
            "/api/logs",
            "/api/ws/broadcast",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        assert!(
            doc.components
                .is_some_and(|c| c.security_schemes.contains_key("bearer"))
        );
    }
}
