//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints live under `/api`; the service banner and health check
//! sit at the root next to the `/ws` upgrade endpoint.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the REST router with all HTTP endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: REST, `/ws`, API docs and the HTTP layers.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// WebSocket handler falls back to the peer address as the client id.
pub fn build_app(state: AppState, cors_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .merge(openapi::swagger_ui_router())
        .layer(axum::middleware::from_fn(middleware::process_time))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
