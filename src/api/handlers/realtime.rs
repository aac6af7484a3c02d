//! WebSocket registry status and admin broadcast.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ApiResponse, BroadcastRequest, BroadcastResult, RealtimeStatus};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::ws::ServerEvent;

/// `GET /ws/status`: Live connection count and heartbeat settings.
#[utoipa::path(
    get,
    path = "/api/ws/status",
    tag = "Realtime",
    summary = "WebSocket status",
    responses(
        (status = 200, description = "Registry status", body = ApiResponse<RealtimeStatus>),
    )
)]
pub async fn ws_status(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.connections.config();
    ApiResponse::ok(
        "WebSocket status retrieved successfully",
        RealtimeStatus {
            connections: state.connections.connection_count().await,
            heartbeat_interval_secs: config.heartbeat_interval.as_secs(),
            write_timeout_secs: config.write_timeout.as_secs(),
        },
    )
}

/// `POST /ws/broadcast`: Push one event to every connected dashboard.
///
/// Always succeeds; unreachable clients are dropped from the registry and
/// simply not counted in `delivered`.
#[utoipa::path(
    post,
    path = "/api/ws/broadcast",
    tag = "Realtime",
    summary = "Broadcast an event",
    request_body = BroadcastRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Fan-out result", body = ApiResponse<BroadcastResult>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn broadcast_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> impl IntoResponse {
    let event = ServerEvent::from(req);
    let kind = event.kind();
    let delivered = state.connections.broadcast(event).await;
    tracing::info!(kind, delivered, user = %user.username, "admin broadcast");

    ApiResponse::ok(
        "Broadcast sent",
        BroadcastResult {
            kind: kind.to_string(),
            delivered,
        },
    )
}

/// Realtime routes, mounted under `/api/ws`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(ws_status))
        .route("/broadcast", post(broadcast_event))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::extract::ws::Message;

    use super::*;
    use crate::app_state::test_support;
    use crate::ws::channel::test_support::memory_sink;
    use crate::ws::messages::SystemStatus;

    #[tokio::test]
    async fn broadcast_endpoint_reaches_connections() {
        let state = test_support::state(std::env::temp_dir()).await;
        let (sink, mut rx) = memory_sink();
        state.connections.connect(sink, None).await;
        let Some(Message::Text(_welcome)) = rx.recv().await else {
            panic!("expected welcome");
        };

        let user = test_support::admin(&state).await;
        let req = BroadcastRequest::SystemStatus(SystemStatus {
            mode: "manual".to_string(),
            points_today: 12.0,
            volume_today: 3400.0,
        });
        let _ = broadcast_event(user, State(state), Json(req)).await;

        let Some(Message::Text(text)) = rx.recv().await else {
            panic!("expected broadcast frame");
        };
        assert!(text.as_str().contains("\"type\":\"system_status\""));
    }
}
