//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;

/// Query parameters accepted on `/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Client-chosen label; defaults to the remote address.
    pub client_id: Option<String>,
}

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// The stream is unauthenticated; every upgraded socket is registered.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let client_id = params
        .client_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| remote.to_string());
    let manager = Arc::clone(&state.connections);

    ws.on_upgrade(move |socket| run_connection(socket, manager, Some(client_id)))
}
