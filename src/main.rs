//! alpha-score-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use alpha_score_gateway::api;
use alpha_score_gateway::app_state::AppState;
use alpha_score_gateway::auth::AuthService;
use alpha_score_gateway::config::{AuthConfig, ServerConfig};
use alpha_score_gateway::settings::SettingsStore;
use alpha_score_gateway::telemetry;
use alpha_score_gateway::ws::ConnectionManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::from_env()?;
    telemetry::init(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        log_dir = %config.log_dir.display(),
        config_dir = %config.config_dir.display(),
        heartbeat_secs = config.ws.heartbeat_interval.as_secs(),
        "starting alpha-score-gateway"
    );

    // Users and configuration files
    let auth_config = AuthConfig::from_env()?;
    let auth = AuthService::from_config(&auth_config, bcrypt::DEFAULT_COST)?;
    tracing::info!(users = auth.users().len().await, "auth ready");
    let settings = SettingsStore::open(config.config_dir).await;

    // Build connection registry and application state
    let manager = Arc::new(ConnectionManager::new(config.ws));
    let app_state = AppState::new(
        Arc::clone(&manager),
        config.log_dir,
        Arc::new(auth),
        Arc::new(settings),
    );

    let app = api::build_app(app_state, config.cors_origins);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    manager.shutdown().await;
    tracing::info!("server stopped");

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
