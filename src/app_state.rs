//! Shared application state injected into all Axum handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthService;
use crate::settings::SettingsStore;
use crate::ws::ConnectionManager;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registry of live WebSocket connections.
    pub connections: Arc<ConnectionManager>,
    /// Root directory of the queryable log files.
    pub log_dir: Arc<PathBuf>,
    /// Users and token issuer.
    pub auth: Arc<AuthService>,
    /// Dashboard configuration files.
    pub settings: Arc<SettingsStore>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Bundles the shared services; uptime counts from this call.
    #[must_use]
    pub fn new(
        connections: Arc<ConnectionManager>,
        log_dir: PathBuf,
        auth: Arc<AuthService>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            connections,
            log_dir: Arc::new(log_dir),
            auth,
            settings,
            started_at: Instant::now(),
        }
    }
}
