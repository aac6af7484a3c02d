//! # alpha-score-gateway
//!
//! HTTP and WebSocket backend for the Alpha-Score trading dashboard.
//!
//! The heart of the crate is the [`ws::ConnectionManager`]: a registry of
//! live dashboard connections that delivers targeted messages, fans out
//! broadcasts, keeps each connection alive with a periodic heartbeat and
//! drops any client whose send fails. The REST layer serves trading
//! statistics, log file queries, the YAML dashboard configuration and an
//! admin broadcast endpoint, behind bearer-token login.
//!
//! ## Architecture
//!
//! ```text
//! Dashboards (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     │     ├── AuthUser guard (auth/)
//!     │     └── SettingsStore (settings/)
//!     ├── WS Upgrade + read loop (ws/handler, ws/connection)
//!     │
//!     ├── ConnectionManager (ws/manager)
//!     │     ├── ClientChannel per connection (ws/channel)
//!     │     └── heartbeat task per connection
//!     │
//!     ├── Log files on disk (LOG_DIR)
//!     └── YAML config files (CONFIG_DIR)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod settings;
pub mod telemetry;
pub mod ws;
