//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod logs;
pub mod realtime;
pub mod settings;
pub mod system;
pub mod trades;

use axum::Router;
use chrono::{NaiveDate, Utc};

use crate::app_state::AppState;
use crate::error::ApiError;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/config", settings::routes())
        .nest("/trades", trades::routes())
        .nest("/logs", logs::routes())
        .nest("/ws", realtime::routes())
}

/// Parses a `YYYY-MM-DD` query value, defaulting to today (UTC).
pub(crate) fn resolve_date(raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            ApiError::InvalidRequest(format!("invalid date {s:?}; expected YYYY-MM-DD"))
        }),
        None => Ok(Utc::now().date_naive()),
    }
}
