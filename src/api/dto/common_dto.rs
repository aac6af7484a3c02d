//! Unified response wrapper shared by every REST endpoint.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::clock;

/// Response body wrapper: `{code, message, data, timestamp}`.
///
/// `code` mirrors the outcome. A few lookups (missing log file) answer
/// HTTP 200 with `code: 404` and an empty payload so dashboards can render
/// an empty table instead of an error.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Outcome code.
    pub code: u16,
    /// Human-readable outcome message.
    pub message: String,
    /// Endpoint-specific payload.
    pub data: T,
    /// ISO-8601 UTC time the response was produced.
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with code 200.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_code(200, message, data)
    }

    /// Response carrying an explicit outcome code.
    #[must_use]
    pub fn with_code(code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data,
            timestamp: clock::now_iso(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Optional single-day filter (`YYYY-MM-DD`, defaults to today).
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct DateQuery {
    /// Day to query.
    pub date: Option<String>,
}
