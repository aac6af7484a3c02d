//! Error types for the gateway.
//!
//! - [`ChannelError`]: a single write to a client channel failed. Never leaves
//!   the connection manager; it only triggers deregistration.
//! - [`ApiError`]: REST handler failure, mapped to an HTTP status and the
//!   unified `{code, message, data, timestamp}` response body.
//! - [`ConfigError`]: invalid startup configuration.

use std::time::Duration;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::clock;

/// Failure to deliver one frame to one client channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel has already been closed (peer gone or deregistered).
    #[error("channel closed")]
    Closed,

    /// The write did not complete within the configured write timeout.
    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    /// The underlying transport reported an error.
    #[error("write failed: {0}")]
    Write(String),

    /// The envelope could not be encoded as JSON.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<axum::Error> for ChannelError {
    fn from(err: axum::Error) -> Self {
        Self::Write(err.to_string())
    }
}

/// Error body rendered for every failed REST request.
///
/// ```json
/// {
///   "code": 401,
///   "message": "Incorrect username or password",
///   "data": { "error": "unauthorized" },
///   "timestamp": "2024-01-01T00:00:00.000000Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
    /// Additional error details.
    pub data: ErrorDetails,
    /// ISO-8601 UTC time the error was produced.
    pub timestamp: String,
}

/// Inner details of an [`ErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Short machine-oriented error category.
    pub error: &'static str,
}

/// REST handler error with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or refused credentials. Rendered with
    /// `WWW-Authenticate: Bearer`.
    #[error("{0}")]
    Unauthorized(String),

    /// Filesystem access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the short error category placed in the response details.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = ErrorResponse {
            code: status.as_u16(),
            message: self.to_string(),
            data: ErrorDetails {
                error: self.category(),
            },
            timestamp: clock::now_iso(),
        };
        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is not a valid socket address.
    #[error("invalid LISTEN_ADDR {value:?}: {source}")]
    ListenAddr {
        /// The rejected value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// An entry of `CORS_ALLOWED_ORIGINS` is not a valid header value.
    #[error("invalid CORS origin {0:?}")]
    CorsOrigin(String),

    /// `LOG_FORMAT` is neither `pretty` nor `json`.
    #[error("invalid LOG_FORMAT {0:?}; expected \"pretty\" or \"json\"")]
    LogFormat(String),

    /// A duration setting was zero.
    #[error("{key} must be greater than zero")]
    ZeroDuration {
        /// The offending variable.
        key: &'static str,
    },

    /// `JWT_SECRET` is too short to sign tokens safely.
    #[error("JWT_SECRET must be at least {min} characters")]
    JwtSecret {
        /// Minimum accepted length.
        min: usize,
    },

    /// An entry of `AUTH_USERS` is malformed.
    #[error("invalid AUTH_USERS entry #{index}: {reason}")]
    UserEntry {
        /// Zero-based position in the list.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}
