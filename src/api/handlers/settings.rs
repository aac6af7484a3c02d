//! Configuration read, update, reload and schema endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::{ApiResponse, SettingsUpdateRequest};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::settings;

/// `GET /config`: Current configuration with credentials masked.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] if the configuration cannot be encoded.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Config",
    summary = "Current configuration",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Masked configuration", body = Object),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_settings(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let view = settings::safe_view(&state.settings.current().await)?;
    Ok(ApiResponse::ok("Configuration retrieved successfully", view))
}

/// `PUT /config`: Deep-merge a partial configuration into `settings.yaml`.
///
/// # Errors
///
/// [`ApiError::InvalidRequest`] if the merged configuration is invalid or the
/// patch touches `ladders` or `secrets`; [`ApiError::Io`] or
/// [`ApiError::Internal`] if the file cannot be read or written.
#[utoipa::path(
    put,
    path = "/api/config",
    tag = "Config",
    summary = "Update configuration",
    request_body = SettingsUpdateRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated, masked configuration", body = Object),
        (status = 400, description = "Invalid configuration"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn update_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.settings.update(req.config).await?;
    tracing::info!(user = %user.username, "configuration changed");
    let view = settings::safe_view(&updated)?;
    Ok(ApiResponse::ok("Configuration updated successfully", view))
}

/// `POST /config/reload`: Re-read the configuration files.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] or [`ApiError::Io`] if a file cannot be
/// read or parsed; the previous configuration stays in effect.
#[utoipa::path(
    post,
    path = "/api/config/reload",
    tag = "Config",
    summary = "Reload configuration",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reloaded, masked configuration", body = Object),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn reload_settings(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let fresh = state.settings.reload().await?;
    let view = settings::safe_view(&fresh)?;
    Ok(ApiResponse::ok("Configuration reloaded successfully", view))
}

/// `GET /config/schema`: JSON schema of the configuration, for form
/// generation.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] if the schema cannot be encoded.
#[utoipa::path(
    get,
    path = "/api/config/schema",
    tag = "Config",
    summary = "Configuration schema",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Schema", body = Object),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn settings_schema(_user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    let schema: Value = settings::schema()?;
    Ok(ApiResponse::ok("Configuration schema retrieved successfully", schema))
}

/// Config routes, mounted under `/api/config`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/reload", post(reload_settings))
        .route("/schema", get(settings_schema))
}
