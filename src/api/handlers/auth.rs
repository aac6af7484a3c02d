//! Login, logout and current-user endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ApiResponse, Empty, LoginRequest, LoginResponse, UserInfo};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Longest accepted username.
const MAX_USERNAME_LEN: usize = 50;

/// `POST /auth/login`: Exchange credentials for a bearer token.
///
/// # Errors
///
/// [`ApiError::InvalidRequest`] on a blank or over-long username or an empty
/// password; [`ApiError::Unauthorized`] on refused credentials or a disabled
/// account.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Malformed credentials"),
        (status = 401, description = "Incorrect username or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let len = req.username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(ApiError::InvalidRequest(
            "username must be 1 to 50 characters".to_string(),
        ));
    }
    if req.password.is_empty() {
        return Err(ApiError::InvalidRequest("password must not be empty".to_string()));
    }

    let session = state
        .auth
        .login(&req.username, &req.password)
        .await
        .inspect_err(|err| tracing::warn!(user = %req.username, error = %err, "login refused"))?;

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            access_token: session.access_token,
            token_type: "bearer",
            expires_in: session.expires_in,
        },
    ))
}

/// `POST /auth/logout`: Acknowledge a logout.
///
/// Tokens are stateless; the client discards its copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    summary = "Log out",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<Empty>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn logout(AuthUser(user): AuthUser) -> impl IntoResponse {
    tracing::info!(user = %user.username, "user logged out");
    ApiResponse::ok("Logged out successfully", Empty {})
}

/// `GET /auth/me`: The caller's account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    summary = "Current user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserInfo>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn current_user(AuthUser(user): AuthUser) -> impl IntoResponse {
    ApiResponse::ok("User info retrieved successfully", UserInfo::from(&user))
}

/// Auth routes, mounted under `/api/auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(current_user))
}
