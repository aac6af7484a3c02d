//! DTOs for the `/api/auth` endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::User;
use crate::clock;

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// 1 to 50 characters.
    pub username: String,
    /// Non-empty.
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Signed JWT for the `Authorization: Bearer` header.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// A user without credentials.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    /// User id.
    pub id: u32,
    /// Login name.
    pub username: String,
    /// `admin` or `user`.
    pub role: String,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Last successful login.
    pub last_login: Option<String>,
    /// Creation time.
    pub created_at: String,
    /// Last change.
    pub updated_at: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
            last_login: user.last_login.map(clock::format_iso),
            created_at: clock::format_iso(user.created_at),
            updated_at: clock::format_iso(user.updated_at),
        }
    }
}

/// Empty `data` object.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct Empty {}
