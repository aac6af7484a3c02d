//! Dashboard login and bearer-token authentication.
//!
//! - [`users`]: configured users with bcrypt password hashes.
//! - [`token`]: HS256 access tokens carrying the user id.
//! - [`extractor`]: [`AuthUser`] guard for protected handlers.

pub mod extractor;
pub mod token;
pub mod users;

use chrono::Utc;

pub use extractor::AuthUser;
pub use token::{Claims, TokenIssuer};
pub use users::{User, UserSeed, UserStore};

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Authentication failure.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Login attempt on a disabled account.
    #[error("User account is inactive")]
    Inactive,

    /// No `Authorization: Bearer` header.
    #[error("Not authenticated")]
    MissingToken,

    /// Bad signature, malformed token or unusable subject.
    #[error("Invalid authentication credentials")]
    InvalidToken,

    /// Token past its `exp`.
    #[error("Token has expired")]
    Expired,

    /// Token subject no longer matches a user.
    #[error("User not found")]
    UnknownUser,

    /// Token subject belongs to a disabled account.
    #[error("User is inactive")]
    Disabled,

    /// bcrypt failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Token(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hash(_) | AuthError::Token(_) => Self::Internal(err.to_string()),
            _ => Self::Unauthorized(err.to_string()),
        }
    }
}

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct Session {
    /// Signed JWT.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// The logged-in user, with `last_login` already updated.
    pub user: User,
}

/// Users plus token issuer.
#[derive(Debug)]
pub struct AuthService {
    users: UserStore,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Bundles a user store and a token issuer.
    #[must_use]
    pub const fn new(users: UserStore, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Hashes the configured users at `cost` and keys the issuer with the
    /// configured secret.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hash`] if a password cannot be hashed.
    pub fn from_config(config: &AuthConfig, cost: u32) -> Result<Self, AuthError> {
        let users = UserStore::from_seeds(&config.users, cost)?;
        let tokens = TokenIssuer::new(config.jwt_secret.expose().as_bytes(), config.token_ttl);
        Ok(Self::new(users, tokens))
    }

    /// The user table.
    #[must_use]
    pub const fn users(&self) -> &UserStore {
        &self.users
    }

    /// Checks credentials and issues a token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] or [`AuthError::Inactive`] on a
    /// refused login; [`AuthError::Token`] if signing fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let user = self.users.verify(username, password).await?;
        let access_token = self.tokens.issue(user.id)?;
        let user = self
            .users
            .record_login(user.id, Utc::now())
            .await
            .ok_or(AuthError::UnknownUser)?;
        tracing::info!(user = %user.username, "user logged in");
        Ok(Session {
            access_token,
            expires_in: self.tokens.ttl().as_secs(),
            user,
        })
    }

    /// Resolves a bearer token to an active user.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`], [`AuthError::Expired`],
    /// [`AuthError::UnknownUser`] or [`AuthError::Disabled`].
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let id = self.tokens.verify(token)?;
        let user = self.users.get(id).await.ok_or(AuthError::UnknownUser)?;
        if !user.is_active {
            return Err(AuthError::Disabled);
        }
        Ok(user)
    }

    /// Issues a token for a user id without a password check.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Token`] if signing fails.
    pub fn issue_token(&self, user_id: u32) -> Result<String, AuthError> {
        self.tokens.issue(user_id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;

    use super::*;

    fn service() -> AuthService {
        let seeds = [UserSeed::new("admin", "admin123", "admin")];
        let Ok(users) = UserStore::from_seeds(&seeds, 4) else {
            panic!("seeding failed");
        };
        let tokens = TokenIssuer::new(
            b"0123456789abcdef0123456789abcdef",
            Duration::from_secs(3600),
        );
        AuthService::new(users, tokens)
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let auth = service();
        let Ok(session) = auth.login("admin", "admin123").await else {
            panic!("login refused");
        };
        assert_eq!(session.expires_in, 3600);
        assert!(session.user.last_login.is_some());

        let Ok(user) = auth.authenticate(&session.access_token).await else {
            panic!("token refused");
        };
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, "admin");
    }

    #[tokio::test]
    async fn disabled_user_token_is_refused() {
        let auth = service();
        let Ok(token) = auth.issue_token(1) else {
            panic!("signing failed");
        };
        assert!(auth.users().set_active(1, false).await);
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::Disabled)
        ));
    }

    #[tokio::test]
    async fn token_for_unknown_user_is_refused() {
        let auth = service();
        let Ok(token) = auth.issue_token(42) else {
            panic!("signing failed");
        };
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::UnknownUser)
        ));
    }

    #[test]
    fn auth_errors_map_to_status() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Hash("cost".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
