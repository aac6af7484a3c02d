//! Bearer-token guard for handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::{AuthError, User};
use crate::app_state::AppState;
use crate::error::ApiError;

/// The authenticated caller.
///
/// Taking `AuthUser` as a handler argument makes the route require a valid
/// `Authorization: Bearer <token>` header; otherwise the request is refused
/// with `401`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let user = state.auth.authenticate(token).await?;
        Ok(Self(user))
    }
}

/// Extracts the token from a `Bearer <token>` header value, case-insensitively
/// on the scheme.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    use super::*;
    use crate::app_state::test_support;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    async fn extract(state: &AppState, header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request build failed");
        };
        let (mut parts, ()) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let state = test_support::state(std::env::temp_dir()).await;
        let token = test_support::bearer(&state);
        let Ok(AuthUser(user)) = extract(&state, Some(&token)).await else {
            panic!("valid token refused");
        };
        assert_eq!(user.username, "admin");
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let state = test_support::state(std::env::temp_dir()).await;
        for header in [None, Some("Bearer nonsense"), Some("Token abc")] {
            let Err(err) = extract(&state, header).await else {
                panic!("{header:?} accepted");
            };
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers().get("www-authenticate").map(|v| v.as_bytes()),
                Some(b"Bearer".as_slice())
            );
        }
    }
}
