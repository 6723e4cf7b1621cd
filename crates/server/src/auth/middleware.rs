// Authentication middleware and extractors
// Decision: Support both header-based (API) and cookie-based (browser) access tokens
// Decision: Identity comes from the token alone; handlers look the user up when they need more

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use spicescape_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

use super::{config::AuthConfig, jwt::JwtService};
use crate::api::error::ApiError;
use crate::storage::StorageBackend;

/// Cookie that may carry the access token when no Authorization header is sent
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const AUTHENTICATION_INVALID: &str = "Authentication invalid";

/// Authenticated caller, valid for the current request only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID
    pub id: Uuid,
    /// Username at the time the token was issued
    pub username: String,
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub db: StorageBackend,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: StorageBackend) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            jwt_service,
            db,
        }
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state).map_err(ApiError::from)
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Extract authenticated user from request
fn extract_auth_user(parts: &Parts, auth_state: &AuthState) -> Result<AuthUser, AppError> {
    // Try to extract from Authorization header first
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::unauthenticated(AUTHENTICATION_INVALID))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return validate_access_token(token.trim(), auth_state);
        }
    }

    // Fall back to the cookie
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return validate_access_token(cookie.value(), auth_state);
    }

    Err(AppError::unauthenticated(AUTHENTICATION_INVALID))
}

/// Validate an access token and return the caller
fn validate_access_token(token: &str, auth_state: &AuthState) -> Result<AuthUser, AppError> {
    let claims = auth_state
        .jwt_service
        .verify_access_token(token)
        .map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            AppError::unauthenticated(AUTHENTICATION_INVALID)
        })?;

    Ok(AuthUser {
        id: claims.user_id,
        username: claims.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn state() -> AuthState {
        AuthState::new(AuthConfig::default(), StorageBackend::in_memory())
    }

    fn parts(header: Option<(&str, String)>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_header() {
        let state = state();
        let id = Uuid::now_v7();
        let token = state.jwt_service.issue_access_token(id, "chefAlice").unwrap();

        let user =
            extract_auth_user(&parts(Some(("authorization", format!("Bearer {}", token)))), &state)
                .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "chefAlice");
    }

    #[test]
    fn test_cookie_fallback() {
        let state = state();
        let id = Uuid::now_v7();
        let token = state.jwt_service.issue_access_token(id, "chefAlice").unwrap();

        let user = extract_auth_user(
            &parts(Some(("cookie", format!("{}={}", ACCESS_TOKEN_COOKIE, token)))),
            &state,
        )
        .unwrap();
        assert_eq!(user.id, id);
    }

    #[test]
    fn test_missing_or_invalid_token() {
        let state = state();
        let err = extract_auth_user(&parts(None), &state).unwrap_err();
        assert_eq!(err, AppError::unauthenticated("Authentication invalid"));

        let err = extract_auth_user(
            &parts(Some(("authorization", "Bearer not-a-token".to_string()))),
            &state,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 401);

        // A refresh token never authenticates a request
        let refresh = state.jwt_service.issue_refresh_token(Uuid::now_v7()).unwrap();
        let err = extract_auth_user(
            &parts(Some(("authorization", format!("Bearer {}", refresh.token)))),
            &state,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
