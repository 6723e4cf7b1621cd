// Authentication HTTP routes
// Decision: The refresh token travels only in an httpOnly cookie, never in a body
// Decision: Refresh rotates: the presented token is revoked and a new pair is issued
// Decision: Only the request whose delete removes the stored row may rotate it
// Decision: Stored refresh tokens are SHA-256 hashes; expired rows are purged on login

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use spicescape_core::{user::DEFAULT_BIOGRAPHY, AppError, ImageRef};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    jwt::hash_token,
    middleware::{AuthState, AuthUser},
};
use crate::api::common::{ErrorResponse, MessageResponse};
use crate::api::error::{ApiJson, ApiResult};
use crate::api::validation::{validate_login, validate_registration};
use crate::storage::{
    models::{CreateRefreshTokenRow, CreateUserRow, RefreshTokenRow},
    password::{hash_password_blocking, verify_password_blocking},
    StorageBackend,
};

/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "chefAlice")]
    pub username: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "Secret123")]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "Secret123")]
    pub password: Option<String>,
}

/// User details returned on login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub name: String,
    pub profile_image: ImageRef,
    pub biography: String,
    pub user_id: Uuid,
}

/// Login response. The refresh token is set as a cookie.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: LoginUser,
    pub access_token: String,
}

/// Refresh response. The rotated refresh token is set as a cookie.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// POST /auth/register - Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input or duplicate email", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let registration = validate_registration(
        req.username.as_deref(),
        req.email.as_deref(),
        req.password.as_deref(),
    )?;

    let password_hash = hash_password_blocking(registration.password).await?;

    let user = state
        .db
        .create_user(CreateUserRow {
            username: registration.username,
            email: registration.email,
            password_hash,
            profile_image: ImageRef::default_profile(),
            biography: DEFAULT_BIOGRAPHY.to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User has been successfully registered.")),
    ))
}

/// POST /auth/login - Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; refresh token set as cookie", body = LoginResponse),
        (status = 400, description = "Invalid input or wrong password", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let credentials = validate_login(req.email.as_deref(), req.password.as_deref())?;

    let user = state
        .db
        .get_user_by_email(&credentials.email)
        .await?
        .ok_or_else(|| AppError::not_found(INVALID_CREDENTIALS))?;

    let valid = verify_password_blocking(credentials.password, user.password_hash.clone()).await?;
    if !valid {
        return Err(AppError::bad_request(INVALID_CREDENTIALS).into());
    }

    match state.db.delete_expired_refresh_tokens().await {
        Ok(0) => {}
        Ok(purged) => tracing::debug!(purged, "Purged expired refresh tokens"),
        Err(e) => tracing::warn!("Failed to purge expired refresh tokens: {:#}", e),
    }

    let (jar, access_token) = issue_session(&state, jar, user.id, &user.username).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(LoginResponse {
            user: LoginUser {
                name: user.username.clone(),
                profile_image: user.profile_image(),
                biography: user.biography,
                user_id: user.id,
            },
            access_token,
        }),
    ))
}

/// POST /auth/refresh - Exchange the refresh cookie for a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "New access token; rotated refresh token set as cookie", body = AccessTokenResponse),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token", body = ErrorResponse),
        (status = 404, description = "Token subject no longer exists", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<AccessTokenResponse>)> {
    let token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::unauthenticated(AUTHENTICATION_FAILED))?;

    let claims = state.jwt_service.verify_refresh_token(&token).map_err(|e| {
        tracing::debug!("Refresh token rejected: {}", e);
        AppError::unauthenticated(AUTHENTICATION_FAILED)
    })?;

    // A token that is not stored was already used or revoked
    let stored = state
        .db
        .get_refresh_token_by_hash(&hash_token(&token))
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.user_id, "Refresh token not on record");
            AppError::unauthenticated(AUTHENTICATION_FAILED)
        })?;
    revoke_presented_token(&state.db, &stored).await?;

    let user = state
        .db
        .get_user(claims.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("This user does not exist"))?;

    let (jar, access_token) = issue_session(&state, jar, user.id, &user.username).await?;
    tracing::debug!(user_id = %user.id, "Refresh token rotated");

    Ok((jar, Json(AccessTokenResponse { access_token })))
}

/// Delete the stored row for a presented refresh token. Losing the delete to
/// a concurrent refresh or logout means the token is already spent.
async fn revoke_presented_token(
    db: &StorageBackend,
    stored: &RefreshTokenRow,
) -> Result<(), AppError> {
    if !db.delete_refresh_token(stored.id).await? {
        tracing::debug!(user_id = %stored.user_id, "Refresh token already consumed");
        return Err(AppError::unauthenticated(AUTHENTICATION_FAILED));
    }
    Ok(())
}

/// POST /auth/logout - Revoke the refresh token and clear its cookie
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 204, description = "No refresh cookie present"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AuthState>,
    user: AuthUser,
    jar: CookieJar,
) -> ApiResult<Response> {
    let Some(token) = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    if let Some(stored) = state
        .db
        .get_refresh_token_by_hash(&hash_token(&token))
        .await?
    {
        state.db.delete_refresh_token(stored.id).await?;
    }

    tracing::info!(user_id = %user.id, "User logged out");

    let jar = jar.remove(removal_cookie(&state));
    Ok((
        jar,
        Json(MessageResponse::new("User successfully logged out")),
    )
        .into_response())
}

/// Issue an access token and a stored refresh token, setting the refresh cookie
async fn issue_session(
    state: &AuthState,
    jar: CookieJar,
    user_id: Uuid,
    username: &str,
) -> Result<(CookieJar, String), AppError> {
    let access_token = state.jwt_service.issue_access_token(user_id, username)?;
    let refresh = state.jwt_service.issue_refresh_token(user_id)?;

    state
        .db
        .create_refresh_token(CreateRefreshTokenRow {
            user_id,
            token_hash: hash_token(&refresh.token),
            expires_at: refresh.expires_at,
        })
        .await?;

    Ok((jar.add(refresh_cookie(state, refresh.token)), access_token))
}

fn refresh_cookie(state: &AuthState, token: String) -> Cookie<'static> {
    let mut builder = Cookie::build((REFRESH_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie.secure)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(
            state.jwt_service.refresh_token_lifetime_secs(),
        ));
    if let Some(domain) = &state.config.cookie.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

fn removal_cookie(state: &AuthState) -> Cookie<'static> {
    let mut builder = Cookie::build(REFRESH_TOKEN_COOKIE)
        .path("/")
        .http_only(true)
        .secure(state.config.cookie.secure)
        .same_site(SameSite::None);
    if let Some(domain) = &state.config.cookie.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}
