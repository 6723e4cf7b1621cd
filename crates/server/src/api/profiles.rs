// Profile HTTP routes
// Decision: Follower and following lists always carry the list; an empty one adds a message

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spicescape_core::parse_id;
use std::sync::Arc;
use utoipa::ToSchema;

use super::comments::CommentView;
use super::common::{ErrorResponse, ListResponse, MessageResponse, UserSummary};
use super::error::{ApiJson, ApiResult};
use super::recipes::RecipeCard;
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::images::ImageHost;
use crate::services::ProfileService;
use crate::storage::StorageBackend;

/// Public profile fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub username: String,
    /// URL of the profile image.
    pub profile_image: String,
    pub biography: String,
    pub follower_count: usize,
    pub following_count: usize,
}

/// Profile page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user: ProfileDetails,
    pub recipes: Vec<RecipeCard>,
    pub comments: Vec<CommentView>,
    /// Whether the caller follows this user.
    pub is_following: bool,
}

/// Request to edit a profile. Every field is required.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRevisionRequest {
    #[schema(example = "chefAlice")]
    pub username: Option<String>,
    pub biography: Option<String>,
    /// Base64 data URI of the new profile image.
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowersResponse {
    pub followers: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowingResponse {
    pub followed_cooks: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// App state for profile routes
#[derive(Clone)]
pub struct ProfilesState {
    pub service: Arc<ProfileService>,
    pub auth: AuthState,
}

impl ProfilesState {
    pub fn new(db: StorageBackend, images: Arc<dyn ImageHost>, auth: AuthState) -> Self {
        Self {
            service: Arc::new(ProfileService::new(db, images)),
            auth,
        }
    }
}

impl FromRef<ProfilesState> for AuthState {
    fn from_ref(input: &ProfilesState) -> Self {
        input.auth.clone()
    }
}

/// Create profile routes
pub fn routes(state: ProfilesState) -> Router {
    Router::new()
        .route(
            "/profile/:profile_id",
            get(get_profile).patch(edit_profile).delete(delete_profile),
        )
        .route("/profile/:profile_id/followers", get(list_followers))
        .route("/profile/:profile_id/following", get(list_following))
        .route("/profile/:profile_id/recipes", get(list_recipes))
        .route(
            "/profile/:profile_id/favorite-recipes",
            get(list_favorite_recipes),
        )
        .route("/profile/:profile_id/comments", get(list_comments))
        .route(
            "/profile/:profile_id/follow",
            post(follow_user).delete(unfollow_user),
        )
        .with_state(state)
}

/// GET /profile/{profile_id} - Profile page
#[utoipa::path(
    get,
    path = "/api/v1/profile/{profile_id}",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile found", body = ProfileView),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn get_profile(
    State(state): State<ProfilesState>,
    user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<ProfileView>> {
    let profile_id = parse_id(&profile_id)?;
    Ok(Json(state.service.get(user.id, profile_id).await?))
}

/// PATCH /profile/{profile_id} - Edit the caller's own profile
#[utoipa::path(
    patch,
    path = "/api/v1/profile/{profile_id}",
    params(("profile_id" = String, Path, description = "User ID")),
    request_body = ProfileRevisionRequest,
    responses(
        (status = 200, description = "Profile edited", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not the caller's profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn edit_profile(
    State(state): State<ProfilesState>,
    user: AuthUser,
    Path(profile_id): Path<String>,
    ApiJson(req): ApiJson<ProfileRevisionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let profile_id = parse_id(&profile_id)?;
    state.service.edit(user.id, profile_id, req).await?;
    Ok(Json(MessageResponse::new("Profile has been edited")))
}

/// DELETE /profile/{profile_id} - Delete the caller's own profile and everything it authored
#[utoipa::path(
    delete,
    path = "/api/v1/profile/{profile_id}",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile deleted", body = MessageResponse),
        (status = 403, description = "Not the caller's profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn delete_profile(
    State(state): State<ProfilesState>,
    user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let profile_id = parse_id(&profile_id)?;
    state.service.delete(user.id, profile_id).await?;
    Ok(Json(MessageResponse::new("Profile has been deleted")))
}

/// GET /profile/{profile_id}/followers - Users following this user
#[utoipa::path(
    get,
    path = "/api/v1/profile/{profile_id}/followers",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Followers", body = FollowersResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn list_followers(
    State(state): State<ProfilesState>,
    _user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<FollowersResponse>> {
    let profile_id = parse_id(&profile_id)?;
    let followers = state.service.followers(profile_id).await?;
    let message = followers
        .is_empty()
        .then(|| "This user has no followers".to_string());
    Ok(Json(FollowersResponse { followers, message }))
}

/// GET /profile/{profile_id}/following - Users this user follows
#[utoipa::path(
    get,
    path = "/api/v1/profile/{profile_id}/following",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Followed cooks", body = FollowingResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn list_following(
    State(state): State<ProfilesState>,
    _user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<FollowingResponse>> {
    let profile_id = parse_id(&profile_id)?;
    let followed_cooks = state.service.following(profile_id).await?;
    let message = followed_cooks
        .is_empty()
        .then(|| "This user isn't following anyone".to_string());
    Ok(Json(FollowingResponse {
        followed_cooks,
        message,
    }))
}

/// GET /profile/{profile_id}/recipes - Recipes created by this user
#[utoipa::path(
    get,
    path = "/api/v1/profile/{profile_id}/recipes",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Recipes", body = ListResponse<RecipeCard>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn list_recipes(
    State(state): State<ProfilesState>,
    _user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<ListResponse<RecipeCard>>> {
    let profile_id = parse_id(&profile_id)?;
    Ok(Json(state.service.recipes(profile_id).await?.into()))
}

/// GET /profile/{profile_id}/favorite-recipes - Recipes this user favorited
#[utoipa::path(
    get,
    path = "/api/v1/profile/{profile_id}/favorite-recipes",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Favorite recipes", body = ListResponse<RecipeCard>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn list_favorite_recipes(
    State(state): State<ProfilesState>,
    _user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<ListResponse<RecipeCard>>> {
    let profile_id = parse_id(&profile_id)?;
    Ok(Json(state.service.favorite_recipes(profile_id).await?.into()))
}

/// GET /profile/{profile_id}/comments - Comments written by this user
#[utoipa::path(
    get,
    path = "/api/v1/profile/{profile_id}/comments",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Comments", body = ListResponse<CommentView>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn list_comments(
    State(state): State<ProfilesState>,
    _user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<ListResponse<CommentView>>> {
    let profile_id = parse_id(&profile_id)?;
    Ok(Json(state.service.comments(profile_id).await?.into()))
}

/// POST /profile/{profile_id}/follow - Follow this user
#[utoipa::path(
    post,
    path = "/api/v1/profile/{profile_id}/follow",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Followed", body = MessageResponse),
        (status = 400, description = "Already following", body = ErrorResponse),
        (status = 403, description = "Cannot follow yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn follow_user(
    State(state): State<ProfilesState>,
    user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let profile_id = parse_id(&profile_id)?;
    state.service.follow(user.id, profile_id).await?;
    Ok(Json(MessageResponse::new("You followed this user")))
}

/// DELETE /profile/{profile_id}/follow - Unfollow this user
#[utoipa::path(
    delete,
    path = "/api/v1/profile/{profile_id}/follow",
    params(("profile_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Unfollowed", body = MessageResponse),
        (status = 400, description = "Not following", body = ErrorResponse),
        (status = 403, description = "Cannot unfollow yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "profiles"
)]
pub async fn unfollow_user(
    State(state): State<ProfilesState>,
    user: AuthUser,
    Path(profile_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let profile_id = parse_id(&profile_id)?;
    state.service.unfollow(user.id, profile_id).await?;
    Ok(Json(MessageResponse::new("You have unfollowed this user")))
}
