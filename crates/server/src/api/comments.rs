// Comment HTTP routes
// Decision: Comments are listed and created under their recipe, then addressed by their own id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spicescape_core::parse_id;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ErrorResponse, ListResponse, MessageResponse, UserSummary};
use super::error::{ApiJson, ApiResult};
use super::validation::validate_comment_text;
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::services::CommentService;
use crate::storage::{CommentRow, StorageBackend};

/// Comment with its author
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub comment_id: Uuid,
    /// Recipe the comment was posted on.
    pub recipe_id: Uuid,
    pub text: String,
    pub made_by: UserSummary,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(row: CommentRow, author: UserSummary) -> Self {
        Self {
            comment_id: row.id,
            recipe_id: row.parent_post,
            text: row.text,
            made_by: author,
            created_at: row.created_at,
        }
    }
}

/// Request to create or edit a comment
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CommentRequest {
    #[schema(example = "Made this tonight, the lemon zest really shines!")]
    pub text: Option<String>,
}

/// Response for a newly created comment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreatedResponse {
    pub message: String,
    pub comment_id: Uuid,
}

/// App state for comment routes
#[derive(Clone)]
pub struct CommentsState {
    pub service: Arc<CommentService>,
    pub auth: AuthState,
}

impl CommentsState {
    pub fn new(db: StorageBackend, auth: AuthState) -> Self {
        Self {
            service: Arc::new(CommentService::new(db)),
            auth,
        }
    }
}

impl FromRef<CommentsState> for AuthState {
    fn from_ref(input: &CommentsState) -> Self {
        input.auth.clone()
    }
}

/// Create comment routes
pub fn routes(state: CommentsState) -> Router {
    Router::new()
        .route(
            "/recipes/:recipe_id/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/comments/:comment_id",
            get(get_comment).patch(edit_comment).delete(delete_comment),
        )
        .with_state(state)
}

/// GET /recipes/{recipe_id}/comments - Comments on a recipe, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/recipes/{recipe_id}/comments",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Comments on the recipe", body = ListResponse<CommentView>),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "comments"
)]
pub async fn list_comments(
    State(state): State<CommentsState>,
    _user: AuthUser,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<ListResponse<CommentView>>> {
    let recipe_id = parse_id(&recipe_id)?;
    let comments = state.service.list_for_recipe(recipe_id).await?;
    Ok(Json(ListResponse::new(comments)))
}

/// POST /recipes/{recipe_id}/comments - Comment on a recipe
#[utoipa::path(
    post,
    path = "/api/v1/recipes/{recipe_id}/comments",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentCreatedResponse),
        (status = 400, description = "Invalid comment text", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "comments"
)]
pub async fn create_comment(
    State(state): State<CommentsState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentCreatedResponse>)> {
    let recipe_id = parse_id(&recipe_id)?;
    let text = validate_comment_text(req.text.as_deref())?;
    let comment = state.service.create(user.id, recipe_id, text).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentCreatedResponse {
            message: "Comment has been created".to_string(),
            comment_id: comment.id,
        }),
    ))
}

/// GET /comments/{comment_id} - Get a single comment
#[utoipa::path(
    get,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment found", body = CommentView),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "comments"
)]
pub async fn get_comment(
    State(state): State<CommentsState>,
    _user: AuthUser,
    Path(comment_id): Path<String>,
) -> ApiResult<Json<CommentView>> {
    let comment_id = parse_id(&comment_id)?;
    Ok(Json(state.service.get(comment_id).await?))
}

/// PATCH /comments/{comment_id} - Edit a comment (author only)
#[utoipa::path(
    patch,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment edited", body = MessageResponse),
        (status = 400, description = "Invalid comment text", body = ErrorResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "comments"
)]
pub async fn edit_comment(
    State(state): State<CommentsState>,
    user: AuthUser,
    Path(comment_id): Path<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let comment_id = parse_id(&comment_id)?;
    state.service.edit(user.id, comment_id, req).await?;
    Ok(Json(MessageResponse::new("Comment has been edited")))
}

/// DELETE /comments/{comment_id} - Delete a comment (author only)
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<CommentsState>,
    user: AuthUser,
    Path(comment_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let comment_id = parse_id(&comment_id)?;
    state.service.delete(user.id, comment_id).await?;
    Ok(Json(MessageResponse::new("Comment has been deleted")))
}
