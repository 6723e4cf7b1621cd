// Recipe HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spicescape_core::{parse_id, Recipe};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::comments::CommentView;
use super::common::{ErrorResponse, ListResponse, MessageResponse, UserSummary};
use super::error::{ApiJson, ApiResult};
use crate::auth::middleware::{AuthState, AuthUser, FromRef};
use crate::images::ImageHost;
use crate::services::RecipeService;
use crate::storage::{RecipeRow, StorageBackend};

/// Recipe as shown in feeds and profile lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCard {
    pub recipe_id: Uuid,
    pub recipe_title: String,
    /// URL of the recipe image.
    pub recipe_image: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&RecipeRow> for RecipeCard {
    fn from(row: &RecipeRow) -> Self {
        Self {
            recipe_id: row.id,
            recipe_title: row.title.clone(),
            recipe_image: row.image_url.clone(),
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Single recipe with populated comments
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    pub recipe: Recipe,
    /// Creator of the recipe; absent only while the graph awaits repair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,
    pub comments: Vec<CommentView>,
    /// Whether the caller has favorited this recipe.
    pub is_favorite: bool,
}

/// Request to create or edit a recipe. Edits replace every text field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[schema(example = "Lemon Drizzle Cake")]
    pub recipe_title: Option<String>,
    pub recipe_description: Option<String>,
    pub recipe_ingredients: Option<String>,
    pub recipe_steps: Option<String>,
    /// Base64 data URI. Omit to keep the current (or default) image.
    pub recipe_image: Option<String>,
}

/// Response for a newly created recipe
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCreatedResponse {
    pub message: String,
    pub recipe_id: Uuid,
}

/// Query parameters for listing recipes
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListRecipesQuery {
    /// Case-insensitive match on the recipe title
    #[serde(default)]
    pub search: Option<String>,
}

/// App state for recipe routes
#[derive(Clone)]
pub struct RecipesState {
    pub service: Arc<RecipeService>,
    pub auth: AuthState,
}

impl RecipesState {
    pub fn new(db: StorageBackend, images: Arc<dyn ImageHost>, auth: AuthState) -> Self {
        Self {
            service: Arc::new(RecipeService::new(db, images)),
            auth,
        }
    }
}

impl FromRef<RecipesState> for AuthState {
    fn from_ref(input: &RecipesState) -> Self {
        input.auth.clone()
    }
}

/// Create recipe routes
pub fn routes(state: RecipesState) -> Router {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/following-feed", get(following_feed))
        .route(
            "/recipes/:recipe_id",
            get(get_recipe).patch(edit_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/:recipe_id/favorite",
            post(favorite_recipe).delete(unfavorite_recipe),
        )
        .with_state(state)
}

/// GET /recipes - All recipes, newest first
#[utoipa::path(
    get,
    path = "/api/v1/recipes",
    params(ListRecipesQuery),
    responses(
        (status = 200, description = "List of recipes", body = ListResponse<RecipeCard>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn list_recipes(
    State(state): State<RecipesState>,
    _user: AuthUser,
    Query(query): Query<ListRecipesQuery>,
) -> ApiResult<Json<ListResponse<RecipeCard>>> {
    let recipes = state.service.list(query.search.as_deref()).await?;
    Ok(Json(ListResponse::new(recipes)))
}

/// GET /recipes/following-feed - Recipes by cooks the caller follows
#[utoipa::path(
    get,
    path = "/api/v1/recipes/following-feed",
    responses(
        (status = 200, description = "Recipes by followed cooks", body = ListResponse<RecipeCard>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn following_feed(
    State(state): State<RecipesState>,
    user: AuthUser,
) -> ApiResult<Json<ListResponse<RecipeCard>>> {
    let recipes = state.service.following_feed(user.id).await?;
    Ok(Json(ListResponse::new(recipes)))
}

/// POST /recipes - Publish a recipe
#[utoipa::path(
    post,
    path = "/api/v1/recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeCreatedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn create_recipe(
    State(state): State<RecipesState>,
    user: AuthUser,
    ApiJson(req): ApiJson<RecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeCreatedResponse>)> {
    let form = req.validate()?;
    let recipe = state.service.create(user.id, form).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecipeCreatedResponse {
            message: "Recipe has been created".to_string(),
            recipe_id: recipe.id,
        }),
    ))
}

/// GET /recipes/{recipe_id} - Recipe detail
#[utoipa::path(
    get,
    path = "/api/v1/recipes/{recipe_id}",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe found", body = RecipeDetail),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn get_recipe(
    State(state): State<RecipesState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe_id = parse_id(&recipe_id)?;
    Ok(Json(state.service.get(user.id, recipe_id).await?))
}

/// PATCH /recipes/{recipe_id} - Edit a recipe (creator only)
#[utoipa::path(
    patch,
    path = "/api/v1/recipes/{recipe_id}",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe edited", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn edit_recipe(
    State(state): State<RecipesState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
    ApiJson(req): ApiJson<RecipeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let recipe_id = parse_id(&recipe_id)?;
    state.service.edit(user.id, recipe_id, req).await?;
    Ok(Json(MessageResponse::new("Recipe has been edited")))
}

/// DELETE /recipes/{recipe_id} - Delete a recipe and its comments (creator only)
#[utoipa::path(
    delete,
    path = "/api/v1/recipes/{recipe_id}",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe deleted", body = MessageResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn delete_recipe(
    State(state): State<RecipesState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let recipe_id = parse_id(&recipe_id)?;
    state.service.delete(user.id, recipe_id).await?;
    Ok(Json(MessageResponse::new("Recipe has been deleted")))
}

/// POST /recipes/{recipe_id}/favorite - Add to the caller's favorites
#[utoipa::path(
    post,
    path = "/api/v1/recipes/{recipe_id}/favorite",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe favorited", body = MessageResponse),
        (status = 400, description = "Already favorited", body = ErrorResponse),
        (status = 403, description = "Caller created the recipe", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn favorite_recipe(
    State(state): State<RecipesState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let recipe_id = parse_id(&recipe_id)?;
    state.service.favorite(user.id, recipe_id).await?;
    Ok(Json(MessageResponse::new("You favorited this recipe")))
}

/// DELETE /recipes/{recipe_id}/favorite - Remove from the caller's favorites
#[utoipa::path(
    delete,
    path = "/api/v1/recipes/{recipe_id}/favorite",
    params(("recipe_id" = String, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe unfavorited", body = MessageResponse),
        (status = 400, description = "Not favorited", body = ErrorResponse),
        (status = 403, description = "Caller created the recipe", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "recipes"
)]
pub async fn unfavorite_recipe(
    State(state): State<RecipesState>,
    user: AuthUser,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let recipe_id = parse_id(&recipe_id)?;
    state.service.unfavorite(user.id, recipe_id).await?;
    Ok(Json(MessageResponse::new("You unfavorited this recipe")))
}
