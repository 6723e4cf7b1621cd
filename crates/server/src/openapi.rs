// OpenAPI specification generation
//
// This module defines the OpenAPI spec for the SpiceScape API.
// It can be used by both the API server (for Swagger UI)
// and the export-openapi binary (for static spec generation).

use crate::api;
use crate::api::{ErrorResponse, ListResponse, MessageResponse};
use crate::auth::routes as auth;
use spicescape_core::{Comment, ImageRef, Recipe, User};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer scheme referenced by authenticated paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation for the SpiceScape API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::refresh,
        auth::logout,
        api::profiles::get_profile,
        api::profiles::edit_profile,
        api::profiles::delete_profile,
        api::profiles::list_followers,
        api::profiles::list_following,
        api::profiles::list_recipes,
        api::profiles::list_favorite_recipes,
        api::profiles::list_comments,
        api::profiles::follow_user,
        api::profiles::unfollow_user,
        api::recipes::list_recipes,
        api::recipes::following_feed,
        api::recipes::create_recipe,
        api::recipes::get_recipe,
        api::recipes::edit_recipe,
        api::recipes::delete_recipe,
        api::recipes::favorite_recipe,
        api::recipes::unfavorite_recipe,
        api::comments::list_comments,
        api::comments::create_comment,
        api::comments::get_comment,
        api::comments::edit_comment,
        api::comments::delete_comment,
    ),
    components(
        schemas(
            User, Recipe, Comment, ImageRef,
            ErrorResponse, MessageResponse,
            api::common::UserSummary,
            // Auth
            auth::RegisterRequest, auth::LoginRequest, auth::LoginUser,
            auth::LoginResponse, auth::AccessTokenResponse,
            // Profiles
            api::profiles::ProfileDetails, api::profiles::ProfileView,
            api::profiles::ProfileRevisionRequest,
            api::profiles::FollowersResponse, api::profiles::FollowingResponse,
            // Recipes
            api::recipes::RecipeCard, api::recipes::RecipeDetail,
            api::recipes::RecipeRequest, api::recipes::RecipeCreatedResponse,
            api::recipes::ListRecipesQuery,
            ListResponse<api::recipes::RecipeCard>,
            // Comments
            api::comments::CommentView, api::comments::CommentRequest,
            api::comments::CommentCreatedResponse,
            ListResponse<api::comments::CommentView>,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and token rotation"),
        (name = "profiles", description = "Profiles and the follow graph"),
        (name = "recipes", description = "Recipes and favorites"),
        (name = "comments", description = "Comments on recipes")
    ),
    info(
        title = "SpiceScape API",
        version = "0.1.0",
        description = "API for sharing recipes, commenting, following cooks and favoriting recipes",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> String {
        Self::openapi()
            .to_pretty_json()
            .expect("Failed to serialize OpenAPI spec")
    }
}
