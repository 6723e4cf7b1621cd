// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use spicescape_core::{Comment, ImageRef, Recipe, User};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Users
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image_url: String,
    pub profile_image_public_id: String,
    pub biography: String,
    pub recipes: Vec<Uuid>,
    pub favorite_recipes: Vec<Uuid>,
    pub comments: Vec<Uuid>,
    pub followed_cooks: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn profile_image(&self) -> ImageRef {
        ImageRef::new(&self.profile_image_url, &self.profile_image_public_id)
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let profile_image = row.profile_image();
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            profile_image,
            biography: row.biography,
            recipes: row.recipes,
            favorite_recipes: row.favorite_recipes,
            comments: row.comments,
            followed_cooks: row.followed_cooks,
            followers: row.followers,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image: ImageRef,
    pub biography: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub biography: Option<String>,
    pub profile_image: Option<ImageRef>,
    pub password_hash: Option<String>,
}

// ============================================
// Recipes
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub steps: String,
    pub image_url: String,
    pub image_public_id: String,
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeRow {
    pub fn image(&self) -> ImageRef {
        ImageRef::new(&self.image_url, &self.image_public_id)
    }
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        let recipe_image = row.image();
        Recipe {
            id: row.id,
            created_by: row.created_by,
            recipe_title: row.title,
            recipe_description: row.description,
            recipe_ingredients: row.ingredients,
            recipe_steps: row.steps,
            recipe_image,
            comments: row.comments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateRecipeRow {
    pub created_by: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub steps: String,
    pub image: ImageRef,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub steps: Option<String>,
    pub image: Option<ImageRef>,
}

// ============================================
// Comments
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub parent_post: Uuid,
    pub made_by: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            parent_post: row.parent_post,
            made_by: row.made_by,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCommentRow {
    pub parent_post: Uuid,
    pub made_by: Uuid,
    pub text: String,
}

// ============================================
// Refresh Tokens
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRefreshTokenRow {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
