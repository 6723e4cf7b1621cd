// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use spicescape_core::UserList;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Short name reported by the health endpoint
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::InMemory(_) => "memory",
        }
    }

    /// Get the PostgreSQL pool if using PostgreSQL backend
    /// Returns None for in-memory backend
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(db) => Some(db.pool()),
            Self::InMemory(_) => None,
        }
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user(id).await,
            Self::InMemory(db) => db.get_user(id).await,
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_email(email).await,
            Self::InMemory(db) => db.get_user_by_email(email).await,
        }
    }

    pub async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_users_by_ids(ids).await,
            Self::InMemory(db) => db.get_users_by_ids(ids).await,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.list_users().await,
            Self::InMemory(db) => db.list_users().await,
        }
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.update_user(id, input).await,
            Self::InMemory(db) => db.update_user(id, input).await,
        }
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_user(id).await,
            Self::InMemory(db) => db.delete_user(id).await,
        }
    }

    // ============================================
    // User relationship lists
    // ============================================

    pub async fn push_user_list(&self, user_id: Uuid, list: UserList, value: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.push_user_list(user_id, list, value).await,
            Self::InMemory(db) => db.push_user_list(user_id, list, value).await,
        }
    }

    pub async fn pull_user_list(&self, user_id: Uuid, list: UserList, value: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.pull_user_list(user_id, list, value).await,
            Self::InMemory(db) => db.pull_user_list(user_id, list, value).await,
        }
    }

    pub async fn pull_from_all_users(&self, list: UserList, value: Uuid) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.pull_from_all_users(list, value).await,
            Self::InMemory(db) => db.pull_from_all_users(list, value).await,
        }
    }

    // ============================================
    // Recipes
    // ============================================

    pub async fn create_recipe(&self, input: CreateRecipeRow) -> Result<RecipeRow> {
        match self {
            Self::Postgres(db) => db.create_recipe(input).await,
            Self::InMemory(db) => db.create_recipe(input).await,
        }
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<Option<RecipeRow>> {
        match self {
            Self::Postgres(db) => db.get_recipe(id).await,
            Self::InMemory(db) => db.get_recipe(id).await,
        }
    }

    pub async fn get_recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeRow>> {
        match self {
            Self::Postgres(db) => db.get_recipes_by_ids(ids).await,
            Self::InMemory(db) => db.get_recipes_by_ids(ids).await,
        }
    }

    pub async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<RecipeRow>> {
        match self {
            Self::Postgres(db) => db.list_recipes(search).await,
            Self::InMemory(db) => db.list_recipes(search).await,
        }
    }

    pub async fn list_recipes_by_creators(&self, creators: &[Uuid]) -> Result<Vec<RecipeRow>> {
        match self {
            Self::Postgres(db) => db.list_recipes_by_creators(creators).await,
            Self::InMemory(db) => db.list_recipes_by_creators(creators).await,
        }
    }

    pub async fn update_recipe(&self, id: Uuid, input: UpdateRecipe) -> Result<Option<RecipeRow>> {
        match self {
            Self::Postgres(db) => db.update_recipe(id, input).await,
            Self::InMemory(db) => db.update_recipe(id, input).await,
        }
    }

    pub async fn delete_recipe(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_recipe(id).await,
            Self::InMemory(db) => db.delete_recipe(id).await,
        }
    }

    pub async fn push_recipe_comment(&self, recipe_id: Uuid, comment_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.push_recipe_comment(recipe_id, comment_id).await,
            Self::InMemory(db) => db.push_recipe_comment(recipe_id, comment_id).await,
        }
    }

    pub async fn pull_recipe_comment(&self, recipe_id: Uuid, comment_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.pull_recipe_comment(recipe_id, comment_id).await,
            Self::InMemory(db) => db.pull_recipe_comment(recipe_id, comment_id).await,
        }
    }

    // ============================================
    // Comments
    // ============================================

    pub async fn create_comment(&self, input: CreateCommentRow) -> Result<CommentRow> {
        match self {
            Self::Postgres(db) => db.create_comment(input).await,
            Self::InMemory(db) => db.create_comment(input).await,
        }
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Option<CommentRow>> {
        match self {
            Self::Postgres(db) => db.get_comment(id).await,
            Self::InMemory(db) => db.get_comment(id).await,
        }
    }

    pub async fn get_comments_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CommentRow>> {
        match self {
            Self::Postgres(db) => db.get_comments_by_ids(ids).await,
            Self::InMemory(db) => db.get_comments_by_ids(ids).await,
        }
    }

    pub async fn list_comments(&self) -> Result<Vec<CommentRow>> {
        match self {
            Self::Postgres(db) => db.list_comments().await,
            Self::InMemory(db) => db.list_comments().await,
        }
    }

    pub async fn list_comments_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<CommentRow>> {
        match self {
            Self::Postgres(db) => db.list_comments_for_recipe(recipe_id).await,
            Self::InMemory(db) => db.list_comments_for_recipe(recipe_id).await,
        }
    }

    pub async fn list_comments_by_author(&self, user_id: Uuid) -> Result<Vec<CommentRow>> {
        match self {
            Self::Postgres(db) => db.list_comments_by_author(user_id).await,
            Self::InMemory(db) => db.list_comments_by_author(user_id).await,
        }
    }

    pub async fn update_comment(&self, id: Uuid, text: String) -> Result<Option<CommentRow>> {
        match self {
            Self::Postgres(db) => db.update_comment(id, text).await,
            Self::InMemory(db) => db.update_comment(id, text).await,
        }
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_comment(id).await,
            Self::InMemory(db) => db.delete_comment(id).await,
        }
    }

    // ============================================
    // Refresh Tokens
    // ============================================

    pub async fn create_refresh_token(
        &self,
        input: CreateRefreshTokenRow,
    ) -> Result<RefreshTokenRow> {
        match self {
            Self::Postgres(db) => db.create_refresh_token(input).await,
            Self::InMemory(db) => db.create_refresh_token(input).await,
        }
    }

    pub async fn get_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRow>> {
        match self {
            Self::Postgres(db) => db.get_refresh_token_by_hash(token_hash).await,
            Self::InMemory(db) => db.get_refresh_token_by_hash(token_hash).await,
        }
    }

    pub async fn delete_refresh_token(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_refresh_token(id).await,
            Self::InMemory(db) => db.delete_refresh_token(id).await,
        }
    }

    pub async fn delete_user_refresh_tokens(&self, user_id: Uuid) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_user_refresh_tokens(user_id).await,
            Self::InMemory(db) => db.delete_user_refresh_tokens(user_id).await,
        }
    }

    pub async fn delete_expired_refresh_tokens(&self) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_expired_refresh_tokens().await,
            Self::InMemory(db) => db.delete_expired_refresh_tokens().await,
        }
    }
}
