// Repository layer for database operations
// Decision: Relationship lists are uuid[] columns updated with array_append/array_remove,
// so every push or pull is a single-row atomic write
// Decision: Column names for list updates come from UserList, never from request input

use anyhow::Result;
use spicescape_core::{AppError, UserList};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

const USER_COLUMNS: &str = "id, username, email, password_hash, profile_image_url, \
     profile_image_public_id, biography, recipes, favorite_recipes, comments, \
     followed_cooks, followers, created_at, updated_at";

const RECIPE_COLUMNS: &str = "id, created_by, title, description, ingredients, steps, \
     image_url, image_public_id, comments, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, parent_post, made_by, text, created_at, updated_at";

/// Translate a unique constraint violation into a duplicate-value error
fn map_unique_violation(err: sqlx::Error, field: &str) -> anyhow::Error {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::duplicate(field).into();
        }
    }
    err.into()
}

/// Escape LIKE wildcards so a search term matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL and apply pending migrations
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, profile_image_url, profile_image_public_id, biography)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.profile_image.url)
            .bind(&input.profile_image.public_id)
            .bind(&input.biography)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "email"))?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserRow>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY array_position($1, id)"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        let (image_url, image_public_id) = match input.profile_image {
            Some(image) => (Some(image.url), Some(image.public_id)),
            None => (None, None),
        };
        let sql = format!(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                biography = COALESCE($3, biography),
                profile_image_url = COALESCE($4, profile_image_url),
                profile_image_public_id = COALESCE($5, profile_image_public_id),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&input.username)
            .bind(&input.biography)
            .bind(&image_url)
            .bind(&image_public_id)
            .bind(&input.password_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn push_user_list(&self, user_id: Uuid, list: UserList, value: Uuid) -> Result<bool> {
        let column = list.as_str();
        let sql = format!(
            "UPDATE users SET {column} = array_append({column}, $2), updated_at = NOW() WHERE id = $1"
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn pull_user_list(&self, user_id: Uuid, list: UserList, value: Uuid) -> Result<bool> {
        let column = list.as_str();
        let sql = format!(
            "UPDATE users SET {column} = array_remove({column}, $2), updated_at = NOW() WHERE id = $1"
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn pull_from_all_users(&self, list: UserList, value: Uuid) -> Result<u64> {
        let column = list.as_str();
        let sql = format!(
            r#"
            UPDATE users
            SET {column} = array_remove({column}, $1), updated_at = NOW()
            WHERE $1 = ANY({column})
            "#
        );
        let result = sqlx::query(&sql).bind(value).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    // ============================================
    // Recipes
    // ============================================

    pub async fn create_recipe(&self, input: CreateRecipeRow) -> Result<RecipeRow> {
        let sql = format!(
            r#"
            INSERT INTO recipes (id, created_by, title, description, ingredients, steps, image_url, image_public_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RECIPE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(input.created_by)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.ingredients)
            .bind(&input.steps)
            .bind(&input.image.url)
            .bind(&input.image.public_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<Option<RecipeRow>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1");
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeRow>> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ANY($1) ORDER BY array_position($1, id)"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<RecipeRow>> {
        let rows = match search.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let sql = format!(
                    r#"
                    SELECT {RECIPE_COLUMNS} FROM recipes
                    WHERE title ILIKE $1
                    ORDER BY created_at DESC, id DESC
                    "#
                );
                sqlx::query_as::<_, RecipeRow>(&sql)
                    .bind(like_pattern(query))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC, id DESC"
                );
                sqlx::query_as::<_, RecipeRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }

    pub async fn list_recipes_by_creators(&self, creators: &[Uuid]) -> Result<Vec<RecipeRow>> {
        let sql = format!(
            r#"
            SELECT {RECIPE_COLUMNS} FROM recipes
            WHERE created_by = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(creators)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn update_recipe(&self, id: Uuid, input: UpdateRecipe) -> Result<Option<RecipeRow>> {
        let (image_url, image_public_id) = match input.image {
            Some(image) => (Some(image.url), Some(image.public_id)),
            None => (None, None),
        };
        let sql = format!(
            r#"
            UPDATE recipes
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                ingredients = COALESCE($4, ingredients),
                steps = COALESCE($5, steps),
                image_url = COALESCE($6, image_url),
                image_public_id = COALESCE($7, image_public_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.ingredients)
            .bind(&input.steps)
            .bind(&image_url)
            .bind(&image_public_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn delete_recipe(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn push_recipe_comment(&self, recipe_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE recipes SET comments = array_append(comments, $2) WHERE id = $1",
        )
        .bind(recipe_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn pull_recipe_comment(&self, recipe_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE recipes SET comments = array_remove(comments, $2) WHERE id = $1",
        )
        .bind(recipe_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Comments
    // ============================================

    pub async fn create_comment(&self, input: CreateCommentRow) -> Result<CommentRow> {
        let sql = format!(
            r#"
            INSERT INTO comments (id, parent_post, made_by, text)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(input.parent_post)
            .bind(input.made_by)
            .bind(&input.text)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Option<CommentRow>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_comments_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CommentRow>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ANY($1) ORDER BY array_position($1, id)"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_comments(&self) -> Result<Vec<CommentRow>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_comments_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<CommentRow>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_post = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_comments_by_author(&self, user_id: Uuid) -> Result<Vec<CommentRow>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE made_by = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn update_comment(&self, id: Uuid, text: String) -> Result<Option<CommentRow>> {
        let sql = format!(
            r#"
            UPDATE comments SET text = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .bind(&text)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Refresh Tokens
    // ============================================

    pub async fn create_refresh_token(
        &self,
        input: CreateRefreshTokenRow,
    ) -> Result<RefreshTokenRow> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.token_hash)
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRow>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_refresh_token(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_user_refresh_tokens(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_expired_refresh_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("pie"), "%pie%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
