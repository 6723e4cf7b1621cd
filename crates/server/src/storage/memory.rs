// In-memory storage implementation for dev mode and tests
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation mirrors the PostgreSQL repository API with HashMaps, so
// the server runs without a database. Each method takes one lock for one
// collection, matching the single-document write granularity of the real store.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use spicescape_core::{AppError, UserList};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, UserRow>>,
    recipes: RwLock<HashMap<Uuid, RecipeRow>>,
    comments: RwLock<HashMap<Uuid, CommentRow>>,
    refresh_tokens: RwLock<HashMap<Uuid, RefreshTokenRow>>,
    #[cfg(test)]
    fail_points: parking_lot::Mutex<std::collections::HashSet<String>>,
    #[cfg(test)]
    writes: parking_lot::Mutex<Vec<String>>,
}

fn user_list_mut(user: &mut UserRow, list: UserList) -> &mut Vec<Uuid> {
    match list {
        UserList::Recipes => &mut user.recipes,
        UserList::FavoriteRecipes => &mut user.favorite_recipes,
        UserList::Comments => &mut user.comments,
        UserList::FollowedCooks => &mut user.followed_cooks,
        UserList::Followers => &mut user.followers,
    }
}

/// Return rows in the order of `ids`, skipping ids with no row
fn collect_in_order<T: Clone>(map: &HashMap<Uuid, T>, ids: &[Uuid]) -> Vec<T> {
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Make the named write fail until cleared. Keys look like
    /// `push_user_list:followers` or `create_comment`.
    #[cfg(test)]
    pub(crate) fn inject_failure(&self, key: &str) {
        self.fail_points.lock().insert(key.to_string());
    }

    #[cfg(test)]
    pub(crate) fn clear_failures(&self) {
        self.fail_points.lock().clear();
    }

    /// Number of attempted writes recorded under `key`
    #[cfg(test)]
    pub(crate) fn write_count(&self, key: &str) -> usize {
        self.writes.lock().iter().filter(|k| k.as_str() == key).count()
    }

    #[cfg(test)]
    fn fail_point(&self, key: &str) -> Result<()> {
        self.writes.lock().push(key.to_string());
        if self.fail_points.lock().contains(key) {
            anyhow::bail!("injected failure at {}", key);
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn fail_point(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        self.fail_point("create_user")?;
        let mut users = self.users.write();
        if users.values().any(|u| u.email == input.email) {
            return Err(AppError::duplicate("email").into());
        }

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = UserRow {
            id,
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            profile_image_url: input.profile_image.url,
            profile_image_public_id: input.profile_image.public_id,
            biography: input.biography,
            recipes: Vec::new(),
            favorite_recipes: Vec::new(),
            comments: Vec::new(),
            followed_cooks: Vec::new(),
            followers: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        Ok(self.users.read().get(&id).cloned())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    pub async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserRow>> {
        Ok(collect_in_order(&self.users.read(), ids))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let mut result: Vec<_> = self.users.read().values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        self.fail_point("update_user")?;
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(&id) {
            if let Some(username) = input.username {
                user.username = username;
            }
            if let Some(biography) = input.biography {
                user.biography = biography;
            }
            if let Some(image) = input.profile_image {
                user.profile_image_url = image.url;
                user.profile_image_public_id = image.public_id;
            }
            if let Some(password_hash) = input.password_hash {
                user.password_hash = password_hash;
            }
            user.updated_at = Self::now();
            return Ok(Some(user.clone()));
        }
        Ok(None)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        self.fail_point("delete_user")?;
        Ok(self.users.write().remove(&id).is_some())
    }

    /// Append `value` to one of a user's lists. Returns false if the user is missing.
    pub async fn push_user_list(&self, user_id: Uuid, list: UserList, value: Uuid) -> Result<bool> {
        self.fail_point(&format!("push_user_list:{}", list))?;
        let mut users = self.users.write();
        match users.get_mut(&user_id) {
            Some(user) => {
                user_list_mut(user, list).push(value);
                user.updated_at = Self::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every occurrence of `value` from one of a user's lists.
    /// Returns false if the user is missing.
    pub async fn pull_user_list(&self, user_id: Uuid, list: UserList, value: Uuid) -> Result<bool> {
        self.fail_point(&format!("pull_user_list:{}", list))?;
        let mut users = self.users.write();
        match users.get_mut(&user_id) {
            Some(user) => {
                user_list_mut(user, list).retain(|v| *v != value);
                user.updated_at = Self::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove `value` from the given list of every user. Returns how many users changed.
    pub async fn pull_from_all_users(&self, list: UserList, value: Uuid) -> Result<u64> {
        self.fail_point(&format!("pull_from_all_users:{}", list))?;
        let now = Self::now();
        let mut modified = 0;
        for user in self.users.write().values_mut() {
            let entries = user_list_mut(user, list);
            let before = entries.len();
            entries.retain(|v| *v != value);
            if entries.len() != before {
                user.updated_at = now;
                modified += 1;
            }
        }
        Ok(modified)
    }

    // ============================================
    // Recipes
    // ============================================

    pub async fn create_recipe(&self, input: CreateRecipeRow) -> Result<RecipeRow> {
        self.fail_point("create_recipe")?;
        let now = Self::now();
        let id = Uuid::now_v7();
        let row = RecipeRow {
            id,
            created_by: input.created_by,
            title: input.title,
            description: input.description,
            ingredients: input.ingredients,
            steps: input.steps,
            image_url: input.image.url,
            image_public_id: input.image.public_id,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.recipes.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<Option<RecipeRow>> {
        Ok(self.recipes.read().get(&id).cloned())
    }

    pub async fn get_recipes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeRow>> {
        Ok(collect_in_order(&self.recipes.read(), ids))
    }

    pub async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<RecipeRow>> {
        let recipes = self.recipes.read();
        let mut result: Vec<_> = match search {
            Some(query) if !query.trim().is_empty() => {
                let pattern = query.trim().to_lowercase();
                recipes
                    .values()
                    .filter(|r| r.title.to_lowercase().contains(&pattern))
                    .cloned()
                    .collect()
            }
            _ => recipes.values().cloned().collect(),
        };
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    pub async fn list_recipes_by_creators(&self, creators: &[Uuid]) -> Result<Vec<RecipeRow>> {
        let mut result: Vec<_> = self
            .recipes
            .read()
            .values()
            .filter(|r| creators.contains(&r.created_by))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    pub async fn update_recipe(&self, id: Uuid, input: UpdateRecipe) -> Result<Option<RecipeRow>> {
        self.fail_point("update_recipe")?;
        let mut recipes = self.recipes.write();
        if let Some(recipe) = recipes.get_mut(&id) {
            if let Some(title) = input.title {
                recipe.title = title;
            }
            if let Some(description) = input.description {
                recipe.description = description;
            }
            if let Some(ingredients) = input.ingredients {
                recipe.ingredients = ingredients;
            }
            if let Some(steps) = input.steps {
                recipe.steps = steps;
            }
            if let Some(image) = input.image {
                recipe.image_url = image.url;
                recipe.image_public_id = image.public_id;
            }
            recipe.updated_at = Self::now();
            return Ok(Some(recipe.clone()));
        }
        Ok(None)
    }

    pub async fn delete_recipe(&self, id: Uuid) -> Result<bool> {
        self.fail_point("delete_recipe")?;
        Ok(self.recipes.write().remove(&id).is_some())
    }

    pub async fn push_recipe_comment(&self, recipe_id: Uuid, comment_id: Uuid) -> Result<bool> {
        self.fail_point("push_recipe_comment")?;
        let mut recipes = self.recipes.write();
        match recipes.get_mut(&recipe_id) {
            Some(recipe) => {
                recipe.comments.push(comment_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn pull_recipe_comment(&self, recipe_id: Uuid, comment_id: Uuid) -> Result<bool> {
        self.fail_point("pull_recipe_comment")?;
        let mut recipes = self.recipes.write();
        match recipes.get_mut(&recipe_id) {
            Some(recipe) => {
                recipe.comments.retain(|c| *c != comment_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ============================================
    // Comments
    // ============================================

    pub async fn create_comment(&self, input: CreateCommentRow) -> Result<CommentRow> {
        self.fail_point("create_comment")?;
        let now = Self::now();
        let id = Uuid::now_v7();
        let row = CommentRow {
            id,
            parent_post: input.parent_post,
            made_by: input.made_by,
            text: input.text,
            created_at: now,
            updated_at: now,
        };
        self.comments.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Option<CommentRow>> {
        Ok(self.comments.read().get(&id).cloned())
    }

    pub async fn get_comments_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CommentRow>> {
        Ok(collect_in_order(&self.comments.read(), ids))
    }

    pub async fn list_comments(&self) -> Result<Vec<CommentRow>> {
        let mut result: Vec<_> = self.comments.read().values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    pub async fn list_comments_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<CommentRow>> {
        let mut result: Vec<_> = self
            .comments
            .read()
            .values()
            .filter(|c| c.parent_post == recipe_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    pub async fn list_comments_by_author(&self, user_id: Uuid) -> Result<Vec<CommentRow>> {
        let mut result: Vec<_> = self
            .comments
            .read()
            .values()
            .filter(|c| c.made_by == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    pub async fn update_comment(&self, id: Uuid, text: String) -> Result<Option<CommentRow>> {
        self.fail_point("update_comment")?;
        let mut comments = self.comments.write();
        if let Some(comment) = comments.get_mut(&id) {
            comment.text = text;
            comment.updated_at = Self::now();
            return Ok(Some(comment.clone()));
        }
        Ok(None)
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        self.fail_point("delete_comment")?;
        Ok(self.comments.write().remove(&id).is_some())
    }

    // ============================================
    // Refresh Tokens
    // ============================================

    pub async fn create_refresh_token(
        &self,
        input: CreateRefreshTokenRow,
    ) -> Result<RefreshTokenRow> {
        let id = Uuid::now_v7();
        let row = RefreshTokenRow {
            id,
            user_id: input.user_id,
            token_hash: input.token_hash,
            expires_at: input.expires_at,
            created_at: Self::now(),
        };
        self.refresh_tokens.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRow>> {
        Ok(self
            .refresh_tokens
            .read()
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    pub async fn delete_refresh_token(&self, id: Uuid) -> Result<bool> {
        Ok(self.refresh_tokens.write().remove(&id).is_some())
    }

    pub async fn delete_user_refresh_tokens(&self, user_id: Uuid) -> Result<u64> {
        let mut tokens = self.refresh_tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    pub async fn delete_expired_refresh_tokens(&self) -> Result<u64> {
        let now = Self::now();
        let mut tokens = self.refresh_tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > now);
        Ok((before - tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicescape_core::ImageRef;

    fn new_user(email: &str) -> CreateUserRow {
        CreateUserRow {
            username: "chefAlice".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            profile_image: ImageRef::default_profile(),
            biography: "bio".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = InMemoryDatabase::new();
        db.create_user(new_user("alice@example.com")).await.unwrap();

        let err = db
            .create_user(new_user("alice@example.com"))
            .await
            .unwrap_err();
        let app_err: AppError = err.into();
        assert_eq!(app_err, AppError::duplicate("email"));
    }

    #[tokio::test]
    async fn test_push_and_pull_user_list() {
        let db = InMemoryDatabase::new();
        let user = db.create_user(new_user("a@example.com")).await.unwrap();
        let value = Uuid::now_v7();

        assert!(db
            .push_user_list(user.id, UserList::FavoriteRecipes, value)
            .await
            .unwrap());
        let row = db.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(row.favorite_recipes, vec![value]);

        assert!(db
            .pull_user_list(user.id, UserList::FavoriteRecipes, value)
            .await
            .unwrap());
        let row = db.get_user(user.id).await.unwrap().unwrap();
        assert!(row.favorite_recipes.is_empty());

        // Missing user reports no match
        assert!(!db
            .push_user_list(Uuid::now_v7(), UserList::Recipes, value)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_pull_from_all_users() {
        let db = InMemoryDatabase::new();
        let a = db.create_user(new_user("a@example.com")).await.unwrap();
        let b = db.create_user(new_user("b@example.com")).await.unwrap();
        let c = db.create_user(new_user("c@example.com")).await.unwrap();

        db.push_user_list(a.id, UserList::Followers, c.id).await.unwrap();
        db.push_user_list(b.id, UserList::Followers, c.id).await.unwrap();

        let modified = db
            .pull_from_all_users(UserList::Followers, c.id)
            .await
            .unwrap();
        assert_eq!(modified, 2);
        assert!(db.get_user(a.id).await.unwrap().unwrap().followers.is_empty());
        assert!(db.get_user(b.id).await.unwrap().unwrap().followers.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_ids_preserves_order_and_skips_missing() {
        let db = InMemoryDatabase::new();
        let a = db.create_user(new_user("a@example.com")).await.unwrap();
        let b = db.create_user(new_user("b@example.com")).await.unwrap();

        let rows = db
            .get_users_by_ids(&[b.id, Uuid::now_v7(), a.id])
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_expired_refresh_tokens_purged() {
        let db = InMemoryDatabase::new();
        let user_id = Uuid::now_v7();
        db.create_refresh_token(CreateRefreshTokenRow {
            user_id,
            token_hash: "old".to_string(),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        })
        .await
        .unwrap();
        db.create_refresh_token(CreateRefreshTokenRow {
            user_id,
            token_hash: "fresh".to_string(),
            expires_at: Utc::now() + chrono::Duration::days(1),
        })
        .await
        .unwrap();

        assert_eq!(db.delete_expired_refresh_tokens().await.unwrap(), 1);
        assert!(db.get_refresh_token_by_hash("old").await.unwrap().is_none());
        assert!(db.get_refresh_token_by_hash("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let db = InMemoryDatabase::new();
        let user = db.create_user(new_user("a@example.com")).await.unwrap();
        db.inject_failure("push_user_list:followers");

        assert!(db
            .push_user_list(user.id, UserList::Followers, Uuid::now_v7())
            .await
            .is_err());
        // Other lists are unaffected
        assert!(db
            .push_user_list(user.id, UserList::FollowedCooks, Uuid::now_v7())
            .await
            .is_ok());

        db.clear_failures();
        assert!(db
            .push_user_list(user.id, UserList::Followers, Uuid::now_v7())
            .await
            .is_ok());
    }
}
