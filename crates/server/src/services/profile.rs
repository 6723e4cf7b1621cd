// Profile service
// Decision: Profile lists are read by id from the user's own lists, so their order is insertion order
// Decision: Deleting a profile also revokes every refresh token the user holds

use std::sync::Arc;

use spicescape_core::{guards, AppError, ImageRef, Result};
use uuid::Uuid;

use super::comment::comment_views;
use super::graph::{DeletedUser, GraphCoordinator, PROFILE_NOT_FOUND, USER_NOT_FOUND};
use crate::api::comments::CommentView;
use crate::api::common::UserSummary;
use crate::api::profiles::{ProfileDetails, ProfileRevisionRequest, ProfileView};
use crate::api::recipes::RecipeCard;
use crate::api::validation::validate_profile_revision;
use crate::images::{delete_in_background, ImageHost, PROFILE_FOLDER};
use crate::storage::{StorageBackend, UpdateUser, UserRow};

pub struct ProfileService {
    db: StorageBackend,
    graph: GraphCoordinator,
    images: Arc<dyn ImageHost>,
}

impl ProfileService {
    pub fn new(db: StorageBackend, images: Arc<dyn ImageHost>) -> Self {
        let graph = GraphCoordinator::new(db.clone());
        Self { db, graph, images }
    }

    async fn load(&self, profile_id: Uuid, not_found: &str) -> Result<UserRow> {
        self.db
            .get_user(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found(not_found))
    }

    /// Public profile page as seen by `user_id`
    pub async fn get(&self, user_id: Uuid, profile_id: Uuid) -> Result<ProfileView> {
        let user = self.load(profile_id, PROFILE_NOT_FOUND).await?;

        let recipes = self.db.get_recipes_by_ids(&user.recipes).await?;
        let comments = self.db.get_comments_by_ids(&user.comments).await?;
        let comments = comment_views(&self.db, comments).await?;

        Ok(ProfileView {
            user: ProfileDetails {
                username: user.username.clone(),
                profile_image: user.profile_image_url.clone(),
                biography: user.biography.clone(),
                follower_count: user.followers.len(),
                following_count: user.followed_cooks.len(),
            },
            recipes: recipes.iter().map(RecipeCard::from).collect(),
            comments,
            is_following: user.followers.contains(&user_id),
        })
    }

    /// Replace username, biography and profile image of the caller's own profile
    pub async fn edit(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
        req: ProfileRevisionRequest,
    ) -> Result<UserRow> {
        let user = self.load(profile_id, PROFILE_NOT_FOUND).await?;
        guards::ensure_owner(
            user.id,
            user_id,
            "You are not authorized to modify this profile",
        )?;

        let revision = validate_profile_revision(
            req.username.as_deref(),
            req.biography.as_deref(),
            req.profile_image.as_deref(),
        )?;
        let image = ImageRef::from(
            self.images
                .upload(&revision.profile_image, PROFILE_FOLDER)
                .await?,
        );

        let updated = self
            .db
            .update_user(
                user.id,
                UpdateUser {
                    username: Some(revision.username),
                    biography: Some(revision.biography),
                    profile_image: Some(image.clone()),
                    ..Default::default()
                },
            )
            .await;

        match updated {
            Ok(Some(row)) => {
                delete_in_background(self.images.clone(), user.profile_image());
                tracing::debug!(user_id = %row.id, "Profile edited");
                Ok(row)
            }
            Ok(None) => {
                delete_in_background(self.images.clone(), image);
                Err(AppError::not_found(PROFILE_NOT_FOUND))
            }
            Err(e) => {
                delete_in_background(self.images.clone(), image);
                Err(e.into())
            }
        }
    }

    /// Delete the caller's own profile with its content, edges, tokens and images
    pub async fn delete(&self, user_id: Uuid, profile_id: Uuid) -> Result<()> {
        let DeletedUser { user, recipes } = self.graph.delete_user(user_id, profile_id).await?;

        let revoked = self.db.delete_user_refresh_tokens(user.id).await?;
        tracing::debug!(user_id = %user.id, revoked, "Revoked refresh tokens");

        delete_in_background(self.images.clone(), user.profile_image());
        for recipe in &recipes {
            delete_in_background(self.images.clone(), recipe.image());
        }
        Ok(())
    }

    pub async fn followers(&self, profile_id: Uuid) -> Result<Vec<UserSummary>> {
        let user = self.load(profile_id, USER_NOT_FOUND).await?;
        let rows = self.db.get_users_by_ids(&user.followers).await?;
        Ok(rows.iter().map(UserSummary::from).collect())
    }

    pub async fn following(&self, profile_id: Uuid) -> Result<Vec<UserSummary>> {
        let user = self.load(profile_id, USER_NOT_FOUND).await?;
        let rows = self.db.get_users_by_ids(&user.followed_cooks).await?;
        Ok(rows.iter().map(UserSummary::from).collect())
    }

    pub async fn recipes(&self, profile_id: Uuid) -> Result<Vec<RecipeCard>> {
        let user = self.load(profile_id, USER_NOT_FOUND).await?;
        let rows = self.db.get_recipes_by_ids(&user.recipes).await?;
        Ok(rows.iter().map(RecipeCard::from).collect())
    }

    pub async fn favorite_recipes(&self, profile_id: Uuid) -> Result<Vec<RecipeCard>> {
        let user = self.load(profile_id, USER_NOT_FOUND).await?;
        let rows = self.db.get_recipes_by_ids(&user.favorite_recipes).await?;
        Ok(rows.iter().map(RecipeCard::from).collect())
    }

    pub async fn comments(&self, profile_id: Uuid) -> Result<Vec<CommentView>> {
        let user = self.load(profile_id, USER_NOT_FOUND).await?;
        let rows = self.db.get_comments_by_ids(&user.comments).await?;
        comment_views(&self.db, rows).await
    }

    pub async fn follow(&self, user_id: Uuid, profile_id: Uuid) -> Result<()> {
        self.graph.follow(user_id, profile_id).await
    }

    pub async fn unfollow(&self, user_id: Uuid, profile_id: Uuid) -> Result<()> {
        self.graph.unfollow(user_id, profile_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ImageHost, InMemoryImageHost, RECIPE_FOLDER};
    use crate::storage::{CreateRecipeRow, CreateRefreshTokenRow, CreateUserRow};
    use chrono::{Duration, Utc};
    use spicescape_core::ErrorKind;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";
    const BIO: &str = "Home cook from Lisbon who loves baking bread, cakes and pies.";

    struct Fixture {
        db: StorageBackend,
        host: Arc<InMemoryImageHost>,
        service: ProfileService,
    }

    fn fixture() -> Fixture {
        let db = StorageBackend::in_memory();
        let host = Arc::new(InMemoryImageHost::new());
        let service = ProfileService::new(db.clone(), host.clone());
        Fixture { db, host, service }
    }

    async fn user(db: &StorageBackend, name: &str) -> Uuid {
        db.create_user(CreateUserRow {
            username: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "$argon2id$fake".to_string(),
            profile_image: ImageRef::default_profile(),
            biography: "bio".to_string(),
        })
        .await
        .unwrap()
        .id
    }

    fn revision(username: &str) -> ProfileRevisionRequest {
        ProfileRevisionRequest {
            username: Some(username.to_string()),
            biography: Some(BIO.to_string()),
            profile_image: Some(PIXEL.to_string()),
        }
    }

    async fn settle(host: &InMemoryImageHost, expected: usize) {
        for _ in 0..10 {
            if host.len() == expected {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_get_profile_view() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;
        f.service.follow(bob, alice).await.unwrap();

        let view = f.service.get(bob, alice).await.unwrap();
        assert_eq!(view.user.username, "chefAlice");
        assert_eq!(view.user.follower_count, 1);
        assert_eq!(view.user.following_count, 0);
        assert!(view.is_following);

        let view = f.service.get(alice, bob).await.unwrap();
        assert!(!view.is_following);

        let err = f.service.get(alice, Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err, AppError::not_found("This user does not exist."));
    }

    #[tokio::test]
    async fn test_edit_profile() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;

        let err = f
            .service
            .edit(bob, alice, revision("chefMallory"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let mut bad = revision("chefAlice2");
        bad.biography = Some("too short".to_string());
        let err = f.service.edit(alice, alice, bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let first = f.service.edit(alice, alice, revision("chefAlice2")).await.unwrap();
        assert_eq!(first.username, "chefAlice2");
        assert!(f.host.contains(&first.profile_image_public_id));

        // The previous upload is removed once replaced
        let second = f.service.edit(alice, alice, revision("chefAlice3")).await.unwrap();
        settle(&f.host, 1).await;
        assert!(!f.host.contains(&first.profile_image_public_id));
        assert!(f.host.contains(&second.profile_image_public_id));
    }

    #[tokio::test]
    async fn test_delete_profile() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;
        f.service.edit(alice, alice, revision("chefAlice")).await.unwrap();
        f.service.follow(bob, alice).await.unwrap();
        GraphCoordinator::new(f.db.clone())
            .create_recipe(CreateRecipeRow {
                created_by: alice,
                title: "Lemon Cake".to_string(),
                description: "d".to_string(),
                ingredients: "i".to_string(),
                steps: "s".to_string(),
                image: ImageRef::default_recipe(),
            })
            .await
            .unwrap();
        f.db.create_refresh_token(CreateRefreshTokenRow {
            user_id: alice,
            token_hash: "hash".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();

        let err = f.service.delete(bob, alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        f.service.delete(alice, alice).await.unwrap();
        settle(&f.host, 0).await;

        assert!(f.db.get_user(alice).await.unwrap().is_none());
        assert!(f.db.list_recipes(None).await.unwrap().is_empty());
        assert!(f.db.get_refresh_token_by_hash("hash").await.unwrap().is_none());
        assert!(f.service.following(bob).await.unwrap().is_empty());
        assert!(f.host.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_delete_keeps_recipe_images() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;
        let uploaded = f.host.upload(PIXEL, RECIPE_FOLDER).await.unwrap();
        let public_id = uploaded.public_id.clone();
        GraphCoordinator::new(f.db.clone())
            .create_recipe(CreateRecipeRow {
                created_by: alice,
                title: "Lemon Cake".to_string(),
                description: "d".to_string(),
                ingredients: "i".to_string(),
                steps: "s".to_string(),
                image: ImageRef::from(uploaded),
            })
            .await
            .unwrap();

        let err = f.service.delete(bob, alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(f.host.contains(&public_id));
        assert_eq!(f.db.list_recipes(None).await.unwrap().len(), 1);

        f.service.delete(alice, alice).await.unwrap();
        settle(&f.host, 0).await;
        assert!(!f.host.contains(&public_id));
    }

    #[tokio::test]
    async fn test_lists() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;
        f.service.follow(bob, alice).await.unwrap();

        let followers = f.service.followers(alice).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, bob);
        assert_eq!(f.service.following(bob).await.unwrap()[0].username, "chefAlice");
        assert!(f.service.recipes(alice).await.unwrap().is_empty());
        assert!(f.service.favorite_recipes(bob).await.unwrap().is_empty());
        assert!(f.service.comments(bob).await.unwrap().is_empty());

        let err = f.service.followers(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err, AppError::not_found("This user does not exist"));
    }
}
