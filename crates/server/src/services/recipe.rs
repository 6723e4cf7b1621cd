// Recipe service
// Decision: Images are uploaded before the row is written; a failed write deletes the upload
// Decision: A replaced or deleted image is removed from the host only after the write succeeds

use std::sync::Arc;

use spicescape_core::{guards, AppError, ImageRef, Recipe, Result};
use uuid::Uuid;

use super::comment::comment_views;
use super::graph::{GraphCoordinator, RECIPE_NOT_FOUND, USER_NOT_FOUND};
use crate::api::common::UserSummary;
use crate::api::recipes::{RecipeCard, RecipeDetail, RecipeRequest};
use crate::api::validation::{validate_recipe, RecipeForm};
use crate::images::{delete_in_background, ImageHost, RECIPE_FOLDER};
use crate::storage::{CreateRecipeRow, RecipeRow, StorageBackend, UpdateRecipe};

pub struct RecipeService {
    db: StorageBackend,
    graph: GraphCoordinator,
    images: Arc<dyn ImageHost>,
}

impl RecipeService {
    pub fn new(db: StorageBackend, images: Arc<dyn ImageHost>) -> Self {
        let graph = GraphCoordinator::new(db.clone());
        Self { db, graph, images }
    }

    /// All recipes, newest first, optionally filtered by title
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<RecipeCard>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let rows = self.db.list_recipes(search).await?;
        Ok(rows.iter().map(RecipeCard::from).collect())
    }

    /// Recipes by the cooks `user_id` follows, newest first
    pub async fn following_feed(&self, user_id: Uuid) -> Result<Vec<RecipeCard>> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
        if user.followed_cooks.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.db.list_recipes_by_creators(&user.followed_cooks).await?;
        Ok(rows.iter().map(RecipeCard::from).collect())
    }

    pub async fn create(&self, user_id: Uuid, form: RecipeForm) -> Result<RecipeRow> {
        let image = match &form.image {
            Some(data_uri) => ImageRef::from(self.images.upload(data_uri, RECIPE_FOLDER).await?),
            None => ImageRef::default_recipe(),
        };

        let result = self
            .graph
            .create_recipe(CreateRecipeRow {
                created_by: user_id,
                title: form.title,
                description: form.description,
                ingredients: form.ingredients,
                steps: form.steps,
                image: image.clone(),
            })
            .await;

        if result.is_err() {
            delete_in_background(self.images.clone(), image);
        }
        result
    }

    /// Recipe with its author, populated comments and whether the caller favorited it
    pub async fn get(&self, user_id: Uuid, recipe_id: Uuid) -> Result<RecipeDetail> {
        let recipe = self
            .db
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(RECIPE_NOT_FOUND))?;

        let author = self
            .db
            .get_user(recipe.created_by)
            .await?
            .as_ref()
            .map(UserSummary::from);
        let is_favorite = self
            .db
            .get_user(user_id)
            .await?
            .map(|u| u.favorite_recipes.contains(&recipe.id))
            .unwrap_or(false);
        let comments = self.db.get_comments_by_ids(&recipe.comments).await?;
        let comments = comment_views(&self.db, comments).await?;

        Ok(RecipeDetail {
            recipe: Recipe::from(recipe),
            author,
            comments,
            is_favorite,
        })
    }

    /// Replace the content of a recipe owned by `user_id`
    pub async fn edit(&self, user_id: Uuid, recipe_id: Uuid, req: RecipeRequest) -> Result<RecipeRow> {
        let recipe = self
            .db
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(RECIPE_NOT_FOUND))?;
        guards::ensure_owner(
            recipe.created_by,
            user_id,
            "You are not authorized to modify this recipe",
        )?;

        let form = req.validate()?;
        let new_image = match &form.image {
            Some(data_uri) => Some(ImageRef::from(
                self.images.upload(data_uri, RECIPE_FOLDER).await?,
            )),
            None => None,
        };

        let result = self
            .db
            .update_recipe(
                recipe.id,
                UpdateRecipe {
                    title: Some(form.title),
                    description: Some(form.description),
                    ingredients: Some(form.ingredients),
                    steps: Some(form.steps),
                    image: new_image.clone(),
                },
            )
            .await;

        match (result, new_image) {
            (Ok(Some(updated)), Some(_)) => {
                delete_in_background(self.images.clone(), recipe.image());
                Ok(updated)
            }
            (Ok(Some(updated)), None) => Ok(updated),
            (Ok(None), new_image) => {
                if let Some(image) = new_image {
                    delete_in_background(self.images.clone(), image);
                }
                Err(AppError::not_found(RECIPE_NOT_FOUND))
            }
            (Err(e), new_image) => {
                if let Some(image) = new_image {
                    delete_in_background(self.images.clone(), image);
                }
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, user_id: Uuid, recipe_id: Uuid) -> Result<()> {
        let recipe = self.graph.delete_recipe(user_id, recipe_id).await?;
        delete_in_background(self.images.clone(), recipe.image());
        Ok(())
    }

    pub async fn favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<()> {
        self.graph.favorite(user_id, recipe_id).await
    }

    pub async fn unfavorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<()> {
        self.graph.unfavorite(user_id, recipe_id).await
    }
}

impl RecipeRequest {
    pub fn validate(&self) -> Result<RecipeForm> {
        validate_recipe(
            self.recipe_title.as_deref(),
            self.recipe_description.as_deref(),
            self.recipe_ingredients.as_deref(),
            self.recipe_steps.as_deref(),
            self.recipe_image.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::InMemoryImageHost;
    use crate::storage::CreateUserRow;
    use spicescape_core::ErrorKind;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";
    const BODY: &str = "Cream the butter and sugar, beat in the eggs one at a time, \
        fold in flour and lemon zest, then bake for forty minutes.";

    struct Fixture {
        db: StorageBackend,
        host: Arc<InMemoryImageHost>,
        service: RecipeService,
    }

    fn fixture() -> Fixture {
        let db = StorageBackend::in_memory();
        let host = Arc::new(InMemoryImageHost::new());
        let service = RecipeService::new(db.clone(), host.clone());
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

    fn request(title: &str, image: Option<&str>) -> RecipeRequest {
        RecipeRequest {
            recipe_title: Some(title.to_string()),
            recipe_description: Some(BODY.to_string()),
            recipe_ingredients: Some(BODY.to_string()),
            recipe_steps: Some(BODY.to_string()),
            recipe_image: image.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_uses_default_image() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;

        let form = request("Lemon Cake", None).validate().unwrap();
        let recipe = f.service.create(alice, form).await.unwrap();

        assert!(recipe.image().is_default());
        assert!(f.host.is_empty());
        let owner = f.db.get_user(alice).await.unwrap().unwrap();
        assert_eq!(owner.recipes, vec![recipe.id]);
    }

    #[tokio::test]
    async fn test_edit_replaces_image() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;

        let form = request("Lemon Cake", Some(PIXEL)).validate().unwrap();
        let recipe = f.service.create(alice, form).await.unwrap();
        let first = recipe.image();
        assert!(f.host.contains(&first.public_id));

        let err = f
            .service
            .edit(bob, recipe.id, request("Stolen Cake", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let edited = f
            .service
            .edit(alice, recipe.id, request("Lemon Drizzle", Some(PIXEL)))
            .await
            .unwrap();
        assert_eq!(edited.title, "Lemon Drizzle");
        assert_ne!(edited.image_public_id, first.public_id);

        for _ in 0..10 {
            if !f.host.contains(&first.public_id) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!f.host.contains(&first.public_id));
        assert!(f.host.contains(&edited.image_public_id));
    }

    #[tokio::test]
    async fn test_edit_without_image_keeps_current() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;

        let form = request("Lemon Cake", Some(PIXEL)).validate().unwrap();
        let recipe = f.service.create(alice, form).await.unwrap();

        let edited = f
            .service
            .edit(alice, recipe.id, request("Lemon Drizzle", None))
            .await
            .unwrap();
        assert_eq!(edited.image(), recipe.image());
    }

    #[tokio::test]
    async fn test_detail_and_feeds() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;
        let bob = user(&f.db, "chefBob").await;

        let form = request("Lemon Cake", None).validate().unwrap();
        let recipe = f.service.create(alice, form).await.unwrap();

        let detail = f.service.get(bob, recipe.id).await.unwrap();
        assert!(!detail.is_favorite);
        assert_eq!(detail.author.unwrap().username, "chefAlice");

        f.service.favorite(bob, recipe.id).await.unwrap();
        assert!(f.service.get(bob, recipe.id).await.unwrap().is_favorite);

        assert!(f.service.following_feed(bob).await.unwrap().is_empty());
        GraphCoordinator::new(f.db.clone())
            .follow(bob, alice)
            .await
            .unwrap();
        let feed = f.service.following_feed(bob).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].recipe_id, recipe.id);

        assert_eq!(f.service.list(Some("lemon")).await.unwrap().len(), 1);
        assert!(f.service.list(Some("pie")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_image() {
        let f = fixture();
        let alice = user(&f.db, "chefAlice").await;

        let form = request("Lemon Cake", Some(PIXEL)).validate().unwrap();
        let recipe = f.service.create(alice, form).await.unwrap();

        f.service.delete(alice, recipe.id).await.unwrap();
        for _ in 0..10 {
            if f.host.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(f.host.is_empty());
        let err = f.service.get(alice, recipe.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
