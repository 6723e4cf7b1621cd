// Graph coordinator: every write that touches more than one document
// Decision: No transactions. Each mutation is a short ordered sequence of single-row writes.
// Decision: Guards and existence checks run before the first write
// Decision: When a later write fails, earlier writes are undone in reverse order (best effort)
// Decision: Deletes pull references first and remove the entity last, so a failure part-way
// never leaves a dangling id
//
// `reconcile` repairs whatever a crash between two writes (or a failed compensation)
// left behind. It is idempotent: a second run on a repaired graph changes nothing.

use std::collections::HashSet;
use std::future::Future;

use spicescape_core::{guards, AppError, Result, UserList};
use uuid::Uuid;

use crate::storage::{
    CommentRow, CreateCommentRow, CreateRecipeRow, RecipeRow, StorageBackend, UserRow,
};

pub const USER_NOT_FOUND: &str = "This user does not exist";
/// Profile routes report a missing profile with a trailing period
pub const PROFILE_NOT_FOUND: &str = "This user does not exist.";
pub const RECIPE_NOT_FOUND: &str = "This recipe does not exist.";
pub const COMMENT_NOT_FOUND: &str = "The comment you are looking for does not exist.";

/// A write that reverses one already applied
#[derive(Debug, Clone)]
enum Undo {
    PushUserList(Uuid, UserList, Uuid),
    PullUserList(Uuid, UserList, Uuid),
    PushRecipeComment(Uuid, Uuid),
    PullRecipeComment(Uuid, Uuid),
    DeleteRecipe(Uuid),
    DeleteComment(Uuid),
}

/// Records undo steps for one multi-write mutation
struct Compensation<'a> {
    db: &'a StorageBackend,
    operation: &'static str,
    undo: Vec<Undo>,
}

impl<'a> Compensation<'a> {
    fn new(db: &'a StorageBackend, operation: &'static str) -> Self {
        Self {
            db,
            operation,
            undo: Vec::new(),
        }
    }

    fn record(&mut self, undo: Undo) {
        self.undo.push(undo);
    }

    /// Await one write; on failure undo everything recorded so far
    async fn step<T>(&mut self, write: impl Future<Output = anyhow::Result<T>>) -> Result<T> {
        match write.await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(
                    operation = self.operation,
                    steps = self.undo.len(),
                    "Write failed, compensating: {:#}",
                    e
                );
                self.rollback().await;
                Err(e.into())
            }
        }
    }

    async fn rollback(&mut self) {
        while let Some(undo) = self.undo.pop() {
            let result = match &undo {
                Undo::PushUserList(user, list, value) => {
                    self.db.push_user_list(*user, *list, *value).await.map(|_| ())
                }
                Undo::PullUserList(user, list, value) => {
                    self.db.pull_user_list(*user, *list, *value).await.map(|_| ())
                }
                Undo::PushRecipeComment(recipe, comment) => {
                    self.db.push_recipe_comment(*recipe, *comment).await.map(|_| ())
                }
                Undo::PullRecipeComment(recipe, comment) => {
                    self.db.pull_recipe_comment(*recipe, *comment).await.map(|_| ())
                }
                Undo::DeleteRecipe(id) => self.db.delete_recipe(*id).await.map(|_| ()),
                Undo::DeleteComment(id) => self.db.delete_comment(*id).await.map(|_| ()),
            };
            if let Err(e) = result {
                tracing::error!(
                    operation = self.operation,
                    undo = ?undo,
                    "Compensating write failed, run reconcile to repair: {:#}",
                    e
                );
            }
        }
    }
}

/// Turn a "row matched" flag into an error when the row has disappeared
fn require(found: bool, message: &str) -> anyhow::Result<()> {
    if found {
        Ok(())
    } else {
        Err(AppError::not_found(message).into())
    }
}

/// Counts of repairs made by [`GraphCoordinator::reconcile`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Recipes whose creator no longer exists, deleted with their comments
    pub orphan_recipes_removed: u64,
    /// Comments whose recipe or author no longer exists
    pub orphan_comments_removed: u64,
    /// Ids pulled from user or recipe lists because the target is gone or mismatched
    pub dangling_references_removed: u64,
    /// Missing halves of follow edges added back
    pub follow_edges_mirrored: u64,
    /// Comment or recipe ids re-added to the list that should contain them
    pub references_relinked: u64,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// A removed account and the recipes removed with it
#[derive(Debug, Clone)]
pub struct DeletedUser {
    pub user: UserRow,
    pub recipes: Vec<RecipeRow>,
}

/// Coordinates multi-document writes across users, recipes and comments
#[derive(Clone)]
pub struct GraphCoordinator {
    db: StorageBackend,
}

impl GraphCoordinator {
    pub fn new(db: StorageBackend) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &StorageBackend {
        &self.db
    }

    async fn load_user(&self, id: Uuid) -> Result<UserRow> {
        self.db
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
    }

    async fn load_recipe(&self, id: Uuid) -> Result<RecipeRow> {
        self.db
            .get_recipe(id)
            .await?
            .ok_or_else(|| AppError::not_found(RECIPE_NOT_FOUND))
    }

    async fn load_comment(&self, id: Uuid) -> Result<CommentRow> {
        self.db
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND))
    }

    // ============================================
    // Recipes
    // ============================================

    /// Persist a recipe and link it into its creator's `recipes`
    pub async fn create_recipe(&self, input: CreateRecipeRow) -> Result<RecipeRow> {
        let creator = self.load_user(input.created_by).await?;
        let mut tx = Compensation::new(&self.db, "create_recipe");

        let recipe = tx.step(self.db.create_recipe(input)).await?;
        tx.record(Undo::DeleteRecipe(recipe.id));

        tx.step(async {
            let found = self
                .db
                .push_user_list(creator.id, UserList::Recipes, recipe.id)
                .await?;
            require(found, USER_NOT_FOUND)
        })
        .await?;

        tracing::debug!(recipe_id = %recipe.id, user_id = %creator.id, "Recipe created");
        Ok(recipe)
    }

    /// Delete a recipe owned by `user_id`, cascading to its comments and favorites
    pub async fn delete_recipe(&self, user_id: Uuid, recipe_id: Uuid) -> Result<RecipeRow> {
        let recipe = self.load_recipe(recipe_id).await?;
        guards::ensure_owner(
            recipe.created_by,
            user_id,
            "You are not authorized to modify this recipe",
        )?;

        self.remove_recipe(&recipe).await?;
        Ok(recipe)
    }

    /// Cascade for a recipe that is already authorized for deletion
    async fn remove_recipe(&self, recipe: &RecipeRow) -> Result<()> {
        // Comments are found by parent, not by the recipe's list, so unlinked ones go too
        for comment in self.db.list_comments_for_recipe(recipe.id).await? {
            self.remove_comment(&comment).await?;
        }

        let unfavorited = self
            .db
            .pull_from_all_users(UserList::FavoriteRecipes, recipe.id)
            .await?;

        let mut tx = Compensation::new(&self.db, "delete_recipe");
        let linked = tx
            .step(
                self.db
                    .pull_user_list(recipe.created_by, UserList::Recipes, recipe.id),
            )
            .await?;
        // Orphaned recipes have no owner row to restore into
        if linked {
            tx.record(Undo::PushUserList(
                recipe.created_by,
                UserList::Recipes,
                recipe.id,
            ));
        }

        tx.step(self.db.delete_recipe(recipe.id)).await?;

        tracing::debug!(
            recipe_id = %recipe.id,
            unfavorited,
            "Recipe deleted"
        );
        Ok(())
    }

    // ============================================
    // Comments
    // ============================================

    /// Persist a comment and link it into the recipe's and the author's `comments`
    pub async fn create_comment(&self, input: CreateCommentRow) -> Result<CommentRow> {
        let recipe = self.load_recipe(input.parent_post).await?;
        let author = self.load_user(input.made_by).await?;
        let mut tx = Compensation::new(&self.db, "create_comment");

        let comment = tx.step(self.db.create_comment(input)).await?;
        tx.record(Undo::DeleteComment(comment.id));

        tx.step(async {
            let found = self.db.push_recipe_comment(recipe.id, comment.id).await?;
            require(found, RECIPE_NOT_FOUND)
        })
        .await?;
        tx.record(Undo::PullRecipeComment(recipe.id, comment.id));

        tx.step(async {
            let found = self
                .db
                .push_user_list(author.id, UserList::Comments, comment.id)
                .await?;
            require(found, USER_NOT_FOUND)
        })
        .await?;

        tracing::debug!(comment_id = %comment.id, recipe_id = %recipe.id, "Comment created");
        Ok(comment)
    }

    /// Delete a comment written by `user_id`
    pub async fn delete_comment(&self, user_id: Uuid, comment_id: Uuid) -> Result<CommentRow> {
        let comment = self.load_comment(comment_id).await?;
        guards::ensure_owner(
            comment.made_by,
            user_id,
            "You are not authorized to modify this comment",
        )?;

        self.remove_comment(&comment).await?;
        Ok(comment)
    }

    async fn remove_comment(&self, comment: &CommentRow) -> Result<()> {
        let mut tx = Compensation::new(&self.db, "delete_comment");

        let linked = tx
            .step(self.db.pull_recipe_comment(comment.parent_post, comment.id))
            .await?;
        if linked {
            tx.record(Undo::PushRecipeComment(comment.parent_post, comment.id));
        }

        let linked = tx
            .step(
                self.db
                    .pull_user_list(comment.made_by, UserList::Comments, comment.id),
            )
            .await?;
        if linked {
            tx.record(Undo::PushUserList(
                comment.made_by,
                UserList::Comments,
                comment.id,
            ));
        }

        tx.step(self.db.delete_comment(comment.id)).await?;
        tracing::debug!(comment_id = %comment.id, "Comment deleted");
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    /// Delete the caller's own account with everything it authored and every edge to it
    pub async fn delete_user(&self, user_id: Uuid, profile_id: Uuid) -> Result<DeletedUser> {
        let user = self
            .db
            .get_user(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found(PROFILE_NOT_FOUND))?;
        guards::ensure_owner(
            user.id,
            user_id,
            "You are not authorized to modify this profile",
        )?;

        for comment in self.db.list_comments_by_author(user.id).await? {
            self.remove_comment(&comment).await?;
        }
        let recipes = self.db.list_recipes_by_creators(&[user.id]).await?;
        for recipe in &recipes {
            self.remove_recipe(recipe).await?;
        }

        let followers_pulled = self
            .db
            .pull_from_all_users(UserList::Followers, user.id)
            .await?;
        let following_pulled = self
            .db
            .pull_from_all_users(UserList::FollowedCooks, user.id)
            .await?;

        self.db.delete_user(user.id).await?;

        tracing::info!(
            user_id = %user.id,
            followers_pulled,
            following_pulled,
            "User deleted"
        );
        Ok(DeletedUser { user, recipes })
    }

    // ============================================
    // Follow graph
    // ============================================

    /// Add the edge caller -> target on both sides
    pub async fn follow(&self, user_id: Uuid, target_id: Uuid) -> Result<()> {
        let target = self.load_user(target_id).await?;
        guards::ensure_not_self(target.id, user_id, "You can't follow yourself!")?;
        if target.followers.contains(&user_id) {
            return Err(AppError::bad_request("You've already followed this user!"));
        }
        let caller = self.load_user(user_id).await?;

        let mut tx = Compensation::new(&self.db, "follow");
        tx.step(async {
            let found = self
                .db
                .push_user_list(target.id, UserList::Followers, caller.id)
                .await?;
            require(found, USER_NOT_FOUND)
        })
        .await?;
        tx.record(Undo::PullUserList(target.id, UserList::Followers, caller.id));

        tx.step(async {
            let found = self
                .db
                .push_user_list(caller.id, UserList::FollowedCooks, target.id)
                .await?;
            require(found, USER_NOT_FOUND)
        })
        .await?;

        tracing::debug!(user_id = %caller.id, target_id = %target.id, "Followed");
        Ok(())
    }

    /// Remove the edge caller -> target on both sides
    pub async fn unfollow(&self, user_id: Uuid, target_id: Uuid) -> Result<()> {
        let target = self.load_user(target_id).await?;
        guards::ensure_not_self(target.id, user_id, "You can't unfollow yourself!")?;
        if !target.followers.contains(&user_id) {
            return Err(AppError::bad_request("You're not following this user!"));
        }

        let mut tx = Compensation::new(&self.db, "unfollow");
        tx.step(
            self.db
                .pull_user_list(target.id, UserList::Followers, user_id),
        )
        .await?;
        tx.record(Undo::PushUserList(target.id, UserList::Followers, user_id));

        tx.step(
            self.db
                .pull_user_list(user_id, UserList::FollowedCooks, target.id),
        )
        .await?;

        tracing::debug!(user_id = %user_id, target_id = %target.id, "Unfollowed");
        Ok(())
    }

    // ============================================
    // Favorites
    // ============================================

    pub async fn favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<()> {
        let recipe = self.load_recipe(recipe_id).await?;
        guards::ensure_not_self(
            recipe.created_by,
            user_id,
            "You can't favorite your own recipe!",
        )?;
        let caller = self.load_user(user_id).await?;
        if caller.favorite_recipes.contains(&recipe.id) {
            return Err(AppError::bad_request(
                "You've already favorited this recipe!",
            ));
        }

        let found = self
            .db
            .push_user_list(caller.id, UserList::FavoriteRecipes, recipe.id)
            .await?;
        require(found, USER_NOT_FOUND)?;
        Ok(())
    }

    pub async fn unfavorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<()> {
        let recipe = self.load_recipe(recipe_id).await?;
        guards::ensure_not_self(
            recipe.created_by,
            user_id,
            "You can't unfavorite your own recipe!",
        )?;
        let caller = self.load_user(user_id).await?;
        if !caller.favorite_recipes.contains(&recipe.id) {
            return Err(AppError::bad_request(
                "You haven't favorited this recipe!",
            ));
        }

        self.db
            .pull_user_list(caller.id, UserList::FavoriteRecipes, recipe.id)
            .await?;
        Ok(())
    }

    // ============================================
    // Reconcile
    // ============================================

    /// Repair the graph after partial failures. Safe to run at any time.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        // Orphaned content first, so later phases see only live entities
        let user_ids: HashSet<Uuid> = self.db.list_users().await?.iter().map(|u| u.id).collect();
        for recipe in self.db.list_recipes(None).await? {
            if !user_ids.contains(&recipe.created_by) {
                self.remove_recipe(&recipe).await?;
                report.orphan_recipes_removed += 1;
            }
        }
        let recipe_ids: HashSet<Uuid> = self
            .db
            .list_recipes(None)
            .await?
            .iter()
            .map(|r| r.id)
            .collect();
        for comment in self.db.list_comments().await? {
            if !recipe_ids.contains(&comment.parent_post) || !user_ids.contains(&comment.made_by) {
                self.remove_comment(&comment).await?;
                report.orphan_comments_removed += 1;
            }
        }

        let users = self.db.list_users().await?;
        let recipes = self.db.list_recipes(None).await?;
        let comments = self.db.list_comments().await?;
        let comment_ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();

        // Dangling ids in user lists
        for user in &users {
            let lists = [
                (UserList::Recipes, &user.recipes, &recipe_ids),
                (UserList::FavoriteRecipes, &user.favorite_recipes, &recipe_ids),
                (UserList::Comments, &user.comments, &comment_ids),
                (UserList::FollowedCooks, &user.followed_cooks, &user_ids),
                (UserList::Followers, &user.followers, &user_ids),
            ];
            for (list, entries, live) in lists {
                let dangling: HashSet<&Uuid> =
                    entries.iter().filter(|id| !live.contains(*id)).collect();
                for id in dangling {
                    self.db.pull_user_list(user.id, list, *id).await?;
                    report.dangling_references_removed += 1;
                }
            }
        }

        // Dangling or mismatched ids in recipe comment lists
        for recipe in &recipes {
            let stale: HashSet<&Uuid> = recipe
                .comments
                .iter()
                .filter(|id| {
                    !comments
                        .iter()
                        .any(|c| c.id == **id && c.parent_post == recipe.id)
                })
                .collect();
            for id in stale {
                self.db.pull_recipe_comment(recipe.id, *id).await?;
                report.dangling_references_removed += 1;
            }
        }

        // Follow edge symmetry, judged on the live entries only
        for user in &users {
            for target in user.followed_cooks.iter().filter(|id| user_ids.contains(*id)) {
                let mirrored = users
                    .iter()
                    .find(|u| u.id == *target)
                    .map(|u| u.followers.contains(&user.id))
                    .unwrap_or(true);
                if !mirrored {
                    self.db
                        .push_user_list(*target, UserList::Followers, user.id)
                        .await?;
                    report.follow_edges_mirrored += 1;
                }
            }
            for follower in user.followers.iter().filter(|id| user_ids.contains(*id)) {
                let mirrored = users
                    .iter()
                    .find(|u| u.id == *follower)
                    .map(|u| u.followed_cooks.contains(&user.id))
                    .unwrap_or(true);
                if !mirrored {
                    self.db
                        .push_user_list(*follower, UserList::FollowedCooks, user.id)
                        .await?;
                    report.follow_edges_mirrored += 1;
                }
            }
        }

        // Content missing from the list that should reference it
        for recipe in &recipes {
            let owner_links = users
                .iter()
                .find(|u| u.id == recipe.created_by)
                .map(|u| u.recipes.contains(&recipe.id))
                .unwrap_or(true);
            if !owner_links {
                self.db
                    .push_user_list(recipe.created_by, UserList::Recipes, recipe.id)
                    .await?;
                report.references_relinked += 1;
            }
        }
        for comment in &comments {
            let recipe_links = recipes
                .iter()
                .find(|r| r.id == comment.parent_post)
                .map(|r| r.comments.contains(&comment.id))
                .unwrap_or(true);
            if !recipe_links {
                self.db
                    .push_recipe_comment(comment.parent_post, comment.id)
                    .await?;
                report.references_relinked += 1;
            }
            let author_links = users
                .iter()
                .find(|u| u.id == comment.made_by)
                .map(|u| u.comments.contains(&comment.id))
                .unwrap_or(true);
            if !author_links {
                self.db
                    .push_user_list(comment.made_by, UserList::Comments, comment.id)
                    .await?;
                report.references_relinked += 1;
            }
        }

        if report.is_clean() {
            tracing::debug!("Reconcile found nothing to repair");
        } else {
            tracing::info!(?report, "Reconcile repaired the graph");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CreateUserRow, InMemoryDatabase};
    use spicescape_core::{ErrorKind, ImageRef};
    use std::sync::Arc;

    struct Fixture {
        mem: Arc<InMemoryDatabase>,
        graph: GraphCoordinator,
    }

    fn fixture() -> Fixture {
        let mem = Arc::new(InMemoryDatabase::new());
        let graph = GraphCoordinator::new(StorageBackend::InMemory(mem.clone()));
        Fixture { mem, graph }
    }

    async fn user(f: &Fixture, name: &str) -> Uuid {
        f.graph
            .db()
            .create_user(CreateUserRow {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "$argon2id$fake".to_string(),
                profile_image: ImageRef::default_profile(),
                biography: "bio".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn recipe(f: &Fixture, owner: Uuid) -> Uuid {
        f.graph
            .create_recipe(CreateRecipeRow {
                created_by: owner,
                title: "Lemon Cake".to_string(),
                description: "d".to_string(),
                ingredients: "i".to_string(),
                steps: "s".to_string(),
                image: ImageRef::default_recipe(),
            })
            .await
            .unwrap()
            .id
    }

    async fn comment(f: &Fixture, recipe_id: Uuid, author: Uuid) -> Uuid {
        f.graph
            .create_comment(CreateCommentRow {
                parent_post: recipe_id,
                made_by: author,
                text: "Yummy!".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn load(f: &Fixture, id: Uuid) -> UserRow {
        f.graph.db().get_user(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_follow_and_unfollow_are_symmetric() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;

        f.graph.follow(bob, alice).await.unwrap();
        assert_eq!(load(&f, alice).await.followers, vec![bob]);
        assert_eq!(load(&f, bob).await.followed_cooks, vec![alice]);

        f.graph.unfollow(bob, alice).await.unwrap();
        assert!(load(&f, alice).await.followers.is_empty());
        assert!(load(&f, bob).await.followed_cooks.is_empty());
    }

    #[tokio::test]
    async fn test_follow_guards() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;

        let err = f.graph.follow(alice, alice).await.unwrap_err();
        assert_eq!(err, AppError::unauthorized("You can't follow yourself!"));

        f.graph.follow(bob, alice).await.unwrap();
        let err = f.graph.follow(bob, alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = f.graph.unfollow(alice, bob).await.unwrap_err();
        assert_eq!(err, AppError::bad_request("You're not following this user!"));

        let err = f.graph.follow(bob, Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_follow_compensates_on_second_write_failure() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;

        f.mem.inject_failure("push_user_list:followed_cooks");
        let err = f.graph.follow(bob, alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        // The first half of the edge was rolled back
        assert!(load(&f, alice).await.followers.is_empty());
        assert!(load(&f, bob).await.followed_cooks.is_empty());

        f.mem.clear_failures();
        f.graph.follow(bob, alice).await.unwrap();
        assert!(f.graph.reconcile().await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn test_favorite_guards_and_roundtrip() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;
        let cake = recipe(&f, alice).await;

        let err = f.graph.favorite(alice, cake).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let before = load(&f, bob).await.favorite_recipes;
        f.graph.favorite(bob, cake).await.unwrap();
        assert_eq!(load(&f, bob).await.favorite_recipes, vec![cake]);

        let err = f.graph.favorite(bob, cake).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        f.graph.unfavorite(bob, cake).await.unwrap();
        assert_eq!(load(&f, bob).await.favorite_recipes, before);

        let err = f.graph.unfavorite(bob, cake).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_create_recipe_compensates() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;

        f.mem.inject_failure("push_user_list:recipes");
        let result = f
            .graph
            .create_recipe(CreateRecipeRow {
                created_by: alice,
                title: "Lemon Cake".to_string(),
                description: "d".to_string(),
                ingredients: "i".to_string(),
                steps: "s".to_string(),
                image: ImageRef::default_recipe(),
            })
            .await;
        assert!(result.is_err());
        assert!(f.graph.db().list_recipes(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_links_and_unlinks() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;
        let cake = recipe(&f, alice).await;
        let c = comment(&f, cake, bob).await;

        let r = f.graph.db().get_recipe(cake).await.unwrap().unwrap();
        assert_eq!(r.comments, vec![c]);
        assert_eq!(load(&f, bob).await.comments, vec![c]);

        let err = f.graph.delete_comment(alice, c).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        f.graph.delete_comment(bob, c).await.unwrap();
        let r = f.graph.db().get_recipe(cake).await.unwrap().unwrap();
        assert!(r.comments.is_empty());
        assert!(load(&f, bob).await.comments.is_empty());
        assert!(f.graph.db().get_comment(c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_comment_compensates_both_writes() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let cake = recipe(&f, alice).await;

        f.mem.inject_failure("push_user_list:comments");
        let result = f
            .graph
            .create_comment(CreateCommentRow {
                parent_post: cake,
                made_by: alice,
                text: "Yummy!".to_string(),
            })
            .await;
        assert!(result.is_err());

        let r = f.graph.db().get_recipe(cake).await.unwrap().unwrap();
        assert!(r.comments.is_empty());
        assert!(f.graph.db().list_comments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_recipe_cascades() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;
        let cake = recipe(&f, alice).await;
        let c = comment(&f, cake, bob).await;
        f.graph.favorite(bob, cake).await.unwrap();

        let err = f.graph.delete_recipe(bob, cake).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        f.graph.delete_recipe(alice, cake).await.unwrap();
        assert!(load(&f, alice).await.recipes.is_empty());
        let bob_row = load(&f, bob).await;
        assert!(bob_row.comments.is_empty());
        assert!(bob_row.favorite_recipes.is_empty());
        assert!(f.graph.db().get_comment(c).await.unwrap().is_none());
        assert!(f.graph.reconcile().await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;
        let carol = user(&f, "chefCarol").await;

        let alice_cake = recipe(&f, alice).await;
        let bob_pie = recipe(&f, bob).await;
        comment(&f, bob_pie, alice).await;
        let bob_comment = comment(&f, alice_cake, bob).await;
        f.graph.follow(alice, bob).await.unwrap();
        f.graph.follow(carol, alice).await.unwrap();
        f.graph.favorite(carol, alice_cake).await.unwrap();

        let err = f.graph.delete_user(bob, alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let deleted = f.graph.delete_user(alice, alice).await.unwrap();
        assert_eq!(deleted.user.id, alice);
        let removed: Vec<Uuid> = deleted.recipes.iter().map(|r| r.id).collect();
        assert_eq!(removed, vec![alice_cake]);

        assert!(f.graph.db().get_user(alice).await.unwrap().is_none());
        assert!(f.graph.db().get_recipe(alice_cake).await.unwrap().is_none());
        assert!(f.graph.db().get_comment(bob_comment).await.unwrap().is_none());

        let bob_row = load(&f, bob).await;
        assert!(bob_row.followers.is_empty());
        assert!(bob_row.comments.is_empty());
        let pie = f.graph.db().get_recipe(bob_pie).await.unwrap().unwrap();
        assert!(pie.comments.is_empty());

        let carol_row = load(&f, carol).await;
        assert!(carol_row.followed_cooks.is_empty());
        assert!(carol_row.favorite_recipes.is_empty());

        assert!(f.graph.reconcile().await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn test_reconcile_repairs_and_is_idempotent() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;
        let cake = recipe(&f, alice).await;
        let db = f.graph.db();

        // Half an edge, a dangling favorite, and an unlinked comment
        db.push_user_list(bob, UserList::FollowedCooks, alice)
            .await
            .unwrap();
        db.push_user_list(bob, UserList::FavoriteRecipes, Uuid::now_v7())
            .await
            .unwrap();
        let loose = db
            .create_comment(CreateCommentRow {
                parent_post: cake,
                made_by: bob,
                text: "Yummy!".to_string(),
            })
            .await
            .unwrap();

        let report = f.graph.reconcile().await.unwrap();
        assert_eq!(report.follow_edges_mirrored, 1);
        assert_eq!(report.dangling_references_removed, 1);
        assert_eq!(report.references_relinked, 2);

        assert_eq!(load(&f, alice).await.followers, vec![bob]);
        assert!(load(&f, bob).await.favorite_recipes.is_empty());
        assert_eq!(load(&f, bob).await.comments, vec![loose.id]);
        let r = db.get_recipe(cake).await.unwrap().unwrap();
        assert_eq!(r.comments, vec![loose.id]);

        assert!(f.graph.reconcile().await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn test_orphan_recipe_rollback_skips_missing_owner() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let cake = recipe(&f, alice).await;
        f.graph.db().delete_user(alice).await.unwrap();
        let row = f.graph.db().get_recipe(cake).await.unwrap().unwrap();

        f.mem.inject_failure("delete_recipe");
        let err = f.graph.remove_recipe(&row).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        // The owner pull matched nothing, so nothing is pushed back
        assert_eq!(f.mem.write_count("push_user_list:recipes"), 0);
        assert!(f.graph.db().get_recipe(cake).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recipe_rollback_restores_owner_link() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let cake = recipe(&f, alice).await;

        f.mem.inject_failure("delete_recipe");
        let err = f.graph.delete_recipe(alice, cake).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(load(&f, alice).await.recipes, vec![cake]);
    }

    #[tokio::test]
    async fn test_reconcile_removes_orphans() {
        let f = fixture();
        let alice = user(&f, "chefAlice").await;
        let bob = user(&f, "chefBob").await;
        let cake = recipe(&f, alice).await;
        comment(&f, cake, bob).await;

        // Remove the owner directly, bypassing the cascade
        f.graph.db().delete_user(alice).await.unwrap();

        let report = f.graph.reconcile().await.unwrap();
        assert_eq!(report.orphan_recipes_removed, 1);
        assert!(f.graph.db().list_comments().await.unwrap().is_empty());
        assert!(load(&f, bob).await.comments.is_empty());
        assert!(f.graph.reconcile().await.unwrap().is_clean());
    }
}
