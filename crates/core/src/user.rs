// User domain types
//
// A user owns its profile fields and five id lists. `followed_cooks` and
// `followers` are the two halves of every follow edge and must stay mirrored
// across the graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::image::ImageRef;

/// Default biography for new users.
pub const DEFAULT_BIOGRAPHY: &str = "The backstory of this user is yet to be revealed.";

/// User - a registered cook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Unique email address used to log in.
    pub email: String,
    /// Profile image.
    pub profile_image: ImageRef,
    /// Free-form biography.
    pub biography: String,
    /// Recipes created by this user.
    #[serde(default)]
    pub recipes: Vec<Uuid>,
    /// Recipes this user has favorited.
    #[serde(default)]
    pub favorite_recipes: Vec<Uuid>,
    /// Comments written by this user.
    #[serde(default)]
    pub comments: Vec<Uuid>,
    /// Users this user follows.
    #[serde(default)]
    pub followed_cooks: Vec<Uuid>,
    /// Users following this user.
    #[serde(default)]
    pub followers: Vec<Uuid>,
    /// Timestamp when the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_following(&self, user_id: Uuid) -> bool {
        self.followed_cooks.contains(&user_id)
    }

    pub fn is_followed_by(&self, user_id: Uuid) -> bool {
        self.followers.contains(&user_id)
    }

    pub fn has_favorited(&self, recipe_id: Uuid) -> bool {
        self.favorite_recipes.contains(&recipe_id)
    }
}

/// The five relationship lists stored on a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserList {
    Recipes,
    FavoriteRecipes,
    Comments,
    FollowedCooks,
    Followers,
}

impl UserList {
    pub const ALL: [UserList; 5] = [
        UserList::Recipes,
        UserList::FavoriteRecipes,
        UserList::Comments,
        UserList::FollowedCooks,
        UserList::Followers,
    ];

    /// Storage column / field name
    pub fn as_str(&self) -> &'static str {
        match self {
            UserList::Recipes => "recipes",
            UserList::FavoriteRecipes => "favorite_recipes",
            UserList::Comments => "comments",
            UserList::FollowedCooks => "followed_cooks",
            UserList::Followers => "followers",
        }
    }
}

impl std::fmt::Display for UserList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::now_v7(),
            username: "chefAlice".to_string(),
            email: "alice@example.com".to_string(),
            profile_image: ImageRef::default_profile(),
            biography: DEFAULT_BIOGRAPHY.to_string(),
            recipes: vec![],
            favorite_recipes: vec![],
            comments: vec![],
            followed_cooks: vec![],
            followers: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_relationship_queries() {
        let other = Uuid::now_v7();
        let recipe = Uuid::now_v7();
        let mut u = user();
        assert!(!u.is_following(other));
        assert!(!u.is_followed_by(other));
        assert!(!u.has_favorited(recipe));

        u.followed_cooks.push(other);
        u.followers.push(other);
        u.favorite_recipes.push(recipe);
        assert!(u.is_following(other));
        assert!(u.is_followed_by(other));
        assert!(u.has_favorited(recipe));
    }

    #[test]
    fn test_serializes_camel_case_lists() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json["favoriteRecipes"].is_array());
        assert!(json["followedCooks"].is_array());
        assert!(json["profileImage"].is_object());
    }

    #[test]
    fn test_user_list_names() {
        assert_eq!(UserList::FavoriteRecipes.as_str(), "favorite_recipes");
        assert_eq!(UserList::FollowedCooks.to_string(), "followed_cooks");
        assert_eq!(UserList::ALL.len(), 5);
    }
}
