// Recipe domain types
//
// Invariant: every id in `comments` refers to a comment whose `parent_post`
// is this recipe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::image::ImageRef;

/// Recipe - a dish published by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique identifier for the recipe.
    pub id: Uuid,
    /// ID of the user who created the recipe.
    pub created_by: Uuid,
    pub recipe_title: String,
    pub recipe_description: String,
    pub recipe_ingredients: String,
    pub recipe_steps: String,
    pub recipe_image: ImageRef,
    /// Comments posted on this recipe.
    #[serde(default)]
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
