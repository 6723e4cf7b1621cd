// Comment domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Comment - text left by a user on a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique identifier for the comment.
    pub id: Uuid,
    /// Recipe the comment belongs to.
    pub parent_post: Uuid,
    /// User who wrote the comment.
    pub made_by: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
