// Image references
//
// Images live on an external host; entities only keep the public URL and the
// host's id needed to delete the image later.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Host id of the built-in profile image. Never deleted from the host.
pub const DEFAULT_PROFILE_IMAGE_ID: &str = "321";
pub const DEFAULT_PROFILE_IMAGE_URL: &str =
    "https://res.cloudinary.com/dhscoasnw/image/upload/v1682015580/default-user_re7kkp.png";

/// Host id of the built-in recipe image. Never deleted from the host.
pub const DEFAULT_RECIPE_IMAGE_ID: &str = "123";
pub const DEFAULT_RECIPE_IMAGE_URL: &str =
    "https://res.cloudinary.com/dhscoasnw/image/upload/v1682023030/default-dish_ciooaz.png";

/// Reference to an image stored on the image host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Public URL of the image.
    pub url: String,
    /// Host identifier used to delete the image.
    pub public_id: String,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
        }
    }

    pub fn default_profile() -> Self {
        Self::new(DEFAULT_PROFILE_IMAGE_URL, DEFAULT_PROFILE_IMAGE_ID)
    }

    pub fn default_recipe() -> Self {
        Self::new(DEFAULT_RECIPE_IMAGE_URL, DEFAULT_RECIPE_IMAGE_ID)
    }

    /// Built-in images are shared by many entities and must stay on the host.
    pub fn is_default(&self) -> bool {
        self.public_id == DEFAULT_PROFILE_IMAGE_ID || self.public_id == DEFAULT_RECIPE_IMAGE_ID
    }
}
