// Image hosting
// Decision: Image storage sits behind a trait so tests and dev mode never call out to Cloudinary
// Decision: Manual Cloudinary REST calls with a signed form (no SDK), like the OAuth client
// Decision: Deleting a replaced image is fire-and-forget; a failure only leaves an orphan on the host

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Deserialize;
use spicescape_core::ImageRef;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Where the server keeps profile images
pub const PROFILE_FOLDER: &str = "profiles";
/// Where the server keeps recipe images
pub const RECIPE_FOLDER: &str = "recipes";

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

impl From<UploadedImage> for ImageRef {
    fn from(image: UploadedImage) -> Self {
        ImageRef::new(image.url, image.public_id)
    }
}

/// External image storage
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload a base64 `data:` URI into `folder`
    async fn upload(&self, data_uri: &str, folder: &str) -> Result<UploadedImage>;

    /// Remove an image by its host id
    async fn delete(&self, public_id: &str) -> Result<()>;
}

/// Delete `image` from the host without waiting for the result.
/// Built-in default images are shared and never deleted.
pub fn delete_in_background(host: Arc<dyn ImageHost>, image: ImageRef) {
    if image.is_default() {
        return;
    }
    tokio::spawn(async move {
        if let Err(e) = host.delete(&image.public_id).await {
            tracing::warn!(public_id = %image.public_id, "Failed to delete image: {:#}", e);
        }
    });
}

// ============================================
// Configuration
// ============================================

/// Cloudinary credentials
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    /// Load from CLOUDINARY_* environment variables; None unless all are set
    pub fn from_env() -> Option<Self> {
        let get = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            cloud_name: get("CLOUDINARY_CLOUD_NAME")?,
            api_key: get("CLOUDINARY_API_KEY")?,
            api_secret: get("CLOUDINARY_API_SECRET")?,
        })
    }
}

/// Pick the image host from the environment
pub fn image_host_from_env() -> Arc<dyn ImageHost> {
    match CloudinaryConfig::from_env() {
        Some(config) => {
            tracing::info!(cloud_name = %config.cloud_name, "Using Cloudinary image host");
            Arc::new(CloudinaryImageHost::new(config))
        }
        None => {
            tracing::warn!(
                "CLOUDINARY_* not fully configured, images are kept in memory and lost on restart"
            );
            Arc::new(InMemoryImageHost::new())
        }
    }
}

// ============================================
// Cloudinary
// ============================================

pub struct CloudinaryImageHost {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryDestroyResponse {
    result: String,
}

impl CloudinaryImageHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }
}

/// Sign request parameters: sort by key, join as `k=v&k=v`, append the secret,
/// hex SHA-256 of the whole string.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{}{}", joined, api_secret).as_bytes()))
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    async fn upload(&self, data_uri: &str, folder: &str) -> Result<UploadedImage> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let response: CloudinaryUploadResponse = self
            .client
            .post(self.endpoint("upload"))
            .form(&[
                ("file", data_uri),
                ("api_key", self.config.api_key.as_str()),
                ("folder", folder),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .context("Failed to upload image")?
            .error_for_status()
            .context("Image host rejected upload")?
            .json()
            .await
            .context("Failed to parse upload response")?;

        tracing::debug!(public_id = %response.public_id, "Uploaded image");

        Ok(UploadedImage {
            url: response.secure_url,
            public_id: response.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("invalidate", "true"),
                ("public_id", public_id),
                ("timestamp", &timestamp),
            ],
            &self.config.api_secret,
        );

        let response: CloudinaryDestroyResponse = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("invalidate", "true"),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .context("Failed to delete image")?
            .error_for_status()
            .context("Image host rejected delete")?
            .json()
            .await
            .context("Failed to parse delete response")?;

        if response.result != "ok" && response.result != "not found" {
            anyhow::bail!("Unexpected delete result: {}", response.result);
        }
        Ok(())
    }
}

// ============================================
// In-memory
// ============================================

/// Image decoded from a data URI
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub folder: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Split a base64 data URI into (content type, decoded bytes)
pub fn decode_data_uri(data_uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_uri
        .strip_prefix("data:")
        .context("Image is not a data URI")?;
    let (meta, payload) = rest.split_once(',').context("Data URI has no payload")?;
    let content_type = meta
        .strip_suffix(";base64")
        .context("Data URI is not base64 encoded")?;
    let content_type = content_type
        .split(';')
        .next()
        .filter(|t| !t.is_empty())
        .unwrap_or("application/octet-stream");

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("Data URI payload is not valid base64")?;

    Ok((content_type.to_string(), bytes))
}

/// Image host for dev mode and tests
#[derive(Default)]
pub struct InMemoryImageHost {
    images: RwLock<HashMap<String, StoredImage>>,
}

impl InMemoryImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.images.read().contains_key(public_id)
    }

    pub fn get(&self, public_id: &str) -> Option<StoredImage> {
        self.images.read().get(public_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }
}

#[async_trait]
impl ImageHost for InMemoryImageHost {
    async fn upload(&self, data_uri: &str, folder: &str) -> Result<UploadedImage> {
        let (content_type, bytes) = decode_data_uri(data_uri)?;
        let public_id = format!("{}/{}", folder, Uuid::now_v7().simple());
        let url = format!("memory://images/{}", public_id);

        self.images.write().insert(
            public_id.clone(),
            StoredImage {
                folder: folder.to_string(),
                content_type,
                bytes,
            },
        );

        Ok(UploadedImage { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.images.write().remove(public_id);
        Ok(())
    }
}
