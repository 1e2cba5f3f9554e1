//! Blob storage client for uploaded media.
//!
//! Product photos and payment receipts go through here. Uploads are
//! validated (type and size) before any bytes leave the process, and
//! stored under a unique name so re-uploads never clobber each other.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use mirra_core::limits::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES};

/// Path prefix that marks bundled placeholder images. These are not
/// stored remotely, so delete requests for them are skipped.
const PLACEHOLDER_PREFIX: &str = "static/";

/// Errors from blob operations.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("image too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("storage error ({status}): {message}")]
    Backend { status: u16, message: String },
}

/// A stored blob: its storage path and the public URL to serve it from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlobRef {
    pub path: String,
    pub url: String,
}

/// An image about to be uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Check the content type and size against the accepted limits.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::UnsupportedType`] or [`BlobError::TooLarge`].
    pub fn validate(&self) -> Result<(), BlobError> {
        if !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err(BlobError::UnsupportedType(self.content_type.clone()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(BlobError::TooLarge {
                size: self.bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        self.filename.rsplit('.').next().unwrap_or("bin")
    }
}

/// Build a unique storage path under `folder`.
fn unique_path(folder: &str, upload: &ImageUpload) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random();
    format!(
        "{folder}/{timestamp}_{suffix:08x}.{}",
        upload.extension()
    )
}

/// Blob storage surface.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Validate and upload an image under `folder`, returning its ref.
    async fn upload(&self, folder: &str, upload: ImageUpload) -> Result<BlobRef, BlobError>;

    /// Delete a stored blob by path. Placeholder paths are skipped.
    async fn delete(&self, path: &str) -> Result<(), BlobError>;
}

/// [`BlobStore`] backed by the hosted media API.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpBlobStore {
    /// Build a client against `base_url`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed base URL or if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, BlobError> {
        url::Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, folder: &str, upload: ImageUpload) -> Result<BlobRef, BlobError> {
        upload.validate()?;
        let path = unique_path(folder, &upload);

        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .put(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, &upload.content_type)
            .body(upload.bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BlobError::Backend { status, message });
        }

        tracing::debug!(%path, "uploaded blob");
        Ok(BlobRef { url, path })
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        if path.starts_with(PLACEHOLDER_PREFIX) {
            return Ok(());
        }

        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .send()
            .await?;

        // Already gone is fine.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(BlobError::Backend { status, message })
    }
}

/// In-memory [`BlobStore`] for tests, with one-shot failure injection.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_next: std::sync::atomic::AtomicBool,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next upload fail.
    pub fn fail_next_upload(&self) {
        self.fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, folder: &str, upload: ImageUpload) -> Result<BlobRef, BlobError> {
        upload.validate()?;
        if self
            .fail_next
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(BlobError::Backend {
                status: 503,
                message: "injected upload failure".to_owned(),
            });
        }

        let path = unique_path(folder, &upload);
        let url = format!("memory://{path}");
        self.blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.clone(), upload.bytes);
        Ok(BlobRef { path, url })
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        if path.starts_with(PLACEHOLDER_PREFIX) {
            return Ok(());
        }
        self.blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(bytes: usize) -> ImageUpload {
        ImageUpload {
            filename: "photo.jpg".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: vec![0; bytes],
        }
    }

    #[test]
    fn rejects_unsupported_type() {
        let upload = ImageUpload {
            filename: "doc.pdf".to_owned(),
            content_type: "application/pdf".to_owned(),
            bytes: vec![0; 10],
        };
        assert!(matches!(
            upload.validate(),
            Err(BlobError::UnsupportedType(_))
        ));
    }

    #[test]
    fn rejects_oversized_image() {
        let upload = jpeg(MAX_IMAGE_BYTES + 1);
        assert!(matches!(upload.validate(), Err(BlobError::TooLarge { .. })));
    }

    #[test]
    fn accepts_image_at_the_limit() {
        assert!(jpeg(MAX_IMAGE_BYTES).validate().is_ok());
    }

    #[tokio::test]
    async fn upload_paths_are_unique() {
        let store = MemoryBlobStore::new();
        let a = store.upload("receipts", jpeg(10)).await.expect("upload");
        let b = store.upload("receipts", jpeg(10)).await.expect("upload");
        assert_ne!(a.path, b.path);
        assert!(a.path.starts_with("receipts/"));
    }

    #[tokio::test]
    async fn placeholder_paths_are_never_deleted() {
        let store = MemoryBlobStore::new();
        store
            .delete("static/placeholder.png")
            .await
            .expect("skip placeholder");
    }
}
