//! Product image storage on S3.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, aws::AmazonS3Builder, path::Path,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_PREFIX: &str = "products";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("unsupported image type {0}")]
    UnsupportedType(String),

    #[error("image exceeds {MAX_IMAGE_BYTES} bytes")]
    TooLarge,
}

impl StorageError {
    /// Errors caused by the uploaded content rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StorageError::UnsupportedType(_) | StorageError::TooLarge)
    }
}

/// File extension for the accepted image content types.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Object key for a public URL under `base_url`, `None` for foreign URLs.
pub fn key_for_url(base_url: &str, url: &str) -> Option<String> {
    let key = url.strip_prefix(base_url)?.strip_prefix('/')?;
    let key = key.split(['?', '#']).next().unwrap_or_default();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores an image and returns its public URL.
    async fn upload(&self, content_type: &str, data: Bytes) -> Result<String, StorageError>;

    /// Deletes the images behind `urls`, skipping URLs that do not belong to
    /// this store. Returns how many objects were deleted.
    async fn delete_many(&self, urls: &[String]) -> Result<usize, StorageError>;
}

pub struct S3ImageStore {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
}

impl S3ImageStore {
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .build()?;
        Ok(Self::new(Arc::new(store), config.public_base_url.clone()))
    }

    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: String) -> Self {
        Self {
            store,
            public_base_url,
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(&self, content_type: &str, data: Bytes) -> Result<String, StorageError> {
        let extension = image_extension(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;
        if data.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge);
        }

        let key = format!("{IMAGE_PREFIX}/{}.{extension}", Uuid::new_v4());
        let options = PutOptions {
            attributes: Attributes::from_iter([(Attribute::ContentType, content_type.to_string())]),
            ..Default::default()
        };
        self.store
            .put_opts(&Path::from(key.as_str()), PutPayload::from(data), options)
            .await?;

        tracing::debug!(%key, "image uploaded");
        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn delete_many(&self, urls: &[String]) -> Result<usize, StorageError> {
        let mut deleted = 0;
        for url in urls {
            let Some(key) = key_for_url(&self.public_base_url, url) else {
                tracing::debug!(%url, "skipping image outside the bucket");
                continue;
            };
            match self.store.delete(&Path::from(key.as_str())).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => deleted += 1,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(deleted)
    }
}
