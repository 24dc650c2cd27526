//! High-level object client wrapping backend put/get operations.

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Errors surfaced by the object client.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("store backend: {0}")]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn put_object_vectored(&self, key: &str, chunks: Vec<Bytes>) -> anyhow::Result<()> {
        let data = chunks
            .into_iter()
            .flat_map(|e| e.to_vec())
            .collect::<Vec<_>>();
        self.put_object(key, &data).await
    }

    async fn put_object(&self, key: &str, data: &[u8]) -> anyhow::Result<()>;

    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;

    async fn is_exist(&self, key: &str) -> anyhow::Result<bool>;
}

#[async_trait]
impl<B: ObjectBackend + ?Sized> ObjectBackend for Arc<B> {
    async fn put_object_vectored(&self, key: &str, chunks: Vec<Bytes>) -> anyhow::Result<()> {
        (**self).put_object_vectored(key, chunks).await
    }

    async fn put_object(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        (**self).put_object(key, data).await
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        (**self).get_object(key).await
    }

    async fn is_exist(&self, key: &str) -> anyhow::Result<bool> {
        (**self).is_exist(key).await
    }
}

/// Cache-aware object client.
///
/// Metadata blobs live at stable keys and are re-uploaded on every save.
/// The client remembers the digest of the blob it last confirmed at each
/// key and skips the write only when the exact same bytes go to the exact
/// same key; a mutated node at a stable key is always written. Extent
/// bodies use `is_exist` + `upload` instead: their keys are content
/// derived and the existence check is the dedup path.
#[derive(Clone)]
pub struct ObjectClient<B: ObjectBackend> {
    backend: B,
    uploaded: moka::future::Cache<String, Vec<u8>>,
}

impl<B: ObjectBackend> ObjectClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            uploaded: moka::future::Cache::new(10_000),
        }
    }

    /// Plain upload: always performs the backend write.
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.backend.put_object(key, data).await?;
        Ok(())
    }

    /// Upload unless this exact blob is already confirmed present at `key`.
    pub async fn upload_with_cache(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let digest = Sha256::digest(data).to_vec();
        if self.uploaded.get(key).await.as_deref() == Some(digest.as_slice()) {
            tracing::debug!(key, "upload cache hit, skip write");
            return Ok(());
        }
        self.backend.put_object(key, data).await?;
        self.uploaded.insert(key.to_string(), digest).await;
        Ok(())
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        match self.backend.get_object(key).await? {
            Some(data) => Ok(data),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    pub async fn is_exist(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.backend.is_exist(key).await?)
    }
}
