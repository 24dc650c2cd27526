//! File：extent 映射 + 并发去重保存；先刷脏 extent，再上传自身元数据块。

use std::collections::BTreeMap;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};

use crate::cadapter::client::{ObjectBackend, StoreError};
use crate::session::{ObjectKey, Session};

use super::NodeError;
use super::extent::Extent;
use super::meta::Meta;

/// Default extent size (4 MiB).
pub const DEFAULT_EXTENT_SIZE: u64 = 4 * 1024 * 1024;

/// A regular file: metadata plus an extent-index -> extent mapping.
///
/// The file's own key is stable identity; extent keys are content derived.
/// The last extent may be shorter than `extent_size`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub key: ObjectKey,
    pub meta: Meta,
    pub extent_size: u64,
    #[serde(rename = "extent")]
    pub extents: BTreeMap<u64, Extent>,
}

impl File {
    pub fn new(key: ObjectKey, meta: Meta, extent_size: u64) -> Self {
        Self {
            key,
            meta,
            extent_size,
            extents: BTreeMap::new(),
        }
    }

    /// Zero-based extent index covering a byte offset.
    pub fn extent_index(&self, offset: u64) -> u64 {
        offset / self.extent_size
    }

    pub fn decode(blob: &[u8]) -> Result<Self, NodeError> {
        Ok(serde_json::from_slice(blob)?)
    }

    /// Persist every dirty extent, then the file's own metadata blob.
    ///
    /// Extent uploads run concurrently and results are applied as they
    /// complete: the first failure is returned immediately and the
    /// remaining in-flight uploads are cancelled with it, while extents
    /// flushed before the failure stay clean. The file blob is only
    /// written after every extent has settled, so on the error path it
    /// still references the pre-save extent keys and a retry re-uploads
    /// exactly the extents that are still dirty.
    pub async fn save<B: ObjectBackend>(&mut self, sess: &Session<B>) -> Result<(), NodeError> {
        let mut uploads = FuturesUnordered::new();
        for (&index, extent) in self.extents.iter() {
            if !extent.is_dirty() {
                continue;
            }
            let Some(body) = extent.body().cloned() else {
                continue;
            };
            let key = sess.address(&body);
            uploads.push(async move {
                if sess.store().is_exist(key.as_str()).await? {
                    tracing::debug!(key = %key, "extent content already stored, skip upload");
                    return Ok::<_, StoreError>((index, key));
                }
                sess.store().upload(key.as_str(), &body).await?;
                Ok((index, key))
            });
        }

        while let Some(flushed) = uploads.next().await {
            let (index, key) = flushed?;
            if let Some(extent) = self.extents.get_mut(&index) {
                extent.mark_clean(key);
            }
        }

        let blob = serde_json::to_vec(self)?;
        sess.store()
            .upload_with_cache(self.key.as_str(), &blob)
            .await?;
        Ok(())
    }
}
