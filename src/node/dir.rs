//! Directory：子名 -> 子键映射，作为单个元数据块持久化。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cadapter::client::ObjectBackend;
use crate::session::{ObjectKey, Session};

use super::NodeError;
use super::meta::Meta;

/// A directory: metadata plus child-name -> child-key mapping.
///
/// The directory's own key is stable identity assigned at creation, not
/// derived from its children; mutating an entry leaves the key unchanged
/// and becomes durable at the next `save`. Ordered map so identical
/// logical state serializes to identical bytes for the upload cache.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub key: ObjectKey,
    pub meta: Meta,
    pub children: BTreeMap<String, ObjectKey>,
}

impl Directory {
    pub fn new(key: ObjectKey, meta: Meta) -> Self {
        Self {
            key,
            meta,
            children: BTreeMap::new(),
        }
    }

    pub fn decode(blob: &[u8]) -> Result<Self, NodeError> {
        Ok(serde_json::from_slice(blob)?)
    }

    /// Serialize and upload this directory at its own key.
    pub async fn save<B: ObjectBackend>(&self, sess: &Session<B>) -> Result<(), NodeError> {
        let blob = serde_json::to_vec(self)?;
        sess.store()
            .upload_with_cache(self.key.as_str(), &blob)
            .await?;
        Ok(())
    }
}
