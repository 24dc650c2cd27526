//! SymLink：链接目标随元数据一起保存在单个块里。

use serde::{Deserialize, Serialize};

use crate::cadapter::client::ObjectBackend;
use crate::session::{ObjectKey, Session};

use super::NodeError;
use super::meta::Meta;

/// A symbolic link. The target string is small enough to live entirely in
/// the metadata blob; there is no extent-like chunking.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SymLink {
    pub key: ObjectKey,
    pub meta: Meta,
    #[serde(rename = "linkto")]
    pub link_to: String,
}

impl SymLink {
    pub fn new(key: ObjectKey, meta: Meta, link_to: impl Into<String>) -> Self {
        Self {
            key,
            meta,
            link_to: link_to.into(),
        }
    }

    pub fn decode(blob: &[u8]) -> Result<Self, NodeError> {
        Ok(serde_json::from_slice(blob)?)
    }

    /// Serialize and upload this link at its own key.
    pub async fn save<B: ObjectBackend>(&self, sess: &Session<B>) -> Result<(), NodeError> {
        let blob = serde_json::to_vec(self)?;
        sess.store()
            .upload_with_cache(self.key.as_str(), &blob)
            .await?;
        Ok(())
    }
}
