//! 会话与内容寻址：对象存储客户端 + key 生成器，注入到每个节点操作。

use crate::cadapter::client::{ObjectBackend, ObjectClient};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque, immutable identifier of a persisted blob.
///
/// Bit-identical content always maps to the same key; a new key always
/// means new content. Directory/file/symlink own keys are assigned by the
/// caller at creation and stay stable across saves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ObjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Process-wide handle bundling the object client and the key generator.
///
/// Shared by reference across the live node graph; nodes receive it per
/// operation instead of holding ambient global state.
pub struct Session<B: ObjectBackend> {
    store: ObjectClient<B>,
}

impl<B: ObjectBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            store: ObjectClient::new(backend),
        }
    }

    pub fn store(&self) -> &ObjectClient<B> {
        &self.store
    }

    /// Content address of `body`: SHA-256 over the raw bytes, hex encoded.
    pub fn address(&self, body: &[u8]) -> ObjectKey {
        let mut hasher = Sha256::new();
        hasher.update(body);
        ObjectKey(hex::encode(hasher.finalize()))
    }
}
