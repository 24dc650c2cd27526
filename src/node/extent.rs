//! Extent：文件数据的定长分片，按内容寻址，支持惰性加载与脏标记。

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cadapter::client::ObjectBackend;
use crate::session::{ObjectKey, Session};

use super::NodeError;

/// Lifecycle of an extent body.
///
/// `Clean` guarantees the body is exactly the content addressed by the
/// recorded key; `Dirty` means the key is stale until the next save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExtentState {
    /// Key recorded, body not materialized yet.
    #[default]
    Missing,
    Clean(Bytes),
    Dirty(Bytes),
}

/// One content-addressed chunk of a file. Only the key is persisted; the
/// body lives in its own raw blob and is loaded on demand via `fill`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub key: ObjectKey,
    #[serde(skip)]
    state: ExtentState,
}

impl Extent {
    /// New extent holding not-yet-persisted content.
    pub fn dirty(body: impl Into<Bytes>) -> Self {
        Self {
            key: ObjectKey::default(),
            state: ExtentState::Dirty(body.into()),
        }
    }

    /// Extent referencing already-persisted content at `key`.
    pub fn from_key(key: ObjectKey) -> Self {
        Self {
            key,
            state: ExtentState::Missing,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, ExtentState::Dirty(_))
    }

    /// In-memory body, if materialized.
    pub fn body(&self) -> Option<&Bytes> {
        match &self.state {
            ExtentState::Clean(b) | ExtentState::Dirty(b) => Some(b),
            ExtentState::Missing => None,
        }
    }

    /// Replace the body with new content. The recorded key is stale until
    /// the owning file is saved.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.state = ExtentState::Dirty(body.into());
    }

    /// Content address of the current in-memory body. Pure, no I/O;
    /// `None` until the body is materialized.
    pub fn current_key<B: ObjectBackend>(&self, sess: &Session<B>) -> Option<ObjectKey> {
        self.body().map(|b| sess.address(b))
    }

    /// Idempotent lazy-load of the body from the store.
    ///
    /// Dirty or already-loaded extents are left untouched. A failed
    /// download leaves the state unchanged so a later call retries.
    pub async fn fill<B: ObjectBackend>(&mut self, sess: &Session<B>) -> Result<(), NodeError> {
        if !matches!(self.state, ExtentState::Missing) {
            tracing::debug!(key = %self.key, "already filled");
            return Ok(());
        }
        let body = sess.store().download(self.key.as_str()).await?;
        tracing::debug!(key = %self.key, body_size = body.len(), "fill extent");
        self.state = ExtentState::Clean(Bytes::from(body));
        Ok(())
    }

    /// Record that the body is persisted under `key`.
    pub(crate) fn mark_clean(&mut self, key: ObjectKey) {
        let state = std::mem::take(&mut self.state);
        self.key = key;
        self.state = match state {
            ExtentState::Dirty(body) | ExtentState::Clean(body) => ExtentState::Clean(body),
            ExtentState::Missing => ExtentState::Missing,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadapter::client::StoreError;
    use crate::cadapter::memory::InMemoryBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fill_downloads_once() {
        let backend = Arc::new(InMemoryBackend::new());
        let sess = Session::new(backend.clone());

        let body = b"extent body".to_vec();
        let key = sess.address(&body);
        sess.store().upload(key.as_str(), &body).await.unwrap();
        let gets_before = backend.get_count();

        let mut extent = Extent::from_key(key.clone());
        extent.fill(&sess).await.unwrap();
        assert_eq!(extent.body().unwrap().as_ref(), body.as_slice());
        assert!(!extent.is_dirty());

        // Second fill is a no-op: same body, no network access.
        extent.fill(&sess).await.unwrap();
        assert_eq!(extent.body().unwrap().as_ref(), body.as_slice());
        assert_eq!(backend.get_count(), gets_before + 1);
    }

    #[tokio::test]
    async fn test_fill_missing_object_leaves_body_empty() {
        let sess = Session::new(InMemoryBackend::new());
        let mut extent = Extent::from_key(ObjectKey::new("no-such-object"));

        match extent.fill(&sess).await {
            Err(NodeError::Store(StoreError::NotFound(_))) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(extent.body().is_none());

        // The state is still loadable: a later fill succeeds once the
        // object shows up.
        sess.store().upload("no-such-object", b"late").await.unwrap();
        extent.fill(&sess).await.unwrap();
        assert_eq!(extent.body().unwrap().as_ref(), b"late");
    }

    #[tokio::test]
    async fn test_fill_skips_dirty_extent() {
        let sess = Session::new(InMemoryBackend::new());
        let mut extent = Extent::dirty(&b"unsaved"[..]);
        extent.fill(&sess).await.unwrap();
        assert!(extent.is_dirty());
        assert_eq!(extent.body().unwrap().as_ref(), b"unsaved");
    }

    #[tokio::test]
    async fn test_current_key_tracks_body() {
        let sess = Session::new(InMemoryBackend::new());
        let mut extent = Extent::from_key(ObjectKey::new("k"));
        assert_eq!(extent.current_key(&sess), None);

        extent.set_body(&b"abc"[..]);
        assert!(extent.is_dirty());
        assert_eq!(extent.current_key(&sess), Some(sess.address(b"abc")));
    }
}
