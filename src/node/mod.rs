//! Filesystem nodes persisted as content-addressed blobs.
//!
//! Submodules:
//! - `meta`: POSIX-style attributes shared by all node kinds
//! - `extent`: lazily materialized, dirty-tracked file chunk
//! - `file`: extent map + concurrent dedup-aware save
//! - `dir`: child name -> child key mapping
//! - `symlink`: link target blob
//!
//! A persisted blob carries its kind in the metadata mode bits; `Node`
//! decodes a blob into the matching variant so callers never guess kind
//! from content shape.

pub mod dir;
pub mod extent;
pub mod file;
pub mod meta;
pub mod symlink;

pub use dir::Directory;
pub use extent::Extent;
pub use file::File;
pub use meta::{FsContext, Meta};
pub use symlink::SymLink;

use serde::Deserialize;

use crate::cadapter::client::{ObjectBackend, StoreError};
use crate::session::{ObjectKey, Session};

/// Errors from node persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown node kind: mode {mode:#o}")]
    UnknownKind { mode: u32 },
}

/// A decoded node of any kind.
#[derive(Debug, PartialEq)]
pub enum Node {
    Directory(Directory),
    File(File),
    SymLink(SymLink),
}

impl Node {
    /// Decode a node blob, dispatching on the persisted mode bits.
    pub fn decode(blob: &[u8]) -> Result<Node, NodeError> {
        #[derive(Deserialize)]
        struct Probe {
            meta: Meta,
        }
        let probe: Probe = serde_json::from_slice(blob)?;
        if probe.meta.is_dir() {
            Ok(Node::Directory(Directory::decode(blob)?))
        } else if probe.meta.is_file() {
            Ok(Node::File(File::decode(blob)?))
        } else if probe.meta.is_symlink() {
            Ok(Node::SymLink(SymLink::decode(blob)?))
        } else {
            Err(NodeError::UnknownKind {
                mode: probe.meta.mode,
            })
        }
    }

    /// Fetch the blob at `key` and decode it.
    pub async fn load<B: ObjectBackend>(
        sess: &Session<B>,
        key: &ObjectKey,
    ) -> Result<Node, NodeError> {
        let blob = sess.store().download(key.as_str()).await?;
        Node::decode(&blob)
    }

    pub fn key(&self) -> &ObjectKey {
        match self {
            Node::Directory(d) => &d.key,
            Node::File(f) => &f.key,
            Node::SymLink(l) => &l.key,
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Node::Directory(d) => &d.meta,
            Node::File(f) => &f.meta,
            Node::SymLink(l) => &l.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadapter::client::StoreError;
    use crate::cadapter::memory::InMemoryBackend;
    use crate::node::meta::{S_IFDIR, S_IFLNK, S_IFREG};

    fn ctx() -> FsContext {
        FsContext { uid: 1000, gid: 1000 }
    }

    #[tokio::test]
    async fn test_load_discriminates_kinds_by_mode() {
        let sess = Session::new(InMemoryBackend::new());

        let dir = Directory::new(ObjectKey::new("n/dir"), Meta::new(S_IFDIR | 0o755, &ctx()));
        dir.save(&sess).await.unwrap();

        let mut file = File::new(ObjectKey::new("n/file"), Meta::new(S_IFREG | 0o644, &ctx()), 4096);
        file.save(&sess).await.unwrap();

        let link = SymLink::new(
            ObjectKey::new("n/link"),
            Meta::new(S_IFLNK | 0o777, &ctx()),
            "target",
        );
        link.save(&sess).await.unwrap();

        assert!(matches!(
            Node::load(&sess, &ObjectKey::new("n/dir")).await.unwrap(),
            Node::Directory(_)
        ));
        assert!(matches!(
            Node::load(&sess, &ObjectKey::new("n/file")).await.unwrap(),
            Node::File(_)
        ));
        match Node::load(&sess, &ObjectKey::new("n/link")).await.unwrap() {
            Node::SymLink(l) => assert_eq!(l.link_to, "target"),
            other => panic!("expected symlink, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_unknown_mode() {
        let blob = br#"{"key":"n/junk","meta":{"size":0,"mode":0,"uid":0,"gid":0,"atime":0,"ctime":0,"mtime":0},"children":{}}"#;
        match Node::decode(blob) {
            Err(NodeError::UnknownKind { mode }) => assert_eq!(mode, 0),
            other => panic!("expected UnknownKind, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_missing_key_is_not_found() {
        let sess = Session::new(InMemoryBackend::new());
        match Node::load(&sess, &ObjectKey::new("n/absent")).await {
            Err(NodeError::Store(StoreError::NotFound(_))) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
