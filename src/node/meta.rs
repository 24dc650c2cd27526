//! 节点元数据：目录、文件与符号链接共享的 POSIX 属性。

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// mode_t is narrower on some libc targets; normalize the kind masks once.
pub const S_IFMT: u32 = libc::S_IFMT as u32;
pub const S_IFDIR: u32 = libc::S_IFDIR as u32;
pub const S_IFREG: u32 = libc::S_IFREG as u32;
pub const S_IFLNK: u32 = libc::S_IFLNK as u32;

/// Acting user/group supplied by the dispatch layer when a node is created.
#[derive(Clone, Copy, Debug)]
pub struct FsContext {
    pub uid: u32,
    pub gid: u32,
}

/// Attributes shared by every node kind.
///
/// `size` reflects the logical size at the last mutating update; it is
/// never recomputed here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub size: i64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
}

impl Meta {
    /// Metadata for a node created now, owned by the acting user.
    pub fn new(mode: u32, ctx: &FsContext) -> Self {
        let now = now_unix();
        Self {
            size: 0,
            mode,
            uid: ctx.uid,
            gid: ctx.gid,
            atime: now,
            ctime: now,
            mtime: now,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn is_symlink(&self) -> bool {
        self.mode & S_IFMT == S_IFLNK
    }
}

/// Seconds since the Unix epoch; clamps to 0 for pre-epoch clocks.
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_meta_stamps_owner_and_times() {
        let ctx = FsContext { uid: 501, gid: 20 };
        let meta = Meta::new(S_IFREG | 0o644, &ctx);
        assert_eq!(meta.uid, 501);
        assert_eq!(meta.gid, 20);
        assert_eq!(meta.size, 0);
        assert!(meta.atime > 0);
        assert_eq!(meta.atime, meta.ctime);
        assert_eq!(meta.ctime, meta.mtime);
    }

    #[test]
    fn test_kind_discrimination() {
        let ctx = FsContext { uid: 0, gid: 0 };
        assert!(Meta::new(S_IFDIR | 0o755, &ctx).is_dir());
        assert!(Meta::new(S_IFREG | 0o644, &ctx).is_file());
        assert!(Meta::new(S_IFLNK | 0o777, &ctx).is_symlink());
        assert!(!Meta::new(S_IFREG | 0o644, &ctx).is_dir());
    }
}
