//! 最小端到端示例：在本地目录后端上保存并重新加载一棵小目录树。

use std::path::Path;

use bytes::Bytes;

use crate::cadapter::localfs::LocalFsBackend;
use crate::node::meta::{S_IFDIR, S_IFREG};
use crate::node::{Directory, Extent, File, FsContext, Meta, Node};
use crate::session::{ObjectKey, Session};

/// 在指定的本地目录下，保存一个带两个 extent 的文件和它的父目录，
/// 再从头加载并校验数据完整性。
pub async fn e2e_localfs_demo<P: AsRef<Path>>(root: P) -> anyhow::Result<()> {
    let sess = Session::new(LocalFsBackend::new(root));
    let ctx = FsContext {
        uid: 1000,
        gid: 1000,
    };

    // 1) 构造文件：两个 extent，第二个为短尾
    let extent_size = 4096u64;
    let first = Bytes::from(vec![7u8; extent_size as usize]);
    let tail = Bytes::from_static(b"tail data");
    let mut meta = Meta::new(S_IFREG | 0o644, &ctx);
    meta.size = (first.len() + tail.len()) as i64;
    let mut file = File::new(ObjectKey::new("nodes/hello"), meta, extent_size);
    file.extents.insert(0, Extent::dirty(first.clone()));
    file.extents.insert(1, Extent::dirty(tail.clone()));
    file.save(&sess).await?;

    // 2) 挂到父目录下并保存
    let mut dir = Directory::new(ObjectKey::new("nodes/root"), Meta::new(S_IFDIR | 0o755, &ctx));
    dir.children
        .insert("hello".to_string(), file.key.clone());
    dir.save(&sess).await?;

    // 3) 从存储端重新解析并校验
    let Node::Directory(loaded_dir) = Node::load(&sess, &ObjectKey::new("nodes/root")).await?
    else {
        anyhow::bail!("root did not decode as a directory");
    };
    let child_key = loaded_dir
        .children
        .get("hello")
        .ok_or_else(|| anyhow::anyhow!("child missing from directory"))?;
    let Node::File(mut loaded_file) = Node::load(&sess, child_key).await? else {
        anyhow::bail!("child did not decode as a file");
    };

    for (index, want) in [(0u64, &first), (1u64, &tail)] {
        let extent = loaded_file
            .extents
            .get_mut(&index)
            .ok_or_else(|| anyhow::anyhow!("extent {index} missing"))?;
        extent.fill(&sess).await?;
        let body = extent
            .body()
            .ok_or_else(|| anyhow::anyhow!("extent {index} still empty after fill"))?;
        if body != want {
            anyhow::bail!("extent {index} data mismatch");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_e2e_localfs_demo() {
        let dir = tempfile::tempdir().unwrap();
        e2e_localfs_demo(dir.path())
            .await
            .expect("e2e demo should succeed");
    }
}
