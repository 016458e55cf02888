//! The filesystem projection: FUSE-style calls over the move-tree.
//!
//! Every mutating call is translated into a batch of move operations and
//! applied through the local replica, so the whole surface replicates with
//! the tree. The exposed inode number *is* the tree node id (for files: the
//! file-inode node id), which embeds the creating replica - globally unique
//! without any coordination and recoverable for conflict renames.

use crate::conflict::ConflictPolicy;
use crate::error::{FsError, Result};
use crate::meta::FsMeta;
use rmt_core::ReplicaId;
use rmt_tree::{LamportTs, LogOpMove, NodeId, OpMove, Replica, TreeNode};
use std::time::{SystemTime, UNIX_EPOCH};

/// Exposed inode numbers; the raw form of [`NodeId`].
pub type Ino = u64;

/// The sentinel returned by a lookup miss (cacheable negative entry).
pub const NULL_INO: Ino = 0;

/// File kinds as the attr surface reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    Symlink,
    File,
}

/// The attribute record `getattr` answers with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAttr {
    pub ino: Ino,
    pub size: u64,
    pub ctime: u64,
    pub mtime: u64,
    pub kind: FileKind,
    pub nlink: u32,
}

/// A replicated filesystem bound to one replica of the move-tree.
///
/// The forest has three fixed top-level nodes: `root` (the visible
/// namespace), `fileinodes` (file inode storage), and `trash` (logical
/// deletion). They are minted under the reserved replica id, so every
/// replica agrees on them from birth.
pub struct TreeFs {
    pub(crate) replica: Replica<FsMeta>,
    pub(crate) policy: ConflictPolicy,
}

impl TreeFs {
    pub const ROOT: NodeId = NodeId::well_known(1);
    pub const FILEINODES: NodeId = NodeId::well_known(2);
    pub const TRASH: NodeId = NodeId::well_known(3);

    /// Create a filesystem replica and initialize the three top-level nodes.
    pub fn new(id: ReplicaId, peers: impl IntoIterator<Item = ReplicaId>) -> Self {
        Self::with_policy(id, peers, ConflictPolicy::RenameAll)
    }

    /// Create with an explicit name-collision policy.
    pub fn with_policy(
        id: ReplicaId,
        peers: impl IntoIterator<Item = ReplicaId>,
        policy: ConflictPolicy,
    ) -> Self {
        let mut replica = Replica::new(id, peers);
        // The three fixed roots are minted under the reserved replica with
        // fixed timestamps and epoch ctimes, so every replica starts from a
        // bit-identical forest without exchanging anything.
        let init_ts = |counter| LamportTs::at(counter, ReplicaId::RESERVED);
        let init = vec![
            OpMove::new(init_ts(1), None, FsMeta::dir("root", 0), Self::ROOT),
            OpMove::new(init_ts(2), None, FsMeta::dir("fileinodes", 0), Self::FILEINODES),
            OpMove::new(init_ts(3), None, FsMeta::dir("trash", 0), Self::TRASH),
        ];
        replica
            .apply_ops(&init)
            .expect("fresh replica accepts init ops");
        TreeFs { replica, policy }
    }

    /// The underlying replica (log access for exchange and tests).
    pub fn replica(&self) -> &Replica<FsMeta> {
        &self.replica
    }

    /// The newest `n` local log entries, oldest of them first - the batch a
    /// transport layer would ship to peers.
    pub fn recent_entries(&self, n: usize) -> Vec<LogOpMove<FsMeta>> {
        let mut entries: Vec<_> = self.replica.state().log().take(n).cloned().collect();
        entries.reverse();
        entries
    }

    /// Ingest log entries from a peer, then reconcile any name collisions
    /// the merge surfaced. The reconciliation ops are themselves replicated,
    /// so a second merge round converges all replicas.
    pub fn merge_from(&mut self, entries: &[LogOpMove<FsMeta>]) -> Result<()> {
        self.replica.apply_log_ops(entries)?;
        self.reconcile(entries)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Resolve a `/`-separated path from the root.
    ///
    /// Returns the exposed inode number, or [`NULL_INO`] when any segment
    /// is missing (a cacheable negative lookup, not an error).
    pub fn lookup(&self, path: &str) -> Ino {
        let mut current = Self::ROOT;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match self.child_by_name(current, segment) {
                Some((child, meta)) => {
                    current = match meta {
                        FsMeta::FileRef { inode, .. } => *inode,
                        _ => child,
                    };
                }
                None => return NULL_INO,
            }
        }
        current.as_u64()
    }

    /// Attributes for an inode. File references resolve to their inode.
    pub fn getattr(&self, ino: Ino) -> Result<FileAttr> {
        let node = self.node(ino)?;
        match &node.meta {
            FsMeta::Dir { size, ctime, mtime, .. } => Ok(FileAttr {
                ino,
                size: *size,
                ctime: *ctime,
                mtime: *mtime,
                kind: FileKind::Directory,
                nlink: 2,
            }),
            FsMeta::Symlink { size, ctime, mtime, .. } => Ok(FileAttr {
                ino,
                size: *size,
                ctime: *ctime,
                mtime: *mtime,
                kind: FileKind::Symlink,
                nlink: 1,
            }),
            FsMeta::FileInode {
                size,
                ctime,
                mtime,
                nlink,
                ..
            } => Ok(FileAttr {
                ino,
                size: *size,
                ctime: *ctime,
                mtime: *mtime,
                kind: FileKind::File,
                nlink: *nlink,
            }),
            FsMeta::FileRef { inode, .. } => self.getattr(inode.as_u64()),
            FsMeta::Null => Err(FsError::NotFound(ino)),
        }
    }

    /// The directory entry at `offset` in `dir`, or `None` past the end.
    ///
    /// Entries come in node-id order, identical on every replica.
    pub fn readdir(&self, dir: Ino, offset: usize) -> Result<Option<(String, Ino)>> {
        let dir_id = self.dir_id(dir)?;
        let children = self.replica.tree().children(dir_id);
        let Some(&child) = children.get(offset) else {
            return Ok(None);
        };
        let node = self
            .replica
            .tree()
            .find(child)
            .ok_or(FsError::NotFound(child.as_u64()))?;
        let name = node.meta.name().unwrap_or_default().to_string();
        let ino = match &node.meta {
            FsMeta::FileRef { inode, .. } => inode.as_u64(),
            _ => child.as_u64(),
        };
        Ok(Some((name, ino)))
    }

    /// The target of a symlink.
    pub fn readlink(&self, ino: Ino) -> Result<String> {
        match &self.node(ino)?.meta {
            FsMeta::Symlink { target, .. } => Ok(target.clone()),
            _ => Err(FsError::NotASymlink(ino)),
        }
    }

    /// The full content of a file inode.
    ///
    /// Content lives inside replicated metadata in this prototype; a real
    /// deployment would hold a content-addressed pointer here instead.
    pub fn read(&self, ino: Ino) -> Result<String> {
        match &self.node(ino)?.meta {
            FsMeta::FileInode { content, .. } => Ok(content.clone()),
            _ => Err(FsError::NotAFile(ino)),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Create a directory under `parent`.
    pub fn mkdir(&mut self, parent: Ino, name: &str) -> Result<Ino> {
        let parent_id = self.dir_id(parent)?;
        self.ensure_name_free(parent_id, name)?;

        let dir_id = self.replica.mint_id();
        let op = OpMove::new(
            self.replica.tick(),
            Some(parent_id),
            FsMeta::dir(name, unix_now()),
            dir_id,
        );
        self.replica.apply_ops(&[op])?;
        Ok(dir_id.as_u64())
    }

    /// Create an empty regular file under `parent`.
    ///
    /// Two moves: the file inode appears under `fileinodes` with one link,
    /// and a reference to it appears under `parent` carrying the name.
    pub fn mknod(&mut self, parent: Ino, name: &str) -> Result<Ino> {
        let parent_id = self.dir_id(parent)?;
        self.ensure_name_free(parent_id, name)?;

        let inode_id = self.replica.mint_id();
        let ref_id = self.replica.mint_id();
        let ops = vec![
            OpMove::new(
                self.replica.tick(),
                Some(Self::FILEINODES),
                FsMeta::file_inode(unix_now()),
                inode_id,
            ),
            OpMove::new(
                self.replica.tick(),
                Some(parent_id),
                FsMeta::file_ref(name, inode_id),
                ref_id,
            ),
        ];
        self.replica.apply_ops(&ops)?;
        Ok(inode_id.as_u64())
    }

    /// Add a hard link named `name` under `parent` to the file inode
    /// `target`.
    pub fn link(&mut self, target: Ino, parent: Ino, name: &str) -> Result<Ino> {
        let parent_id = self.dir_id(parent)?;
        self.ensure_name_free(parent_id, name)?;

        let inode_id = NodeId::from_u64(target);
        let meta = match &self.node(target)?.meta {
            FsMeta::FileInode { .. } => self.bump_nlink(inode_id, 1)?,
            _ => return Err(FsError::NotAFile(target)),
        };

        let ref_id = self.replica.mint_id();
        let ops = vec![
            // Rewrite the inode in place with the raised link count.
            OpMove::new(self.replica.tick(), Some(Self::FILEINODES), meta, inode_id),
            OpMove::new(
                self.replica.tick(),
                Some(parent_id),
                FsMeta::file_ref(name, inode_id),
                ref_id,
            ),
        ];
        self.replica.apply_ops(&ops)?;
        Ok(target)
    }

    /// Remove the directory entry `name` under `parent`.
    ///
    /// The reference moves to trash; the inode's link count drops, and when
    /// it reaches zero the inode itself moves to trash. There is no
    /// resurrection from there.
    pub fn unlink(&mut self, parent: Ino, name: &str) -> Result<()> {
        let parent_id = self.dir_id(parent)?;
        let (ref_id, meta) = self
            .child_by_name(parent_id, name)
            .ok_or_else(|| FsError::NoSuchEntry(name.to_string()))?;
        let FsMeta::FileRef { inode, .. } = meta else {
            return Err(FsError::NotAFile(ref_id.as_u64()));
        };
        let inode_id = *inode;

        let nlink = match &self.node(inode_id.as_u64())?.meta {
            FsMeta::FileInode { nlink, .. } => *nlink,
            _ => return Err(FsError::NotAFile(inode_id.as_u64())),
        };
        let inode_op = if nlink <= 1 {
            OpMove::new(
                self.replica.tick(),
                Some(Self::TRASH),
                FsMeta::Null,
                inode_id,
            )
        } else {
            let meta = self.bump_nlink(inode_id, -1)?;
            OpMove::new(self.replica.tick(), Some(Self::FILEINODES), meta, inode_id)
        };

        let ops = vec![
            OpMove::new(self.replica.tick(), Some(Self::TRASH), FsMeta::Null, ref_id),
            inode_op,
        ];
        self.replica.apply_ops(&ops)?;
        Ok(())
    }

    /// Move/rename `name` from `parent` to `newname` under `newparent`.
    pub fn rename(
        &mut self,
        parent: Ino,
        name: &str,
        newparent: Ino,
        newname: &str,
    ) -> Result<()> {
        let parent_id = self.dir_id(parent)?;
        let newparent_id = self.dir_id(newparent)?;
        let (child, meta) = self
            .child_by_name(parent_id, name)
            .ok_or_else(|| FsError::NoSuchEntry(name.to_string()))?;
        let renamed = meta.with_name(newname);

        match self.child_by_name(newparent_id, newname) {
            Some((existing, _)) if existing != child => {
                return Err(FsError::AlreadyExists(newname.to_string()))
            }
            _ => {}
        }

        let op = OpMove::new(self.replica.tick(), Some(newparent_id), renamed, child);
        self.replica.apply_ops(&[op])?;
        Ok(())
    }

    /// Remove the empty directory `name` under `parent`.
    pub fn rmdir(&mut self, parent: Ino, name: &str) -> Result<()> {
        let parent_id = self.dir_id(parent)?;
        let (child, meta) = self
            .child_by_name(parent_id, name)
            .ok_or_else(|| FsError::NoSuchEntry(name.to_string()))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(child.as_u64()));
        }
        if !self.replica.tree().children(child).is_empty() {
            return Err(FsError::DirectoryNotEmpty(name.to_string()));
        }

        let op = OpMove::new(self.replica.tick(), Some(Self::TRASH), FsMeta::Null, child);
        self.replica.apply_ops(&[op])?;
        Ok(())
    }

    /// Create a symlink named `name` under `parent` pointing at
    /// `target_path`.
    pub fn symlink(&mut self, target_path: &str, parent: Ino, name: &str) -> Result<Ino> {
        let parent_id = self.dir_id(parent)?;
        self.ensure_name_free(parent_id, name)?;

        let link_id = self.replica.mint_id();
        let op = OpMove::new(
            self.replica.tick(),
            Some(parent_id),
            FsMeta::symlink(name, target_path, unix_now()),
            link_id,
        );
        self.replica.apply_ops(&[op])?;
        Ok(link_id.as_u64())
    }

    /// Append `data` to the file inode `ino`.
    pub fn write(&mut self, ino: Ino, data: &str) -> Result<()> {
        let inode_id = NodeId::from_u64(ino);
        let meta = match &self.node(ino)?.meta {
            FsMeta::FileInode {
                ctime,
                nlink,
                content,
                ..
            } => {
                let mut content = content.clone();
                content.push_str(data);
                FsMeta::FileInode {
                    size: content.len() as u64,
                    ctime: *ctime,
                    mtime: unix_now(),
                    nlink: *nlink,
                    content,
                }
            }
            _ => return Err(FsError::NotAFile(ino)),
        };

        let op = OpMove::new(self.replica.tick(), Some(Self::FILEINODES), meta, inode_id);
        self.replica.apply_ops(&[op])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn node(&self, ino: Ino) -> Result<&TreeNode<FsMeta>> {
        self.replica
            .tree()
            .find(NodeId::from_u64(ino))
            .ok_or(FsError::NotFound(ino))
    }

    /// Resolve `ino` to a directory node id.
    fn dir_id(&self, ino: Ino) -> Result<NodeId> {
        let node = self.node(ino)?;
        if node.meta.is_dir() {
            Ok(NodeId::from_u64(ino))
        } else {
            Err(FsError::NotADirectory(ino))
        }
    }

    /// Find the child of `parent` answering to `name`.
    pub(crate) fn child_by_name(&self, parent: NodeId, name: &str) -> Option<(NodeId, &FsMeta)> {
        let tree = self.replica.tree();
        for child in tree.children(parent) {
            if let Some(node) = tree.find(child) {
                if node.meta.name() == Some(name) {
                    return Some((child, &node.meta));
                }
            }
        }
        None
    }

    fn ensure_name_free(&self, parent: NodeId, name: &str) -> Result<()> {
        if self.child_by_name(parent, name).is_some() {
            return Err(FsError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    /// The inode's metadata with its link count adjusted by `delta`.
    fn bump_nlink(&self, inode: NodeId, delta: i64) -> Result<FsMeta> {
        match &self.node(inode.as_u64())?.meta {
            FsMeta::FileInode {
                size,
                ctime,
                mtime,
                nlink,
                content,
            } => Ok(FsMeta::FileInode {
                size: *size,
                ctime: *ctime,
                mtime: *mtime,
                nlink: (*nlink as i64 + delta).max(0) as u32,
                content: content.clone(),
            }),
            _ => Err(FsError::NotAFile(inode.as_u64())),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
