//! Filesystem metadata carried inside tree nodes.
//!
//! Two-layer file model: a file is one *inode* node under `/fileinodes`
//! holding size, times, link count, and content, plus one *reference* node
//! per directory entry pointing at it by id. Hard links are multiple
//! references sharing an inode. Directories and symlinks are single nodes
//! living directly in the name tree.

use rmt_tree::NodeId;
use serde::{Deserialize, Serialize};

/// The metadata variants a tree node can carry.
///
/// `Null` is used for moves to trash: logical deletion changes a node's
/// parent, not its payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsMeta {
    Dir {
        name: String,
        size: u64,
        ctime: u64,
        mtime: u64,
    },
    Symlink {
        name: String,
        size: u64,
        ctime: u64,
        mtime: u64,
        target: String,
    },
    FileRef {
        name: String,
        inode: NodeId,
    },
    FileInode {
        size: u64,
        ctime: u64,
        mtime: u64,
        nlink: u32,
        content: String,
    },
    Null,
}

impl FsMeta {
    /// A fresh directory entry.
    pub fn dir(name: impl Into<String>, now: u64) -> Self {
        FsMeta::Dir {
            name: name.into(),
            size: 0,
            ctime: now,
            mtime: now,
        }
    }

    /// A fresh symlink entry pointing at `target`.
    pub fn symlink(name: impl Into<String>, target: impl Into<String>, now: u64) -> Self {
        let target = target.into();
        FsMeta::Symlink {
            name: name.into(),
            size: target.len() as u64,
            ctime: now,
            mtime: now,
            target,
        }
    }

    /// A directory entry referencing the file inode `inode`.
    pub fn file_ref(name: impl Into<String>, inode: NodeId) -> Self {
        FsMeta::FileRef {
            name: name.into(),
            inode,
        }
    }

    /// A fresh, empty file inode with a single link.
    pub fn file_inode(now: u64) -> Self {
        FsMeta::FileInode {
            size: 0,
            ctime: now,
            mtime: now,
            nlink: 1,
            content: String::new(),
        }
    }

    /// The name this node answers to in its directory, if it has one.
    /// File inodes and trashed (`Null`) nodes are nameless.
    pub fn name(&self) -> Option<&str> {
        match self {
            FsMeta::Dir { name, .. }
            | FsMeta::Symlink { name, .. }
            | FsMeta::FileRef { name, .. } => Some(name),
            FsMeta::FileInode { .. } | FsMeta::Null => None,
        }
    }

    /// A copy of this metadata carrying `new_name` instead.
    /// Identity for nameless variants.
    pub fn with_name(&self, new_name: impl Into<String>) -> Self {
        let mut meta = self.clone();
        match &mut meta {
            FsMeta::Dir { name, .. }
            | FsMeta::Symlink { name, .. }
            | FsMeta::FileRef { name, .. } => *name = new_name.into(),
            FsMeta::FileInode { .. } | FsMeta::Null => {}
        }
        meta
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FsMeta::Dir { .. })
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, FsMeta::Symlink { .. })
    }

    pub fn is_file_ref(&self) -> bool {
        matches!(self, FsMeta::FileRef { .. })
    }

    pub fn is_file_inode(&self) -> bool {
        matches!(self, FsMeta::FileInode { .. })
    }
}
