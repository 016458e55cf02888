//! Error types for the filesystem layer.
//!
//! Every rejection happens before any operation is emitted, so a failed call
//! leaves the replica exactly as it was.

use rmt_tree::TreeError;
use thiserror::Error;

/// Errors surfaced by filesystem calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: inode {0}")]
    NotFound(u64),

    #[error("no such entry: {0}")]
    NoSuchEntry(String),

    #[error("not a directory: inode {0}")]
    NotADirectory(u64),

    #[error("not a regular file: inode {0}")]
    NotAFile(u64),

    #[error("not a symlink: inode {0}")]
    NotASymlink(u64),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type Result<T> = std::result::Result<T, FsError>;
