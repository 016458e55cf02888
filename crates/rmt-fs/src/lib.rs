//! # rmt-fs
//!
//! A prototype distributed filesystem projected onto the replicated
//! move-tree. Each FUSE-style call becomes a batch of move operations, so
//! the whole namespace replicates and converges like any other tree data:
//! concurrent renames, moves, even would-be cycles all resolve without
//! coordination.
//!
//! Layout: the visible namespace hangs under `root`; file inodes live under
//! `fileinodes` and are pointed at by per-directory reference nodes (hard
//! links are just multiple references); deletion moves nodes to `trash`.
//!
//! ## Example
//!
//! ```rust
//! use rmt_core::ReplicaId;
//! use rmt_fs::TreeFs;
//!
//! let mut fs = TreeFs::new(ReplicaId::new(1), [ReplicaId::new(1), ReplicaId::new(2)]);
//! let root = TreeFs::ROOT.as_u64();
//!
//! let home = fs.mkdir(root, "home").unwrap();
//! let file = fs.mknod(home, "notes.txt").unwrap();
//! fs.write(file, "remember the milk").unwrap();
//!
//! assert_eq!(fs.lookup("/home/notes.txt"), file);
//! assert_eq!(fs.read(file).unwrap(), "remember the milk");
//! ```

pub mod conflict;
pub mod error;
pub mod fs;
pub mod meta;

pub use conflict::ConflictPolicy;
pub use error::FsError;
pub use fs::{FileAttr, FileKind, Ino, TreeFs, NULL_INO};
pub use meta::FsMeta;
