//! # rmt-tree
//!
//! A replicated move-tree: a strongly-eventually-consistent tree that
//! supports arbitrary concurrent move operations, after Kleppmann et al.,
//! "A highly-available move operation for replicated trees and distributed
//! filesystems".
//!
//! The single mutation primitive is the move operation: "at time `t`, node
//! `c` has parent `p` with metadata `m`". Each replica keeps a log of applied
//! moves in reverse timestamp order together with the parent each move
//! displaced; an operation arriving out of order is slotted into place by
//! undoing newer log entries, applying it, and redoing the rest. The final
//! tree depends only on the set of operations, never on arrival order.
//!
//! ## Example
//!
//! ```rust
//! use rmt_core::ReplicaId;
//! use rmt_tree::{OpMove, Replica};
//!
//! let mut replica: Replica<&str> = Replica::new(ReplicaId::new(1), []);
//! let root = replica.mint_id();
//! let child = replica.mint_id();
//!
//! let ops = vec![
//!     OpMove::new(replica.tick(), None, "root", root),
//!     OpMove::new(replica.tick(), Some(root), "child", child),
//! ];
//! replica.apply_ops(&ops).unwrap();
//!
//! assert_eq!(replica.tree().children(root), vec![child]);
//! ```

pub mod clock;
pub mod error;
pub mod ids;
pub mod op;
pub mod replica;
pub mod state;
pub mod tree;

pub use clock::LamportTs;
pub use error::TreeError;
pub use ids::NodeId;
pub use op::{LogOpMove, OldParent, OpMove};
pub use replica::Replica;
pub use state::{is_ancestor, State};
pub use tree::{Tree, TreeNode};
