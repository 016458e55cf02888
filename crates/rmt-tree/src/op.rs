//! The move operation and its logged form.

use crate::clock::LamportTs;
use crate::ids::NodeId;
use serde::{Deserialize, Serialize};

/// The sole mutation primitive: "at time `timestamp`, node `child` has
/// parent `parent` with metadata `meta`".
///
/// A `None` parent makes (or keeps) the child a forest root. A move whose
/// child does not exist yet creates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpMove<M> {
    pub timestamp: LamportTs,
    pub parent: Option<NodeId>,
    pub meta: M,
    pub child: NodeId,
}

impl<M> OpMove<M> {
    pub fn new(timestamp: LamportTs, parent: Option<NodeId>, meta: M, child: NodeId) -> Self {
        OpMove {
            timestamp,
            parent,
            meta,
            child,
        }
    }
}

/// The parent/metadata pair a move displaced, captured at application time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OldParent<M> {
    pub parent: Option<NodeId>,
    pub meta: M,
}

/// A logged move: the operation plus what it displaced, enabling inversion.
///
/// `old_parent` is `None` when the move created the child. It is recomputed
/// every time the entry is redone, never carried across replicas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOpMove<M> {
    pub timestamp: LamportTs,
    pub parent: Option<NodeId>,
    pub meta: M,
    pub child: NodeId,
    pub old_parent: Option<OldParent<M>>,
}

impl<M: Clone> LogOpMove<M> {
    /// Reconstruct the original operation, dropping the captured state.
    pub fn as_op(&self) -> OpMove<M> {
        OpMove {
            timestamp: self.timestamp,
            parent: self.parent,
            meta: self.meta.clone(),
            child: self.child,
        }
    }
}
