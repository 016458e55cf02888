//! The move-op engine: do/undo/redo and order-independent application.
//!
//! `apply_op` slots an operation into its timestamp position by undoing every
//! newer log entry, applying the new one, and redoing the rest. Because the
//! cycle guard in `do_op` then fires identically on every replica, the final
//! tree depends only on the set of operations applied, not their order.

use crate::error::TreeError;
use crate::ids::NodeId;
use crate::op::{LogOpMove, OldParent, OpMove};
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Walk parent pointers from `node` upward; true if `ancestor` is met.
///
/// Reaching a node with no parent (or no mapping at all) ends the walk.
pub fn is_ancestor<M>(tree: &Tree<M>, node: NodeId, ancestor: NodeId) -> bool {
    let mut current = node;
    while let Some(parent) = tree.find(current).and_then(|n| n.parent) {
        if parent == ancestor {
            return true;
        }
        current = parent;
    }
    false
}

/// One replica's mutable CRDT state: the tree plus the operation log.
///
/// The log is kept front-newest, strictly descending by timestamp. Undo pops
/// from the front, redo pushes back on, and truncation drains the back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State<M> {
    log: VecDeque<LogOpMove<M>>,
    tree: Tree<M>,
}

impl<M: Clone> State<M> {
    pub fn new() -> Self {
        State {
            log: VecDeque::new(),
            tree: Tree::new(),
        }
    }

    /// The current tree.
    pub fn tree(&self) -> &Tree<M> {
        &self.tree
    }

    /// Log entries, newest first.
    pub fn log(&self) -> impl Iterator<Item = &LogOpMove<M>> {
        self.log.iter()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// True when adjacent log entries are strictly descending by timestamp.
    pub fn log_is_descending(&self) -> bool {
        self.log
            .iter()
            .zip(self.log.iter().skip(1))
            .all(|(a, b)| a.timestamp > b.timestamp)
    }

    /// Apply `op` to the tree, returning the log entry that records it.
    ///
    /// The only rejection rule of the whole algorithm lives here: a move
    /// that would reparent a node under itself or under one of its
    /// descendants leaves the tree untouched (the entry still records the
    /// displaced state so undo works uniformly). Convergence depends on
    /// this guard firing identically on every replica once operations are
    /// ordered.
    pub fn do_op(op: &OpMove<M>, tree: &mut Tree<M>) -> LogOpMove<M> {
        let old_parent = tree.find(op.child).map(|n| OldParent {
            parent: n.parent,
            meta: n.meta.clone(),
        });

        let entry = LogOpMove {
            timestamp: op.timestamp,
            parent: op.parent,
            meta: op.meta.clone(),
            child: op.child,
            old_parent,
        };

        let introduces_cycle = op.parent == Some(op.child)
            || op
                .parent
                .map(|p| is_ancestor(tree, p, op.child))
                .unwrap_or(false);
        if introduces_cycle {
            debug!(ts = %op.timestamp, child = %op.child, "move skipped by cycle guard");
            return entry;
        }

        tree.remove(op.child);
        tree.add(op.child, op.parent, op.meta.clone());
        entry
    }

    /// Invert a logged move, restoring exactly the state it displaced.
    pub fn undo_op(entry: &LogOpMove<M>, tree: &mut Tree<M>) {
        tree.remove(entry.child);
        if let Some(old) = &entry.old_parent {
            tree.add(entry.child, old.parent, old.meta.clone());
        }
    }

    /// Reapply a logged move on the current tree.
    ///
    /// The returned entry's `old_parent` is computed afresh; the tree may
    /// have changed since the entry was first recorded.
    pub fn redo_op(entry: &LogOpMove<M>, tree: &mut Tree<M>) -> LogOpMove<M> {
        Self::do_op(&entry.as_op(), tree)
    }

    /// Apply one operation, reordering effects so the result is as if all
    /// operations had arrived in timestamp order.
    ///
    /// Iterative on purpose: the undo depth equals the number of log entries
    /// newer than `op`, which on a long-lived replica can exceed any native
    /// stack.
    pub fn apply_op(&mut self, op: OpMove<M>) -> Result<(), TreeError> {
        let mut undone: Vec<LogOpMove<M>> = Vec::new();

        loop {
            match self.log.front() {
                Some(head) if head.timestamp == op.timestamp => {
                    // Timestamps are unique by construction; hitting one is a
                    // protocol violation. Roll the undone prefix back in
                    // before surfacing it so the state stays whole.
                    for entry in undone.into_iter().rev() {
                        let redone = Self::redo_op(&entry, &mut self.tree);
                        self.log.push_front(redone);
                    }
                    return Err(TreeError::DuplicateTimestamp(op.timestamp));
                }
                Some(head) if head.timestamp > op.timestamp => {
                    let entry = self.log.pop_front().expect("peeked entry");
                    Self::undo_op(&entry, &mut self.tree);
                    undone.push(entry);
                }
                _ => break,
            }
        }

        let entry = Self::do_op(&op, &mut self.tree);
        self.log.push_front(entry);

        for entry in undone.into_iter().rev() {
            let redone = Self::redo_op(&entry, &mut self.tree);
            self.log.push_front(redone);
        }

        debug_assert!(self.log_is_descending());
        debug_assert!(self.tree.index_consistent());
        Ok(())
    }

    /// Drop every log entry with a timestamp strictly below `threshold`,
    /// returning how many were removed.
    ///
    /// Only safe for causally stable thresholds; see the replica layer.
    pub(crate) fn truncate_before(
        &mut self,
        threshold: crate::clock::LamportTs,
    ) -> usize {
        let mut removed = 0;
        while matches!(self.log.back(), Some(entry) if entry.timestamp < threshold) {
            self.log.pop_back();
            removed += 1;
        }
        removed
    }
}

impl<M: Clone> Default for State<M> {
    fn default() -> Self {
        Self::new()
    }
}
