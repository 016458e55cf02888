//! Tree state: the forward parent map and its inverse child index.
//!
//! This layer is deliberately dumb: it maintains the two maps atomically and
//! answers lookups. Cycle prevention is the move-op engine's job, not ours.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One node's record: its parent edge (None for forest roots) and metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode<M> {
    pub parent: Option<NodeId>,
    pub meta: M,
}

/// A forest keyed by child id, with an inverse parent index for O(1)
/// children lookup.
///
/// Invariants (checked by [`Tree::index_consistent`] in test builds):
/// - every child id appears at most once as a key,
/// - the inverse index agrees exactly with the forward map,
/// - no empty child sets linger in the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tree<M> {
    nodes: HashMap<NodeId, TreeNode<M>>,
    children: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl<M> Tree<M> {
    pub fn new() -> Self {
        Tree {
            nodes: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Look up a node's record.
    pub fn find(&self, child: NodeId) -> Option<&TreeNode<M>> {
        self.nodes.get(&child)
    }

    pub fn contains(&self, child: NodeId) -> bool {
        self.nodes.contains_key(&child)
    }

    /// The children of `parent`, sorted by node id.
    ///
    /// The sort gives every replica the same traversal order, which the
    /// filesystem layer exposes through readdir.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.children
            .get(&parent)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Install `child` under `parent` with `meta`, updating both maps.
    ///
    /// The caller must have removed any existing mapping for `child` first.
    pub fn add(&mut self, child: NodeId, parent: Option<NodeId>, meta: M) {
        debug_assert!(
            !self.nodes.contains_key(&child),
            "add over an existing mapping"
        );
        if let Some(p) = parent {
            self.children.entry(p).or_default().insert(child);
        }
        self.nodes.insert(child, TreeNode { parent, meta });
    }

    /// Remove `child`'s mapping, returning the displaced record.
    ///
    /// Only the child's own parent edge is cleared; nodes mapped *under*
    /// `child` keep pointing at it, so its entry in the inverse index stays.
    pub fn remove(&mut self, child: NodeId) -> Option<TreeNode<M>> {
        let node = self.nodes.remove(&child)?;
        if let Some(p) = node.parent {
            if let Some(set) = self.children.get_mut(&p) {
                set.remove(&child);
                if set.is_empty() {
                    self.children.remove(&p);
                }
            }
        }
        Some(node)
    }

    /// Depth-first walk from `root`, visiting `root` itself first and each
    /// node's children in sorted order.
    pub fn walk<F>(&self, root: NodeId, visitor: &mut F)
    where
        F: FnMut(NodeId, &TreeNode<M>),
    {
        if let Some(node) = self.find(root) {
            visitor(root, node);
        }
        for child in self.children(root) {
            self.walk(child, visitor);
        }
    }

    /// Number of mapped nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all (child, record) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &TreeNode<M>)> {
        self.nodes.iter()
    }

    /// Whether the inverse index agrees exactly with the forward map.
    pub fn index_consistent(&self) -> bool {
        // Every forward edge is indexed.
        for (&child, node) in &self.nodes {
            if let Some(p) = node.parent {
                match self.children.get(&p) {
                    Some(set) if set.contains(&child) => {}
                    _ => return false,
                }
            }
        }
        // Every indexed edge exists forward, and no set is empty.
        for (&parent, set) in &self.children {
            if set.is_empty() {
                return false;
            }
            for child in set {
                match self.nodes.get(child) {
                    Some(node) if node.parent == Some(parent) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl<M> Default for Tree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: PartialEq> PartialEq for Tree<M> {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl<M: Eq> Eq for Tree<M> {}
