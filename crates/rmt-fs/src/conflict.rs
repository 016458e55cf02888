//! Name-collision reconciliation after a merge.
//!
//! Two replicas may concurrently create same-named children of one
//! directory; the tree happily holds both. After absorbing remote entries,
//! the filesystem scans the directories those entries touched and emits
//! rename operations for any name now claimed more than once. The renames
//! are ordinary replicated moves with deterministic target names, so every
//! replica computes the same fix and a second merge round converges.

use crate::error::Result;
use crate::fs::TreeFs;
use crate::meta::FsMeta;
use rmt_tree::{LamportTs, LogOpMove, NodeId, OpMove};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// How to resolve several children of one directory sharing a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Rename every colliding child to `<name>.conflict.<creator>`.
    RenameAll,
    /// Keep the child with the newest operation; rename the rest.
    LastWriterWins,
}

/// The deterministic conflict name for a child created by `creator`.
fn conflict_name(name: &str, child: NodeId) -> String {
    format!("{}.conflict.{}", name, child.actor().as_u16())
}

impl TreeFs {
    /// Scan the `(parent, name)` pairs the absorbed entries touched and
    /// emit rename ops for every collision, per the configured policy.
    pub(crate) fn reconcile(&mut self, absorbed: &[LogOpMove<FsMeta>]) -> Result<()> {
        let mut touched: BTreeSet<(NodeId, String)> = BTreeSet::new();
        for entry in absorbed {
            if let (Some(parent), Some(name)) = (entry.parent, entry.meta.name()) {
                touched.insert((parent, name.to_string()));
            }
        }

        for (parent, name) in touched {
            self.resolve_collision(parent, &name)?;
        }
        Ok(())
    }

    fn resolve_collision(&mut self, parent: NodeId, name: &str) -> Result<()> {
        let tree = self.replica.tree();
        let mut colliding: Vec<NodeId> = tree
            .children(parent)
            .into_iter()
            .filter(|&child| {
                tree.find(child)
                    .map(|node| node.meta.name() == Some(name))
                    .unwrap_or(false)
            })
            .collect();
        if colliding.len() < 2 {
            return Ok(());
        }

        if self.policy == ConflictPolicy::LastWriterWins {
            // Newest writer keeps the name; `None` (entry truncated away)
            // sorts oldest. Ties cannot happen - timestamps are unique.
            colliding.sort_by_key(|&child| std::cmp::Reverse(self.latest_op_ts(child)));
            colliding.remove(0);
        }

        let mut ops: Vec<OpMove<FsMeta>> = Vec::new();
        for child in colliding {
            let Some(node) = self.replica.tree().find(child) else {
                continue;
            };
            let new_name = conflict_name(name, child);
            debug!(%child, %new_name, "renaming name-collision loser");
            let meta = node.meta.with_name(&new_name);
            ops.push(OpMove::new(self.replica.tick(), Some(parent), meta, child));
        }
        self.replica.apply_ops(&ops)?;
        Ok(())
    }

    /// The newest log entry touching `child`, if the log still holds one.
    fn latest_op_ts(&self, child: NodeId) -> Option<LamportTs> {
        self.replica
            .state()
            .log()
            .find(|entry| entry.child == child)
            .map(|entry| entry.timestamp)
    }
}
