//! Grow-only counter - per-replica slots that only ever increase.
//!  The simplest of the counter family and the building block for the rest.

use crate::convergent::Convergent;
use crate::ids::ReplicaId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A grow-only counter over a fixed replica group.
///
/// Each replica owns one slot it may only increase; the counter value is the
/// sum of all slots. Merging takes the per-slot maximum, which is commutative,
/// associative, and idempotent.
///
/// # Example
///
/// ```rust
/// use rmt_core::{Convergent, GCounter, ReplicaId};
///
/// let replicas = [ReplicaId::new(1), ReplicaId::new(2)];
/// let mut a = GCounter::new(ReplicaId::new(1), replicas);
/// let mut b = GCounter::new(ReplicaId::new(2), replicas);
///
/// a.increment(3);
/// b.increment(4);
///
/// a.merge(&b);
/// assert_eq!(a.value(), 7);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounter {
    /// The replica that owns this copy and may increment its slot.
    own: ReplicaId,
    /// Per-replica non-decreasing slots.
    slots: BTreeMap<ReplicaId, u64>,
}

impl GCounter {
    /// Create a counter for `own`, with a zeroed slot for every replica in
    /// the group (including `own`).
    pub fn new(own: ReplicaId, all: impl IntoIterator<Item = ReplicaId>) -> Self {
        let mut slots: BTreeMap<ReplicaId, u64> = all.into_iter().map(|id| (id, 0)).collect();
        slots.entry(own).or_insert(0);
        Self { own, slots }
    }

    /// The replica that owns this copy.
    pub fn replica_id(&self) -> ReplicaId {
        self.own
    }

    /// Bump the owning replica's slot by `step`.
    pub fn increment(&mut self, step: u64) {
        let entry = self.slots.entry(self.own).or_insert(0);
        *entry = entry.saturating_add(step);
    }

    /// Current counter value (sum of all slots).
    pub fn value(&self) -> u64 {
        self.slots.values().sum()
    }

    /// The slot for a specific replica.
    pub fn slot(&self, id: ReplicaId) -> u64 {
        self.slots.get(&id).copied().unwrap_or(0)
    }

    /// All slots, keyed by replica.
    pub fn slots(&self) -> &BTreeMap<ReplicaId, u64> {
        &self.slots
    }
}

impl Convergent for GCounter {
    /// Per-slot max over the union of both replica sets.
    fn merge(&mut self, other: &Self) {
        for (id, &v) in &other.slots {
            self.slots
                .entry(*id)
                .and_modify(|e| *e = (*e).max(v))
                .or_insert(v);
        }
    }
}
