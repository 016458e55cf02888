//! Positive-negative counter built from two grow-only counters.
//!
//! A PN-counter supports both increment and decrement by keeping one
//! grow-only counter for increments (P) and one for decrements (N).
//! The value is P - N; merging merges the halves independently.

use crate::convergent::Convergent;
use crate::gcounter::GCounter;
use crate::ids::ReplicaId;
use serde::{Deserialize, Serialize};

/// A positive-negative counter over a fixed replica group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PNCounter {
    /// Increment half.
    p: GCounter,
    /// Decrement half.
    n: GCounter,
}

impl PNCounter {
    /// Create a counter for `own` with slots for every replica in the group.
    pub fn new(own: ReplicaId, all: impl IntoIterator<Item = ReplicaId> + Clone) -> Self {
        Self {
            p: GCounter::new(own, all.clone()),
            n: GCounter::new(own, all),
        }
    }

    /// The replica that owns this copy.
    pub fn replica_id(&self) -> ReplicaId {
        self.p.replica_id()
    }

    /// Bump the owning replica's increment slot by `step`.
    pub fn increment(&mut self, step: u64) {
        self.p.increment(step);
    }

    /// Bump the owning replica's decrement slot by `step`.
    pub fn decrement(&mut self, step: u64) {
        self.n.increment(step);
    }

    /// Current value: sum of increments minus sum of decrements.
    pub fn value(&self) -> i64 {
        (self.p.value() as i64).saturating_sub(self.n.value() as i64)
    }

    /// The increment half.
    pub fn positive(&self) -> &GCounter {
        &self.p
    }

    /// The decrement half.
    pub fn negative(&self) -> &GCounter {
        &self.n
    }
}

impl Convergent for PNCounter {
    fn merge(&mut self, other: &Self) {
        self.p.merge(&other.p);
        self.n.merge(&other.n);
    }
}
