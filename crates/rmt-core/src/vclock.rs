//! Vector clock for causal comparison.
//!
//! Tracks the highest counter seen from each replica. Two clocks are ordered
//! when one dominates the other componentwise, and concurrent when neither
//! does.

use crate::convergent::Convergent;
use crate::ids::ReplicaId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A vector clock over replica ids.
///
/// Missing entries read as zero, so clocks over different replica subsets
/// compare cleanly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    entries: BTreeMap<ReplicaId, u64>,
}

impl VectorClock {
    /// Create an empty vector clock.
    pub fn new() -> Self {
        VectorClock {
            entries: BTreeMap::new(),
        }
    }

    /// Create a vector clock from entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (ReplicaId, u64)>) -> Self {
        VectorClock {
            entries: entries.into_iter().filter(|&(_, c)| c > 0).collect(),
        }
    }

    /// Get the counter for a replica.
    pub fn get(&self, id: ReplicaId) -> u64 {
        self.entries.get(&id).copied().unwrap_or(0)
    }

    /// Set the counter for a replica.
    pub fn set(&mut self, id: ReplicaId, counter: u64) {
        if counter > 0 {
            self.entries.insert(id, counter);
        }
    }

    /// Increment the counter for a replica, returning the new value.
    pub fn increment(&mut self, id: ReplicaId) -> u64 {
        let entry = self.entries.entry(id).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Record that `counter` has been observed from `id`.
    pub fn observe(&mut self, id: ReplicaId, counter: u64) {
        let entry = self.entries.entry(id).or_insert(0);
        *entry = (*entry).max(counter);
    }

    /// Componentwise `self[r] >= other[r]` for all replicas.
    pub fn dominates(&self, other: &VectorClock) -> bool {
        other.entries.iter().all(|(&id, &c)| self.get(id) >= c)
    }

    /// `dominates(other)` and the clocks differ.
    pub fn strictly_dominates(&self, other: &VectorClock) -> bool {
        self.dominates(other) && self != other
    }

    /// Neither clock dominates the other.
    pub fn concurrent(&self, other: &VectorClock) -> bool {
        !self.dominates(other) && !other.dominates(self)
    }

    /// Iterate over all non-zero entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ReplicaId, &u64)> {
        self.entries.iter()
    }

    /// Number of replicas tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no replica has been observed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Convergent for VectorClock {
    /// Componentwise max.
    fn merge(&mut self, other: &Self) {
        for (&id, &c) in &other.entries {
            self.observe(id, c);
        }
    }
}
