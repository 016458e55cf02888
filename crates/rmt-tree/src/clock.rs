//! Lamport timestamps tagged with replica identity.
//!
//! The pair (counter, actor) is totally ordered: counters compare first and
//! the actor id breaks ties. With unique actor ids no two replicas can ever
//! mint the same timestamp, which the move-op engine depends on.

use rmt_core::ReplicaId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Lamport timestamp.
///
/// The derived `Ord` compares `counter` first, then `actor` - the total
/// order the log and the convergence argument rely on.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LamportTs {
    counter: u64,
    actor: ReplicaId,
}

impl LamportTs {
    /// The zero timestamp for `actor`; every minted timestamp exceeds it.
    pub fn new(actor: ReplicaId) -> Self {
        LamportTs { counter: 0, actor }
    }

    /// A timestamp at an explicit counter value.
    pub fn at(counter: u64, actor: ReplicaId) -> Self {
        LamportTs { counter, actor }
    }

    /// The next timestamp for the same actor.
    pub fn inc(self) -> Self {
        LamportTs {
            counter: self.counter + 1,
            actor: self.actor,
        }
    }

    /// Absorb a peer timestamp: keep the larger counter, keep our actor.
    ///
    /// After merging, the next `inc()` strictly exceeds both inputs.
    pub fn merge(self, other: LamportTs) -> Self {
        LamportTs {
            counter: self.counter.max(other.counter),
            actor: self.actor,
        }
    }

    pub fn counter(self) -> u64 {
        self.counter
    }

    pub fn actor(self) -> ReplicaId {
        self.actor
    }
}

impl fmt::Display for LamportTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: u16) -> ReplicaId {
        ReplicaId::new(id)
    }

    #[test]
    fn test_clock_orders_by_counter_first() {
        let a = LamportTs::at(1, r(2));
        let b = LamportTs::at(2, r(1));
        assert!(a < b);
    }

    #[test]
    fn test_clock_breaks_ties_by_actor() {
        let a = LamportTs::at(5, r(1));
        let b = LamportTs::at(5, r(2));
        assert!(a < b);
        assert!(a != b);
    }

    #[test]
    fn test_clock_inc_preserves_actor() {
        let ts = LamportTs::new(r(3)).inc().inc();
        assert_eq!(ts.counter(), 2);
        assert_eq!(ts.actor(), r(3));
    }

    #[test]
    fn test_clock_merge_absorbs_peer_progress() {
        let local = LamportTs::at(3, r(1));
        let remote = LamportTs::at(9, r(2));

        let merged = local.merge(remote);
        assert_eq!(merged.counter(), 9);
        assert_eq!(merged.actor(), r(1));

        // The next local timestamp strictly exceeds everything seen.
        assert!(merged.inc() > remote);
        assert!(merged.inc() > local);
    }

    #[test]
    fn test_clock_merge_with_older_peer_is_noop() {
        let local = LamportTs::at(7, r(1));
        let merged = local.merge(LamportTs::at(2, r(2)));
        assert_eq!(merged, local);
    }

    #[test]
    fn test_clock_serialization() {
        let ts = LamportTs::at(42, r(7));
        let json = serde_json::to_string(&ts).unwrap();
        let back: LamportTs = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
