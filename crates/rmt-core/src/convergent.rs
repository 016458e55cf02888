//! Merge contract for state-based replicated objects.
//!
//! A convergent object forms a join-semilattice under `merge`:
//!  - Commutativity: merge(a, b) = merge(b, a)
//! - Associativity: merge(merge(a, b), c) = merge(a, merge(b, c))
//! - Idempotence:  merge(a, a) = a
//!
//!  These properties guarantee convergence regardless of message order.

/// The merge contract all state-based types in this crate implement.
///
/// Unlike a free-standing lattice there is no bottom element here: the
/// counters carry a fixed replica membership chosen at construction, so an
/// "empty" value is only meaningful relative to that set.
pub trait Convergent {
    /// Absorb `other` into `self`.
    /// Must be commutative, associative, and idempotent.
    fn merge(&mut self, other: &Self);

    /// Merge without modifying `self`.
    fn merged(&self, other: &Self) -> Self
    where
        Self: Clone,
    {
        let mut out = self.clone();
        out.merge(other);
        out
    }
}
