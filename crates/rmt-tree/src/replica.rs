//! A replica: clock + state + peer bookkeeping.
//!
//! Each replica owns its state exclusively; replicas exchange serialized log
//! entries and feed them to each other through [`Replica::apply_log_ops`].
//! There is no shared memory and no implicit networking. Everything the
//! source system kept in module-level counters lives here as per-replica
//! fields.

use crate::clock::LamportTs;
use crate::error::Result;
use crate::ids::NodeId;
use crate::op::{LogOpMove, OpMove};
use crate::state::State;
use crate::tree::Tree;
use rmt_core::ReplicaId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One participant: local clock, tree-plus-log state, and the table of the
/// latest timestamp observed from every known peer (drives log truncation).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Replica<M> {
    id: ReplicaId,
    clock: LamportTs,
    state: State<M>,
    peers: BTreeSet<ReplicaId>,
    latest_seen: BTreeMap<ReplicaId, LamportTs>,
    next_seq: u64,
}

impl<M: Clone> Replica<M> {
    /// Create a replica with the given identity and peer group. The
    /// replica's own id is ignored if present in `peers`.
    pub fn new(id: ReplicaId, peers: impl IntoIterator<Item = ReplicaId>) -> Self {
        Replica {
            id,
            clock: LamportTs::new(id),
            state: State::new(),
            peers: peers.into_iter().filter(|&p| p != id).collect(),
            latest_seen: BTreeMap::new(),
            next_seq: 1,
        }
    }

    pub fn id(&self) -> ReplicaId {
        self.id
    }

    /// The current clock value (last minted or merged timestamp).
    pub fn clock(&self) -> LamportTs {
        self.clock
    }

    pub fn state(&self) -> &State<M> {
        &self.state
    }

    pub fn tree(&self) -> &Tree<M> {
        self.state.tree()
    }

    /// Advance the clock and return a fresh timestamp for a local operation.
    pub fn tick(&mut self) -> LamportTs {
        self.clock = self.clock.inc();
        self.clock
    }

    /// Mint a node id unique across all replicas (creator in the high bits,
    /// local sequence in the low).
    pub fn mint_id(&mut self) -> NodeId {
        let id = NodeId::new(self.id, self.next_seq);
        self.next_seq += 1;
        id
    }

    /// Apply a batch of operations, local or remote, in the order given.
    ///
    /// After each application the clock absorbs the operation's timestamp
    /// (so the next `tick` exceeds everything seen) and, for ops from known
    /// peers, the latest-seen table is advanced.
    pub fn apply_ops(&mut self, ops: &[OpMove<M>]) -> Result<()> {
        for op in ops {
            self.state.apply_op(op.clone())?;
            self.clock = self.clock.merge(op.timestamp);
            let actor = op.timestamp.actor();
            if self.peers.contains(&actor) {
                self.latest_seen
                    .entry(actor)
                    .and_modify(|seen| *seen = (*seen).max(op.timestamp))
                    .or_insert(op.timestamp);
            }
        }
        Ok(())
    }

    /// Ingest log entries received from a peer.
    ///
    /// Each entry is reduced to its operation; the `old_parent` it carries
    /// reflects the *sender's* application order and is recomputed locally.
    pub fn apply_log_ops(&mut self, entries: &[LogOpMove<M>]) -> Result<()> {
        let ops: Vec<OpMove<M>> = entries.iter().map(|e| e.as_op()).collect();
        self.apply_ops(&ops)
    }

    /// The timestamp below which no future operation can possibly land.
    ///
    /// Defined once every known peer has reported at least one timestamp:
    /// the minimum of their latest timestamps. Each peer's clock has moved
    /// past its own latest, so nothing it sends later can sort at or below
    /// the minimum.
    pub fn causally_stable_threshold(&self) -> Option<LamportTs> {
        if self.peers.is_empty() {
            return None;
        }
        let mut min: Option<LamportTs> = None;
        for peer in &self.peers {
            let seen = self.latest_seen.get(peer)?;
            min = Some(match min {
                Some(current) => current.min(*seen),
                None => *seen,
            });
        }
        min
    }

    /// Drop log entries below the causally stable threshold.
    ///
    /// Returns true iff the threshold is defined and at least one entry was
    /// removed.
    pub fn truncate_log(&mut self) -> bool {
        let Some(threshold) = self.causally_stable_threshold() else {
            return false;
        };
        let removed = self.state.truncate_before(threshold);
        if removed > 0 {
            debug!(%threshold, removed, "truncated causally stable log entries");
        }
        removed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: u16) -> ReplicaId {
        ReplicaId::new(id)
    }

    fn group() -> [ReplicaId; 3] {
        [r(1), r(2), r(3)]
    }

    #[test]
    fn test_tick_is_monotonic() {
        let mut replica: Replica<&str> = Replica::new(r(1), group());
        let a = replica.tick();
        let b = replica.tick();
        assert!(b > a);
        assert_eq!(b.actor(), r(1));
    }

    #[test]
    fn test_mint_id_embeds_creator() {
        let mut replica: Replica<&str> = Replica::new(r(2), group());
        let a = replica.mint_id();
        let b = replica.mint_id();
        assert_ne!(a, b);
        assert_eq!(a.actor(), r(2));
        assert_eq!(b.seq(), a.seq() + 1);
    }

    #[test]
    fn test_apply_ops_merges_clock() {
        let mut r1: Replica<&str> = Replica::new(r(1), group());
        let remote = OpMove::new(LamportTs::at(10, r(2)), None, "root", NodeId::well_known(1));
        r1.apply_ops(&[remote]).unwrap();

        // Next local timestamp must exceed the remote one.
        assert!(r1.tick() > LamportTs::at(10, r(2)));
    }

    #[test]
    fn test_threshold_undefined_until_all_peers_report() {
        let mut r1: Replica<&str> = Replica::new(r(1), group());
        assert_eq!(r1.causally_stable_threshold(), None);

        let from_r2 = OpMove::new(LamportTs::at(4, r(2)), None, "x", NodeId::new(r(2), 1));
        r1.apply_ops(&[from_r2]).unwrap();
        // r3 has not reported yet.
        assert_eq!(r1.causally_stable_threshold(), None);

        let from_r3 = OpMove::new(LamportTs::at(7, r(3)), None, "y", NodeId::new(r(3), 1));
        r1.apply_ops(&[from_r3]).unwrap();
        assert_eq!(r1.causally_stable_threshold(), Some(LamportTs::at(4, r(2))));
    }

    #[test]
    fn test_threshold_tracks_latest_per_peer() {
        let mut r1: Replica<&str> = Replica::new(r(1), [r(1), r(2)]);
        let ops = vec![
            OpMove::new(LamportTs::at(2, r(2)), None, "a", NodeId::new(r(2), 1)),
            OpMove::new(LamportTs::at(8, r(2)), None, "b", NodeId::new(r(2), 2)),
        ];
        r1.apply_ops(&ops).unwrap();
        assert_eq!(r1.causally_stable_threshold(), Some(LamportTs::at(8, r(2))));
    }

    #[test]
    fn test_truncate_log_removes_stable_entries() {
        let mut r1: Replica<&str> = Replica::new(r(1), [r(2)]);

        let early = OpMove::new(LamportTs::at(1, r(2)), None, "a", NodeId::new(r(2), 1));
        let late = OpMove::new(LamportTs::at(9, r(2)), None, "b", NodeId::new(r(2), 2));
        r1.apply_ops(&[early, late]).unwrap();

        assert_eq!(r1.state().log_len(), 2);
        assert!(r1.truncate_log());
        // Entries strictly below 9@r2 are gone; the threshold entry stays.
        assert_eq!(r1.state().log_len(), 1);
        assert_eq!(
            r1.state().log().next().unwrap().timestamp,
            LamportTs::at(9, r(2))
        );

        // Nothing left to truncate.
        assert!(!r1.truncate_log());
    }

    #[test]
    fn test_truncate_without_peers_is_noop() {
        let mut solo: Replica<&str> = Replica::new(r(1), []);
        let ts = solo.tick();
        solo.apply_ops(&[OpMove::new(ts, None, "root", NodeId::new(r(1), 1))])
            .unwrap();
        assert!(!solo.truncate_log());
        assert_eq!(solo.state().log_len(), 1);
    }
}
