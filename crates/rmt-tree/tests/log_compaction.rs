//! Log truncation via causal stability.
//!
//! A replica may discard log entries below the minimum of the latest
//! timestamps reported by every peer: no future operation can sort at or
//! below that point, so no undo will ever reach the discarded entries.
//! These tests verify the threshold computation and that truncation never
//! changes the outcome of later operations.

use rmt_core::ReplicaId;
use rmt_tree::{LamportTs, NodeId, OpMove, Replica};

fn r(id: u16) -> ReplicaId {
    ReplicaId::new(id)
}

fn op(counter: u64, actor: u16, parent: Option<NodeId>, meta: &str, child: NodeId) -> OpMove<String> {
    OpMove::new(LamportTs::at(counter, r(actor)), parent, meta.to_string(), child)
}

/// A replica that has heard from both peers, with a spread of timestamps.
fn replica_with_history() -> Replica<String> {
    let root = NodeId::well_known(1);
    let mut replica: Replica<String> = Replica::new(r(1), [r(2), r(3)]);

    let ops = vec![
        op(1, 2, None, "root", root),
        op(2, 3, Some(root), "a", NodeId::new(r(3), 1)),
        op(3, 2, Some(root), "b", NodeId::new(r(2), 1)),
        op(6, 3, Some(root), "c", NodeId::new(r(3), 2)),
        op(8, 2, Some(root), "d", NodeId::new(r(2), 2)),
    ];
    replica.apply_ops(&ops).unwrap();
    replica
}

#[test]
fn test_threshold_is_min_of_peer_latest() {
    let replica = replica_with_history();
    // Latest from r2 is 8@r2, from r3 is 6@r3; the threshold is the minimum.
    assert_eq!(
        replica.causally_stable_threshold(),
        Some(LamportTs::at(6, r(3)))
    );
}

#[test]
fn test_truncation_drops_only_entries_below_threshold() {
    let mut replica = replica_with_history();
    assert_eq!(replica.state().log_len(), 5);

    assert!(replica.truncate_log());

    let threshold = LamportTs::at(6, r(3));
    assert_eq!(replica.state().log_len(), 2);
    for entry in replica.state().log() {
        assert!(entry.timestamp >= threshold);
    }
    assert!(replica.state().log_is_descending());
}

#[test]
fn test_truncation_is_invisible_to_future_operations() {
    let mut full = replica_with_history();
    let mut truncated = full.clone();
    assert!(truncated.truncate_log());

    // Anything a peer sends from now on is newer than its latest seen
    // timestamp, hence newer than the threshold. Apply the same tail of
    // operations to both replicas, interleaved out of order.
    let root = NodeId::well_known(1);
    let tail = vec![
        op(9, 3, Some(NodeId::new(r(2), 1)), "c", NodeId::new(r(3), 2)),
        op(7, 3, Some(root), "e", NodeId::new(r(3), 3)),
        op(10, 2, Some(NodeId::new(r(3), 3)), "d", NodeId::new(r(2), 2)),
    ];
    full.apply_ops(&tail).unwrap();
    truncated.apply_ops(&tail).unwrap();

    assert_eq!(full.tree(), truncated.tree());
}

#[test]
fn test_truncate_reports_false_when_nothing_removed() {
    let mut replica = replica_with_history();
    assert!(replica.truncate_log());
    // Second call: threshold unchanged, nothing below it remains.
    assert!(!replica.truncate_log());
}

#[test]
fn test_threshold_needs_every_peer() {
    let mut replica: Replica<String> = Replica::new(r(1), [r(2), r(3)]);
    replica
        .apply_ops(&[op(5, 2, None, "root", NodeId::well_known(1))])
        .unwrap();

    // r3 has never reported; no entry may be discarded yet.
    assert_eq!(replica.causally_stable_threshold(), None);
    assert!(!replica.truncate_log());
    assert_eq!(replica.state().log_len(), 1);
}
