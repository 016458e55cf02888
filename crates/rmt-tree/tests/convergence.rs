//! Convergence tests for the replicated move-tree.
//!
//! These exercise the central claim of the algorithm: for any set of move
//! operations with unique timestamps, every replica ends with the same tree
//! and the same log no matter in which order the operations arrive.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rmt_core::ReplicaId;
use rmt_tree::{is_ancestor, LamportTs, LogOpMove, NodeId, OpMove, Replica, State, Tree};

fn r(id: u16) -> ReplicaId {
    ReplicaId::new(id)
}

fn ts(counter: u64, actor: u16) -> LamportTs {
    LamportTs::at(counter, r(actor))
}

fn id(actor: u16, seq: u64) -> NodeId {
    NodeId::new(r(actor), seq)
}

fn op(
    counter: u64,
    actor: u16,
    parent: Option<NodeId>,
    meta: &str,
    child: NodeId,
) -> OpMove<String> {
    OpMove::new(ts(counter, actor), parent, meta.to_string(), child)
}

/// Walk up from every node, asserting the walk terminates within the number
/// of mapped nodes (i.e. the tree has no cycle).
fn assert_acyclic(tree: &Tree<String>) {
    let bound = tree.len() + 1;
    for (&node, _) in tree.iter() {
        let mut current = node;
        let mut steps = 0;
        while let Some(parent) = tree.find(current).and_then(|n| n.parent) {
            steps += 1;
            assert!(steps <= bound, "cycle reached from {current}");
            current = parent;
        }
    }
}

/// The newest `n` log entries of a replica, oldest of them first.
fn newest_entries(replica: &Replica<String>, n: usize) -> Vec<LogOpMove<String>> {
    let mut entries: Vec<_> = replica.state().log().take(n).cloned().collect();
    entries.reverse();
    entries
}

// ============================================================================
// Concrete two-replica scenarios
// ============================================================================

/// Shared setup: root with children a, b, c, applied on both replicas.
fn two_replicas_with_root_abc() -> (Replica<String>, Replica<String>, [NodeId; 4]) {
    let root = NodeId::well_known(1);
    let a = id(1, 1);
    let b = id(1, 2);
    let c = id(1, 3);
    let init = vec![
        op(1, 1, None, "root", root),
        op(2, 1, Some(root), "a", a),
        op(3, 1, Some(root), "b", b),
        op(4, 1, Some(root), "c", c),
    ];

    let mut r1: Replica<String> = Replica::new(r(1), [r(1), r(2)]);
    let mut r2: Replica<String> = Replica::new(r(2), [r(1), r(2)]);
    r1.apply_ops(&init).unwrap();
    r2.apply_ops(&init).unwrap();
    (r1, r2, [root, a, b, c])
}

#[test]
fn test_concurrent_moves_of_same_node_converge() {
    let (mut r1, mut r2, [root, a, b, c]) = two_replicas_with_root_abc();

    // R1 moves a under b; R2 concurrently moves a under c.
    r1.apply_ops(&[op(5, 1, Some(b), "a", a)]).unwrap();
    r2.apply_ops(&[op(5, 2, Some(c), "a", a)]).unwrap();

    // Cross-merge the one new entry each side produced.
    let from_r1 = newest_entries(&r1, 1);
    let from_r2 = newest_entries(&r2, 1);
    r1.apply_log_ops(&from_r2).unwrap();
    r2.apply_log_ops(&from_r1).unwrap();

    assert_eq!(r1.state(), r2.state());

    // The larger timestamp (5@r2) wins: a sits under c, and only under c.
    assert_eq!(r1.tree().find(a).unwrap().parent, Some(c));
    assert_eq!(r1.tree().children(b), Vec::<NodeId>::new());
    assert_eq!(r1.tree().children(c), vec![a]);
    assert_eq!(r1.tree().children(root).len(), 3);
}

#[test]
fn test_concurrent_would_be_cycle_converges() {
    let root = NodeId::well_known(1);
    let a = id(1, 1);
    let b = id(1, 2);
    let c = id(1, 3);
    let init = vec![
        op(1, 1, None, "root", root),
        op(2, 1, Some(root), "a", a),
        op(3, 1, Some(a), "c", c),
        op(4, 1, Some(root), "b", b),
    ];

    let mut r1: Replica<String> = Replica::new(r(1), [r(1), r(2)]);
    let mut r2: Replica<String> = Replica::new(r(2), [r(1), r(2)]);
    r1.apply_ops(&init).unwrap();
    r2.apply_ops(&init).unwrap();

    // R1 moves b under a; R2 concurrently moves a under b.
    r1.apply_ops(&[op(5, 1, Some(a), "b", b)]).unwrap();
    r2.apply_ops(&[op(5, 2, Some(b), "a", a)]).unwrap();

    let from_r1 = newest_entries(&r1, 1);
    let from_r2 = newest_entries(&r2, 1);
    r1.apply_log_ops(&from_r2).unwrap();
    r2.apply_log_ops(&from_r1).unwrap();

    assert_eq!(r1.state(), r2.state());
    assert_acyclic(r1.tree());

    // In timestamp order, b -> a applies first; the later a -> b becomes
    // the cycle inducer and is skipped on both replicas.
    assert_eq!(r1.tree().find(b).unwrap().parent, Some(a));
    assert_eq!(r1.tree().find(a).unwrap().parent, Some(root));
    assert!(is_ancestor(r1.tree(), c, root));
}

#[test]
fn test_non_conflicting_concurrent_renames_both_apply() {
    let (mut r1, mut r2, [root, a, b, _c]) = two_replicas_with_root_abc();

    // Renames carried as metadata rewrites in place.
    r1.apply_ops(&[op(5, 1, Some(root), "c", a)]).unwrap();
    r2.apply_ops(&[op(5, 2, Some(root), "d", b)]).unwrap();

    let from_r1 = newest_entries(&r1, 1);
    let from_r2 = newest_entries(&r2, 1);
    r1.apply_log_ops(&from_r2).unwrap();
    r2.apply_log_ops(&from_r1).unwrap();

    assert_eq!(r1.state(), r2.state());
    assert_eq!(r1.tree().find(a).unwrap().meta, "c");
    assert_eq!(r1.tree().find(b).unwrap().meta, "d");
}

// ============================================================================
// Randomized order-independence
// ============================================================================

#[test]
fn test_random_order_apply_always_matches_canonical() {
    let root = NodeId::well_known(1);
    let trash = NodeId::well_known(2);
    let home = id(1, 1);
    let dilbert = id(1, 2);
    let junk = id(1, 3);

    let ops = vec![
        op(1, 1, None, "root", root),
        op(2, 1, None, "trash", trash),
        op(3, 1, Some(root), "home", home),
        op(4, 1, Some(home), "dilbert", dilbert),
        op(5, 1, Some(root), "junk", junk),
        op(6, 1, Some(trash), "junk", junk),
        // Would place home under its own descendant; must be skipped.
        op(7, 1, Some(dilbert), "home", home),
    ];

    let mut canonical: State<String> = State::new();
    for o in &ops {
        canonical.apply_op(o.clone()).unwrap();
    }
    assert_eq!(canonical.tree().find(home).unwrap().parent, Some(root));
    assert_eq!(canonical.tree().find(junk).unwrap().parent, Some(trash));

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    for _ in 0..10_000 {
        let mut shuffled = ops.clone();
        shuffled.shuffle(&mut rng);

        let mut state: State<String> = State::new();
        for o in &shuffled {
            state.apply_op(o.clone()).unwrap();
        }

        assert_eq!(state, canonical);
        assert!(state.log_is_descending());
        assert_acyclic(state.tree());
    }
}

#[test]
fn test_two_replicas_converge_under_interleaved_batches() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    let mut r1: Replica<String> = Replica::new(r(1), [r(1), r(2)]);
    let mut r2: Replica<String> = Replica::new(r(2), [r(1), r(2)]);

    let root = NodeId::well_known(1);
    let init = vec![op(1, 1, None, "root", root)];
    r1.apply_ops(&init).unwrap();
    r2.apply_ops(&init).unwrap();

    // Each replica grows and reshuffles its own view concurrently.
    let mut known = vec![root];
    let mut ops_r1 = Vec::new();
    let mut ops_r2 = Vec::new();
    for i in 0..40u64 {
        let parent = *known.choose(&mut rng).unwrap();
        if i % 2 == 0 {
            let child = id(1, 10 + i);
            known.push(child);
            ops_r1.push(op(10 + i, 1, Some(parent), &format!("n{i}"), child));
        } else {
            let child = id(2, 10 + i);
            known.push(child);
            ops_r2.push(op(10 + i, 2, Some(parent), &format!("n{i}"), child));
        }
    }

    r1.apply_ops(&ops_r1).unwrap();
    r2.apply_ops(&ops_r2).unwrap();

    // Deliver each side's batch to the other in random order.
    let mut to_r1: Vec<LogOpMove<String>> = newest_entries(&r2, ops_r2.len());
    let mut to_r2: Vec<LogOpMove<String>> = newest_entries(&r1, ops_r1.len());
    to_r1.shuffle(&mut rng);
    to_r2.shuffle(&mut rng);
    r1.apply_log_ops(&to_r1).unwrap();
    r2.apply_log_ops(&to_r2).unwrap();

    assert_eq!(r1.state(), r2.state());
    assert_acyclic(r1.tree());
    assert!(r1.state().log_is_descending());
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn test_log_entries_roundtrip_through_json() {
    let (mut r1, mut r2, [_root, a, b, _c]) = two_replicas_with_root_abc();
    r1.apply_ops(&[op(5, 1, Some(b), "a", a)]).unwrap();

    let batch = newest_entries(&r1, 1);
    let json = serde_json::to_string(&batch).unwrap();
    let decoded: Vec<LogOpMove<String>> = serde_json::from_str(&json).unwrap();

    r2.apply_log_ops(&decoded).unwrap();
    assert_eq!(r1.state(), r2.state());
}
