//! Tree node identifiers.
//!
//! A `NodeId` packs the creating replica into the high 16 bits and a
//! per-replica sequence into the low 48. The id is globally unique without
//! coordination and doubles as the inode number the filesystem layer
//! exposes, so the creator stays recoverable from any id (conflict renames
//! need it).

use rmt_core::ReplicaId;
use serde::{Deserialize, Serialize};
use std::fmt;

const SEQ_BITS: u32 = 48;
const SEQ_MASK: u64 = (1 << SEQ_BITS) - 1;

/// Globally unique identifier of one tree node.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(u64);

impl NodeId {
    /// The sentinel "no such node" id (zero inode for negative lookups).
    pub const NULL: NodeId = NodeId(0);

    /// Build an id from its creator and per-creator sequence number.
    pub const fn new(actor: ReplicaId, seq: u64) -> Self {
        debug_assert!(seq <= SEQ_MASK, "node sequence overflow");
        NodeId(((actor.as_u16() as u64) << SEQ_BITS) | (seq & SEQ_MASK))
    }

    /// A well-known id minted under the reserved replica 0, identical on
    /// every replica without any exchange.
    pub const fn well_known(seq: u64) -> Self {
        NodeId::new(ReplicaId::RESERVED, seq)
    }

    /// The replica that created this node.
    pub fn actor(self) -> ReplicaId {
        ReplicaId::new((self.0 >> SEQ_BITS) as u16)
    }

    /// The creator-local sequence number.
    pub fn seq(self) -> u64 {
        self.0 & SEQ_MASK
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(raw: u64) -> Self {
        NodeId(raw)
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor(), self.seq())
    }
}
