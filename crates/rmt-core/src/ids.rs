//! Replica identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one participant in the replica group.
///
/// Id `0` is reserved: the tree layer mints its well-known forest roots under
/// it, so real replicas use ids starting at 1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ReplicaId(pub u16);

impl ReplicaId {
    /// The reserved id used for well-known, replica-independent nodes.
    pub const RESERVED: ReplicaId = ReplicaId(0);

    pub const fn new(id: u16) -> Self {
        ReplicaId(id)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u16> for ReplicaId {
    fn from(id: u16) -> Self {
        ReplicaId(id)
    }
}
