//! Bounded counter - a PN-counter that refuses to spend quota it does not hold.
//!
//! Each replica may only decrement up to its local quota: what it has
//! incremented itself, minus what it has decremented, adjusted by explicit
//! quota transfers between replicas. This keeps the global value from
//! dropping below zero even under concurrent decrements, without any
//! coordination at decrement time.

use crate::convergent::Convergent;
use crate::error::{CounterError, Result};
use crate::ids::ReplicaId;
use crate::pncounter::PNCounter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bounded counter over a fixed replica group.
///
/// Wraps a [`PNCounter`] with a `sender -> receiver -> amount` transfer
/// matrix. Decrements and outgoing transfers are rejected when they exceed
/// the local quota; the matrix merges per-pair max like the counter slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BCounter {
    pn: PNCounter,
    /// Cumulative quota moved between ordered replica pairs.
    transfers: BTreeMap<ReplicaId, BTreeMap<ReplicaId, u64>>,
}

impl BCounter {
    /// Create a counter for `own` with slots for every replica in the group.
    pub fn new(own: ReplicaId, all: impl IntoIterator<Item = ReplicaId> + Clone) -> Self {
        Self {
            pn: PNCounter::new(own, all),
            transfers: BTreeMap::new(),
        }
    }

    /// The replica that owns this copy.
    pub fn replica_id(&self) -> ReplicaId {
        self.pn.replica_id()
    }

    /// Current global value.
    pub fn value(&self) -> i64 {
        self.pn.value()
    }

    /// The quota the owning replica may still spend.
    ///
    /// Own increments minus own decrements, minus quota sent away, plus
    /// quota received. Only local slots count: another replica's increments
    /// grant no spending rights until explicitly transferred.
    pub fn quota(&self) -> i64 {
        let own = self.replica_id();
        let earned = self.pn.positive().slot(own) as i64;
        let spent = self.pn.negative().slot(own) as i64;
        let sent: i64 = self
            .transfers
            .get(&own)
            .map(|row| row.values().map(|&v| v as i64).sum())
            .unwrap_or(0);
        let received: i64 = self
            .transfers
            .values()
            .map(|row| row.get(&own).map(|&v| v as i64).unwrap_or(0))
            .sum();
        earned - spent - sent + received
    }

    /// Bump the owning replica's increment slot, growing its quota.
    pub fn increment(&mut self, step: u64) {
        self.pn.increment(step);
    }

    /// Decrement by `amount`, failing if the local quota cannot cover it.
    pub fn decrement(&mut self, amount: u64) -> Result<()> {
        let available = self.quota();
        if available < amount as i64 {
            return Err(CounterError::InsufficientQuota {
                requested: amount,
                available,
            });
        }
        self.pn.decrement(amount);
        Ok(())
    }

    /// Move `amount` of quota from the owning replica to `to`.
    ///
    /// The sender is always the owning replica; a replica cannot move quota
    /// between two other parties.
    pub fn transfer(&mut self, to: ReplicaId, amount: u64) -> Result<()> {
        let own = self.replica_id();
        if to == own {
            return Err(CounterError::SelfTransfer);
        }
        let available = self.quota();
        if available < amount as i64 {
            return Err(CounterError::InsufficientQuota {
                requested: amount,
                available,
            });
        }
        let entry = self
            .transfers
            .entry(own)
            .or_default()
            .entry(to)
            .or_insert(0);
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    /// Cumulative quota moved from `from` to `to`.
    pub fn transferred(&self, from: ReplicaId, to: ReplicaId) -> u64 {
        self.transfers
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(0)
    }
}

impl Convergent for BCounter {
    fn merge(&mut self, other: &Self) {
        self.pn.merge(&other.pn);
        for (&from, row) in &other.transfers {
            let own_row = self.transfers.entry(from).or_default();
            for (&to, &v) in row {
                own_row
                    .entry(to)
                    .and_modify(|e| *e = (*e).max(v))
                    .or_insert(v);
            }
        }
    }
}
