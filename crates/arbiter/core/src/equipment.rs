//! Short-lived cache of equipment-derived pool bonuses.
//!
//! Gear owned by either calling system can raise the max and regen of its
//! native pool. The bridge reads these snapshots to convert a foreign pool's
//! bonus into the servicing pool's units. Snapshots are replaced when a new
//! bonus is pushed, dropped on equipment change, and expire after a fixed TTL.

use std::sync::Arc;

use dashmap::DashMap;

use crate::actor::ActorId;
use crate::clock::{Clock, Timestamp};
use crate::pool::PoolId;

/// Max and regen bonus contributed to one pool.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipmentBonus {
    pub max_bonus: f64,
    pub regen_bonus: f64,
}

impl EquipmentBonus {
    pub const ZERO: Self = Self {
        max_bonus: 0.0,
        regen_bonus: 0.0,
    };

    pub const fn new(max_bonus: f64, regen_bonus: f64) -> Self {
        Self {
            max_bonus,
            regen_bonus,
        }
    }

    pub fn scaled(self, rate: f64) -> Self {
        Self {
            max_bonus: self.max_bonus * rate,
            regen_bonus: self.regen_bonus * rate,
        }
    }
}

/// Cached bonuses of one actor, indexed by the pool they apply to.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipmentBonusSnapshot {
    pub actor: ActorId,
    pub bonuses: [EquipmentBonus; 2],
    pub computed_at: Timestamp,
}

impl EquipmentBonusSnapshot {
    pub fn empty(actor: ActorId, computed_at: Timestamp) -> Self {
        Self {
            actor,
            bonuses: [EquipmentBonus::ZERO; 2],
            computed_at,
        }
    }

    pub fn bonus(&self, pool: PoolId) -> EquipmentBonus {
        self.bonuses[pool.index()]
    }

    pub fn is_expired(&self, now: Timestamp, ttl_ms: u64) -> bool {
        now.saturating_sub(self.computed_at) > ttl_ms
    }
}

/// Recomputes an actor's gear bonus on demand.
pub trait EquipmentBonusSupplier: Send + Sync {
    fn compute(&self, actor: ActorId, pool: PoolId) -> EquipmentBonus;
}

pub struct EquipmentBonusCache {
    entries: DashMap<ActorId, EquipmentBonusSnapshot>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
    supplier: Option<Arc<dyn EquipmentBonusSupplier>>,
}

impl EquipmentBonusCache {
    pub fn new(ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms,
            clock,
            supplier: None,
        }
    }

    pub fn with_supplier(mut self, supplier: Arc<dyn EquipmentBonusSupplier>) -> Self {
        self.supplier = Some(supplier);
        self
    }

    /// Stores a pushed bonus for `pool`, refreshing the snapshot timestamp.
    pub fn record(&self, actor: ActorId, pool: PoolId, bonus: EquipmentBonus) {
        let now = self.clock.now_ms();
        let mut entry = self
            .entries
            .entry(actor)
            .or_insert_with(|| EquipmentBonusSnapshot::empty(actor, now));
        if entry.is_expired(now, self.ttl_ms) {
            *entry = EquipmentBonusSnapshot::empty(actor, now);
        }
        entry.bonuses[pool.index()] = bonus;
        entry.computed_at = now;
    }

    /// Returns a fresh snapshot, recomputing it through the supplier if the
    /// cached one expired.
    pub fn get(&self, actor: ActorId) -> Option<EquipmentBonusSnapshot> {
        let now = self.clock.now_ms();
        let cached = self.entries.get(&actor).map(|s| *s);
        if let Some(snapshot) = cached.filter(|s| !s.is_expired(now, self.ttl_ms)) {
            return Some(snapshot);
        }

        match &self.supplier {
            Some(supplier) => {
                let snapshot = EquipmentBonusSnapshot {
                    actor,
                    bonuses: [
                        supplier.compute(actor, PoolId::A),
                        supplier.compute(actor, PoolId::B),
                    ],
                    computed_at: now,
                };
                self.entries.insert(actor, snapshot);
                Some(snapshot)
            }
            None => {
                self.entries
                    .remove_if(&actor, |_, s| s.is_expired(now, self.ttl_ms));
                None
            }
        }
    }

    /// Bonus for `pool`, zero when nothing is cached.
    pub fn bonus(&self, actor: ActorId, pool: PoolId) -> EquipmentBonus {
        self.get(actor)
            .map_or(EquipmentBonus::ZERO, |s| s.bonus(pool))
    }

    /// Drops the snapshot after an equipment change, login or respawn.
    pub fn invalidate(&self, actor: ActorId) {
        if self.entries.remove(&actor).is_some() {
            tracing::trace!(%actor, "equipment bonus snapshot invalidated");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for EquipmentBonusCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquipmentBonusCache")
            .field("entries", &self.entries.len())
            .field("ttl_ms", &self.ttl_ms)
            .field("has_supplier", &self.supplier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const ACTOR: ActorId = ActorId(3);

    struct FixedSupplier;

    impl EquipmentBonusSupplier for FixedSupplier {
        fn compute(&self, _actor: ActorId, pool: PoolId) -> EquipmentBonus {
            match pool {
                PoolId::A => EquipmentBonus::new(40.0, 1.0),
                PoolId::B => EquipmentBonus::new(0.0, 0.0),
            }
        }
    }

    #[test]
    fn recorded_bonus_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = EquipmentBonusCache::new(1_000, clock.clone());

        cache.record(ACTOR, PoolId::A, EquipmentBonus::new(25.0, 2.0));
        assert_eq!(cache.bonus(ACTOR, PoolId::A).max_bonus, 25.0);
        assert_eq!(cache.bonus(ACTOR, PoolId::B), EquipmentBonus::ZERO);

        clock.advance(1_001);
        assert!(cache.get(ACTOR).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_drops_snapshot() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = EquipmentBonusCache::new(1_000, clock);
        cache.record(ACTOR, PoolId::B, EquipmentBonus::new(10.0, 0.5));
        cache.invalidate(ACTOR);
        assert!(cache.get(ACTOR).is_none());
    }

    #[test]
    fn supplier_refreshes_expired_snapshot() {
        let clock = Arc::new(ManualClock::new(0));
        let cache =
            EquipmentBonusCache::new(1_000, clock.clone()).with_supplier(Arc::new(FixedSupplier));

        let snapshot = cache.get(ACTOR).expect("supplier computes a snapshot");
        assert_eq!(snapshot.bonus(PoolId::A).max_bonus, 40.0);

        clock.advance(5_000);
        let refreshed = cache.get(ACTOR).expect("refreshed");
        assert_eq!(refreshed.computed_at, 5_000);
    }
}
