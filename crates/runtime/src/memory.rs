//! In-memory collaborators.
//!
//! Hosts that keep the alternate currency, the fallback store or equipment
//! state in their own process can push it into these tables instead of
//! writing adapters. Every table is keyed by actor and locks one entry at a
//! time.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::{DashMap, DashSet};

use arbiter_core::{ActorId, AlternateLedger, EquipmentView, FallbackStore, SpellSchool};

/// Alternate-currency balances.
#[derive(Debug)]
pub struct InMemoryLedger {
    balances: DashMap<ActorId, u64>,
    online: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            online: AtomicBool::new(true),
        }
    }

    pub fn set_balance(&self, actor: ActorId, balance: u64) {
        self.balances.insert(actor, balance);
    }

    /// Simulates the owning subsystem going away.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    pub fn remove(&self, actor: ActorId) {
        self.balances.remove(&actor);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AlternateLedger for InMemoryLedger {
    fn is_available(&self, _actor: ActorId) -> bool {
        self.online.load(Ordering::Acquire)
    }

    fn balance(&self, actor: ActorId) -> u64 {
        self.balances.get(&actor).map_or(0, |b| *b)
    }

    fn withdraw(&self, actor: ActorId, amount: u64) -> bool {
        if amount == 0 {
            return true;
        }
        match self.balances.get_mut(&actor) {
            Some(mut balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }
}

/// Health-like fallback values; unknown actors read as `default_value`.
#[derive(Debug)]
pub struct InMemoryFallbackStore {
    values: DashMap<ActorId, f64>,
    default_value: f64,
}

impl InMemoryFallbackStore {
    pub fn new(default_value: f64) -> Self {
        Self {
            values: DashMap::new(),
            default_value,
        }
    }

    pub fn remove(&self, actor: ActorId) {
        self.values.remove(&actor);
    }
}

impl Default for InMemoryFallbackStore {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl FallbackStore for InMemoryFallbackStore {
    fn current(&self, actor: ActorId) -> f64 {
        self.values.get(&actor).map_or(self.default_value, |v| *v)
    }

    fn set(&self, actor: ActorId, value: f64) {
        self.values.insert(actor, value.max(0.0));
    }
}

/// Worn-equipment facts pushed by the host on equipment changes.
///
/// An actor with no entry wears nothing relevant.
#[derive(Debug, Default)]
pub struct EquipmentTable {
    flat: DashSet<ActorId>,
    affinities: DashMap<ActorId, Vec<SpellSchool>>,
    alternate: DashSet<ActorId>,
}

impl EquipmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flat_discount(&self, actor: ActorId, worn: bool) {
        if worn {
            self.flat.insert(actor);
        } else {
            self.flat.remove(&actor);
        }
    }

    pub fn set_affinities(&self, actor: ActorId, schools: Vec<SpellSchool>) {
        if schools.is_empty() {
            self.affinities.remove(&actor);
        } else {
            self.affinities.insert(actor, schools);
        }
    }

    pub fn set_alternate_currency(&self, actor: ActorId, engaged: bool) {
        if engaged {
            self.alternate.insert(actor);
        } else {
            self.alternate.remove(&actor);
        }
    }

    pub fn forget(&self, actor: ActorId) {
        self.flat.remove(&actor);
        self.affinities.remove(&actor);
        self.alternate.remove(&actor);
    }
}

impl EquipmentView for EquipmentTable {
    fn has_flat_discount(&self, actor: ActorId) -> bool {
        self.flat.contains(&actor)
    }

    fn affinity_schools(&self, actor: ActorId) -> Vec<SpellSchool> {
        self.affinities
            .get(&actor)
            .map(|schools| schools.clone())
            .unwrap_or_default()
    }

    fn alternate_currency_engaged(&self, actor: ActorId) -> bool {
        self.alternate.contains(&actor)
    }
}
