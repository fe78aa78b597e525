use dashmap::DashMap;

use super::{PoolBalance, ResourcePool, valid_amount};
use crate::actor::ActorId;

/// Concurrent in-process pool.
///
/// Serves tests and hosts that keep balances in the same process. Each actor's
/// balance is one map entry, so a debit is atomic per actor without a global
/// lock.
#[derive(Debug)]
pub struct InMemoryPool {
    balances: DashMap<ActorId, PoolBalance>,
    default_max: f64,
}

impl InMemoryPool {
    pub fn new(default_max: f64) -> Self {
        Self {
            balances: DashMap::new(),
            default_max: default_max.max(0.0),
        }
    }

    /// Registers (or replaces) an actor with an explicit balance.
    pub fn insert(&self, actor: ActorId, current: f64, max: f64) {
        self.balances.insert(actor, PoolBalance::new(current, max));
    }

    pub fn set_max(&self, actor: ActorId, max: f64) {
        let mut entry = self
            .balances
            .entry(actor)
            .or_insert_with(|| PoolBalance::new(0.0, self.default_max));
        *entry = PoolBalance::new(entry.current, max);
    }

    pub fn remove(&self, actor: ActorId) -> Option<PoolBalance> {
        self.balances.remove(&actor).map(|(_, b)| b)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Default for InMemoryPool {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl ResourcePool for InMemoryPool {
    fn get(&self, actor: ActorId) -> f64 {
        self.balances.get(&actor).map_or(0.0, |b| b.current)
    }

    fn set(&self, actor: ActorId, amount: f64) {
        let mut entry = self
            .balances
            .entry(actor)
            .or_insert_with(|| PoolBalance::new(0.0, self.default_max));
        *entry = PoolBalance::new(amount, entry.max);
    }

    fn max(&self, actor: ActorId) -> f64 {
        self.balances
            .get(&actor)
            .map_or(self.default_max, |b| b.max)
    }

    fn consume(&self, actor: ActorId, amount: f64) -> bool {
        if !valid_amount(amount) {
            return false;
        }
        if amount == 0.0 {
            return true;
        }
        match self.balances.get_mut(&actor) {
            Some(mut balance) if balance.current >= amount => {
                balance.current = (balance.current - amount).max(0.0);
                true
            }
            _ => false,
        }
    }
}
