//! Resource pools.
//!
//! A pool is an actor-scoped numeric store owned by an external subsystem.
//! The engine only needs `get`, `set`, `max` and `consume`; implementations
//! must keep `0 <= current <= max` for every actor.
mod memory;

pub use memory::InMemoryPool;

use core::fmt;

use crate::actor::ActorId;

/// The two pools the bridge can route costs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolId {
    A,
    B,
}

impl PoolId {
    pub const fn index(self) -> usize {
        match self {
            PoolId::A => 0,
            PoolId::B => 1,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            PoolId::A => PoolId::B,
            PoolId::B => PoolId::A,
        }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolId::A => f.write_str("pool A"),
            PoolId::B => f.write_str("pool B"),
        }
    }
}

/// Snapshot of one actor's pool state.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolBalance {
    pub current: f64,
    pub max: f64,
}

impl PoolBalance {
    /// Builds a balance with `current` clamped into `[0, max]`.
    pub fn new(current: f64, max: f64) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        let current = if current.is_finite() {
            current.clamp(0.0, max)
        } else {
            0.0
        };
        Self { current, max }
    }
}

/// Externally owned store of spendable resource.
pub trait ResourcePool: Send + Sync {
    fn get(&self, actor: ActorId) -> f64;

    /// Sets the balance, clamped into `[0, max]`.
    fn set(&self, actor: ActorId, amount: f64);

    fn max(&self, actor: ActorId) -> f64;

    /// Debits `amount` if fully covered. Never leaves the balance negative.
    fn consume(&self, actor: ActorId, amount: f64) -> bool;

    fn balance(&self, actor: ActorId) -> PoolBalance {
        PoolBalance::new(self.get(actor), self.max(actor))
    }

    fn can_afford(&self, actor: ActorId, amount: f64) -> bool {
        amount.is_finite() && amount >= 0.0 && self.get(actor) >= amount
    }
}

/// Amounts the pools accept: finite and non-negative.
pub(crate) fn valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}
