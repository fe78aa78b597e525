//! Actor identity and the two calling systems.

use core::fmt;

use crate::pool::PoolId;

/// Stable identifier of an actor whose costs are arbitrated.
///
/// Actors are observed lazily: the first reservation, cooldown or equipment
/// snapshot creates their entry, and [`forget`](crate::CooldownLedger::forget)
/// style calls discard it on disconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u64);

impl ActorId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// One of the two external systems that request costed actions.
///
/// Each system natively spends from its own pool: system A from Pool A,
/// system B from Pool B. The system doubles as the pool hint for the bridge,
/// the reservation kind, and the default cooldown namespace.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallerSystem {
    #[strum(to_string = "a")]
    A,
    #[strum(to_string = "b")]
    B,
}

impl CallerSystem {
    /// Pool this system spends from when no unification applies.
    pub const fn native_pool(self) -> PoolId {
        match self {
            CallerSystem::A => PoolId::A,
            CallerSystem::B => PoolId::B,
        }
    }

    /// The other calling system.
    pub const fn other(self) -> Self {
        match self {
            CallerSystem::A => CallerSystem::B,
            CallerSystem::B => CallerSystem::A,
        }
    }

    /// Default cooldown namespace label (`"a"` / `"b"`).
    pub const fn namespace_label(self) -> &'static str {
        match self {
            CallerSystem::A => "a",
            CallerSystem::B => "b",
        }
    }
}

/// Host lookup for actors that bypass arbitration entirely.
///
/// Unrestricted actors (creative/admin) are always allowed, pay nothing and
/// never receive discounts or reservations.
pub trait ActorDirectory: Send + Sync {
    fn is_unrestricted(&self, actor: ActorId) -> bool;
}

/// Directory in which every actor is subject to costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnrestrictedActors;

impl ActorDirectory for NoUnrestrictedActors {
    fn is_unrestricted(&self, _actor: ActorId) -> bool {
        false
    }
}
