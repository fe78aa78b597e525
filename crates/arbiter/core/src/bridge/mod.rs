//! Mode-driven routing between Pool A and Pool B.
//!
//! The bridge owns the pool handles and the resolved [`UnificationMode`]. All
//! balance reads and debits from the engine go through it:
//!
//! - shared-pool modes route to the single designated pool whatever the
//!   caller, converting the cost when it crosses unit systems
//! - `separate` reads the caller's own pool and splits every debit across
//!   both pools, checking both shares before debiting either
//! - `disabled` keeps each caller on its native pool
//!
//! The dual-cost path is check-then-debit, not a transaction. When a
//! concurrent external write makes the second debit fail after the first
//! succeeded, the first share is put back.
mod mode;

pub use mode::{ModeFlags, ModeStrategy, UnificationMode};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::actor::{ActorId, CallerSystem};
use crate::config::ArbiterConfig;
use crate::equipment::{EquipmentBonus, EquipmentBonusCache};
use crate::error::{ArbiterError, DenyReason};
use crate::pool::{PoolId, ResourcePool, valid_amount};

/// Exchange rates and dual-cost split taken from configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeRates {
    pub a_to_b: f64,
    pub b_to_a: f64,
    pub split_a: f64,
    pub split_b: f64,
}

impl BridgeRates {
    pub fn from_config(config: &ArbiterConfig) -> Self {
        Self {
            a_to_b: config.conversion_rate_a_to_b,
            b_to_a: config.conversion_rate_b_to_a,
            split_a: config.dual_cost_split_a,
            split_b: config.dual_cost_split_b,
        }
    }

    /// Rate converting an amount in `from` units into `to` units.
    pub fn rate(&self, from: PoolId, to: PoolId) -> f64 {
        match (from, to) {
            (PoolId::A, PoolId::B) => self.a_to_b,
            (PoolId::B, PoolId::A) => self.b_to_a,
            _ => 1.0,
        }
    }
}

/// How a cost will be paid under the active mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FundingPlan {
    /// Debit `amount` from `pool`.
    Single { pool: PoolId, amount: f64 },
    /// Debit both shares or nothing.
    Dual { share_a: f64, share_b: f64 },
    /// The caller's native pool does not exist.
    Unavailable { pool: PoolId },
}

pub struct BridgeArbiter {
    pool_a: Arc<dyn ResourcePool>,
    pool_b: Option<Arc<dyn ResourcePool>>,
    mode: UnificationMode,
    configured_mode: String,
    rates: BridgeRates,
    respect_equipment_bonuses: bool,
    equipment: Option<Arc<EquipmentBonusCache>>,
}

impl BridgeArbiter {
    /// Resolves the configured mode against the available pools.
    ///
    /// An unknown mode value falls back to `b_primary`; a missing Pool B
    /// rewrites the mode to the nearest Pool A mode. Both are logged here,
    /// once, since resolution happens only at construction.
    pub fn new(
        config: &ArbiterConfig,
        pool_a: Arc<dyn ResourcePool>,
        pool_b: Option<Arc<dyn ResourcePool>>,
    ) -> Self {
        let mode = Self::resolve(config, pool_b.is_some());
        debug!(%mode, configured = %config.mode, "bridge mode resolved");
        Self {
            pool_a,
            pool_b,
            mode,
            configured_mode: config.mode.clone(),
            rates: BridgeRates::from_config(config),
            respect_equipment_bonuses: config.respect_equipment_bonuses,
            equipment: None,
        }
    }

    pub fn with_equipment_cache(mut self, cache: Arc<EquipmentBonusCache>) -> Self {
        self.equipment = Some(cache);
        self
    }

    fn resolve(config: &ArbiterConfig, has_pool_b: bool) -> UnificationMode {
        if !config.unification_enabled {
            return UnificationMode::Disabled;
        }

        let parsed = match UnificationMode::parse_config(&config.mode) {
            Ok(mode) => mode,
            Err(err) => {
                warn!(error = %err, "unrecognised unification mode");
                UnificationMode::default()
            }
        };

        if has_pool_b {
            return parsed;
        }
        let degraded = parsed.without_pool_b();
        if degraded != parsed {
            warn!(
                error = %ArbiterError::PoolUnavailable { pool: PoolId::B },
                from = %parsed,
                to = %degraded,
                "degrading unification mode"
            );
        }
        degraded
    }

    /// The mode in force.
    pub fn resolve_mode(&self) -> UnificationMode {
        self.mode
    }

    pub fn configured_mode(&self) -> &str {
        &self.configured_mode
    }

    pub fn rates(&self) -> BridgeRates {
        self.rates
    }

    pub fn has_pool_b(&self) -> bool {
        self.pool_b.is_some()
    }

    pub fn pool(&self, id: PoolId) -> Option<&Arc<dyn ResourcePool>> {
        match id {
            PoolId::A => Some(&self.pool_a),
            PoolId::B => self.pool_b.as_ref(),
        }
    }

    /// Pool that services reads for `hint`.
    pub fn servicing_pool(&self, hint: CallerSystem) -> PoolId {
        self.mode
            .shared_pool()
            .unwrap_or_else(|| hint.native_pool())
    }

    /// Converts a cost in `hint`'s native units into the servicing pool's units.
    pub fn convert_cost(&self, cost: f64, hint: CallerSystem) -> f64 {
        let native = hint.native_pool();
        let target = self.servicing_pool(hint);
        if native == target || !self.mode.uses_shared_pool() {
            cost
        } else {
            (cost * self.rates.rate(native, target)).round()
        }
    }

    /// Balance visible to `hint`, in the servicing pool's units.
    pub fn get_balance(&self, actor: ActorId, hint: CallerSystem) -> f64 {
        self.pool(self.servicing_pool(hint))
            .map_or(0.0, |pool| pool.get(actor))
    }

    /// Works out which pool(s) pay `cost` issued by `hint`.
    pub fn plan(&self, cost: f64, hint: CallerSystem) -> FundingPlan {
        if self.mode.requires_dual_cost() {
            let share_a = cost * self.rates.split_a;
            let share_b = cost * self.rates.split_b;
            // The caller's own share stays in its units; the other share
            // crosses into the foreign pool's units.
            return match hint.native_pool() {
                PoolId::A => FundingPlan::Dual {
                    share_a,
                    share_b: (share_b * self.rates.rate(PoolId::A, PoolId::B)).round(),
                },
                PoolId::B => FundingPlan::Dual {
                    share_a: (share_a * self.rates.rate(PoolId::B, PoolId::A)).round(),
                    share_b,
                },
            };
        }
        let pool = self.servicing_pool(hint);
        if self.pool(pool).is_none() {
            return FundingPlan::Unavailable { pool };
        }
        FundingPlan::Single {
            pool,
            amount: self.convert_cost(cost, hint),
        }
    }

    /// Checks affordability without debiting.
    pub fn can_afford(
        &self,
        actor: ActorId,
        cost: f64,
        hint: CallerSystem,
    ) -> Result<(), DenyReason> {
        match self.plan(cost, hint) {
            FundingPlan::Single { pool, amount } => {
                let available = self.pool(pool).map_or(0.0, |p| p.get(actor));
                if available >= amount {
                    Ok(())
                } else {
                    Err(DenyReason::InsufficientResource {
                        needed: amount,
                        available,
                    })
                }
            }
            FundingPlan::Dual { share_a, share_b } => self.check_dual(actor, share_a, share_b),
            FundingPlan::Unavailable { .. } => Err(DenyReason::InsufficientResource {
                needed: cost,
                available: 0.0,
            }),
        }
    }

    fn check_dual(&self, actor: ActorId, share_a: f64, share_b: f64) -> Result<(), DenyReason> {
        for (pool, share) in [(PoolId::A, share_a), (PoolId::B, share_b)] {
            let available = self.pool(pool).map_or(0.0, |p| p.get(actor));
            if available < share {
                return Err(DenyReason::InsufficientDualShare {
                    pool,
                    needed: share,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Debits `cost` according to the mode, reporting why it failed.
    pub fn try_consume(
        &self,
        actor: ActorId,
        cost: f64,
        hint: CallerSystem,
    ) -> Result<(), ArbiterError> {
        if !valid_amount(cost) {
            return Err(ArbiterError::InvalidAmount(cost));
        }

        match self.plan(cost, hint) {
            FundingPlan::Single { pool, amount } => {
                let Some(handle) = self.pool(pool) else {
                    return Err(ArbiterError::PoolUnavailable { pool });
                };
                if handle.consume(actor, amount) {
                    Ok(())
                } else {
                    Err(ArbiterError::InsufficientResource {
                        unit: "power",
                        needed: amount,
                        available: handle.get(actor),
                    })
                }
            }
            FundingPlan::Dual { share_a, share_b } => {
                self.check_dual(actor, share_a, share_b).map_err(|reason| {
                    let (needed, available) = match reason {
                        DenyReason::InsufficientDualShare {
                            needed, available, ..
                        } => (needed, available),
                        _ => (cost, 0.0),
                    };
                    ArbiterError::InsufficientResource {
                        unit: "power",
                        needed,
                        available,
                    }
                })?;
                // Both shares were checked above; a failure here means an
                // external write landed in between.
                let Some(pool_b) = self.pool_b.as_ref() else {
                    return Err(ArbiterError::PoolUnavailable { pool: PoolId::B });
                };
                if !self.pool_a.consume(actor, share_a) {
                    return Err(ArbiterError::InsufficientResource {
                        unit: "power",
                        needed: share_a,
                        available: self.pool_a.get(actor),
                    });
                }
                if !pool_b.consume(actor, share_b) {
                    warn!(%actor, share_b, "pool B changed between dual-cost check and debit");
                    self.refund(&*self.pool_a, actor, share_a);
                    return Err(ArbiterError::InsufficientResource {
                        unit: "power",
                        needed: share_b,
                        available: pool_b.get(actor),
                    });
                }
                Ok(())
            }
            FundingPlan::Unavailable { pool } => Err(ArbiterError::PoolUnavailable { pool }),
        }
    }

    /// Puts back a share debited by a dual cost whose other half failed.
    fn refund(&self, pool: &dyn ResourcePool, actor: ActorId, amount: f64) {
        let restored = (pool.get(actor) + amount).min(pool.max(actor));
        pool.set(actor, restored);
        debug!(%actor, amount, restored, "dual-cost share refunded");
    }

    pub fn consume(&self, actor: ActorId, cost: f64, hint: CallerSystem) -> bool {
        self.try_consume(actor, cost, hint).is_ok()
    }

    /// Gear bonus from the non-servicing pool converted into servicing units.
    fn foreign_bonus(&self, actor: ActorId, hint: CallerSystem) -> EquipmentBonus {
        if !self.respect_equipment_bonuses || !self.mode.uses_shared_pool() {
            return EquipmentBonus::ZERO;
        }
        let Some(cache) = self.equipment.as_ref() else {
            return EquipmentBonus::ZERO;
        };
        let target = self.servicing_pool(hint);
        let foreign = target.other();
        cache
            .bonus(actor, foreign)
            .scaled(self.rates.rate(foreign, target))
    }

    /// Max of the servicing pool plus converted foreign gear bonuses.
    pub fn effective_max(&self, actor: ActorId, hint: CallerSystem) -> f64 {
        let base = self
            .pool(self.servicing_pool(hint))
            .map_or(0.0, |p| p.max(actor));
        base + self.foreign_bonus(actor, hint).max_bonus
    }

    /// Host regen of the servicing pool plus converted foreign gear bonuses.
    pub fn effective_regen(&self, actor: ActorId, hint: CallerSystem, base_regen: f64) -> f64 {
        base_regen + self.foreign_bonus(actor, hint).regen_bonus
    }
}

impl std::fmt::Debug for BridgeArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeArbiter")
            .field("mode", &self.mode)
            .field("configured_mode", &self.configured_mode)
            .field("has_pool_b", &self.pool_b.is_some())
            .field("rates", &self.rates)
            .finish()
    }
}
