//! Alternate-currency funding chain.
//!
//! When equipment reroutes a cost away from the normal pools, it is paid in
//! alternate units from an external primary ledger, then (if the configured
//! order allows) from a fallback store at a fixed exchange ratio. The fallback
//! store is never taken down to or below its safety floor.
//!
//! Every debit is planned first and executed only when the whole amount is
//! covered, so a failed check is never followed by a partial debit.
mod cost;

pub use cost::AlternateCostFormula;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::actor::ActorId;
use crate::config::ArbiterConfig;
use crate::error::ArbiterError;

/// Order in which alternate sources are drawn from.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SourceOrder {
    #[default]
    PrimaryOnly,
    PrimaryThenFallback,
    FallbackOnly,
}

impl SourceOrder {
    pub fn parse_config(raw: &str) -> Result<Self, ArbiterError> {
        raw.trim()
            .parse()
            .map_err(|_| ArbiterError::UnknownPolicyValue {
                key: "alternate_source_order",
                value: raw.to_owned(),
                fallback: Self::default().into(),
            })
    }

    pub const fn uses_primary(self) -> bool {
        matches!(self, Self::PrimaryOnly | Self::PrimaryThenFallback)
    }

    pub const fn uses_fallback(self) -> bool {
        matches!(self, Self::PrimaryThenFallback | Self::FallbackOnly)
    }
}

/// External ledger holding alternate units.
pub trait AlternateLedger: Send + Sync {
    /// Whether the ledger can serve `actor` at all.
    fn is_available(&self, _actor: ActorId) -> bool {
        true
    }

    fn balance(&self, actor: ActorId) -> u64;

    /// Removes exactly `amount`; returns `false` if that was not possible.
    fn withdraw(&self, actor: ActorId, amount: u64) -> bool;
}

/// Health-like store used when the primary ledger falls short.
pub trait FallbackStore: Send + Sync {
    fn current(&self, actor: ActorId) -> f64;

    fn set(&self, actor: ActorId, value: f64);
}

/// How a withdrawal splits across the chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Withdrawal {
    pub from_primary: u64,
    /// Fallback-store units (alternate units divided by the ratio).
    pub fallback_units: f64,
}

impl Withdrawal {
    const NONE: Self = Self {
        from_primary: 0,
        fallback_units: 0.0,
    };
}

pub struct AlternateCurrencyAdapter {
    primary: Option<Arc<dyn AlternateLedger>>,
    fallback: Option<Arc<dyn FallbackStore>>,
    order: SourceOrder,
    ratio: f64,
    floor: f64,
    primary_missing_logged: AtomicBool,
}

impl AlternateCurrencyAdapter {
    pub fn new(
        config: &ArbiterConfig,
        primary: Option<Arc<dyn AlternateLedger>>,
        fallback: Option<Arc<dyn FallbackStore>>,
    ) -> Self {
        let order = SourceOrder::parse_config(&config.alternate_source_order).unwrap_or_else(|err| {
            warn!(error = %err, "unrecognised alternate source order");
            SourceOrder::default()
        });
        Self {
            primary,
            fallback,
            order,
            ratio: config.alternate_fallback_ratio.max(f64::EPSILON),
            floor: config.alternate_fallback_floor.max(0.0),
            primary_missing_logged: AtomicBool::new(false),
        }
    }

    pub fn order(&self) -> SourceOrder {
        self.order
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    fn primary_for(&self, actor: ActorId) -> Option<&Arc<dyn AlternateLedger>> {
        if !self.order.uses_primary() {
            return None;
        }
        let ledger = self.primary.as_ref().filter(|l| l.is_available(actor));
        if ledger.is_none() && !self.primary_missing_logged.swap(true, Ordering::Relaxed) {
            warn!(order = %self.order, "alternate primary ledger unavailable");
        }
        ledger
    }

    fn fallback_for(&self) -> Option<&Arc<dyn FallbackStore>> {
        if self.order.uses_fallback() {
            self.fallback.as_ref()
        } else {
            None
        }
    }

    fn fallback_covers(&self, actor: ActorId, units: f64) -> bool {
        self.fallback_for()
            .is_some_and(|store| store.current(actor) > units + self.floor)
    }

    /// Largest alternate amount the fallback store can fund while staying
    /// strictly above its floor.
    fn fallback_capacity(&self, actor: ActorId) -> u64 {
        let headroom = self
            .fallback_for()
            .map_or(0.0, |store| store.current(actor) - self.floor);
        if !(headroom.is_finite() && headroom > 0.0) {
            return 0;
        }
        // Upper bound, stepped down to what `fallback_covers` accepts.
        let mut amount = (headroom * self.ratio).ceil() as u64;
        while amount > 0 && !self.fallback_covers(actor, amount as f64 / self.ratio) {
            amount -= 1;
        }
        amount
    }

    /// Total alternate units the actor could spend right now.
    pub fn available(&self, actor: ActorId) -> u64 {
        let primary = self.primary_for(actor).map_or(0, |l| l.balance(actor));
        primary.saturating_add(self.fallback_capacity(actor))
    }

    /// Plans a full withdrawal of `amount`, or explains the shortfall.
    pub fn plan(&self, actor: ActorId, amount: u64) -> Result<Withdrawal, ArbiterError> {
        if amount == 0 {
            return Ok(Withdrawal::NONE);
        }

        let primary_balance = self.primary_for(actor).map_or(0, |l| l.balance(actor));
        let from_primary = match self.order {
            SourceOrder::PrimaryOnly | SourceOrder::PrimaryThenFallback => {
                primary_balance.min(amount)
            }
            SourceOrder::FallbackOnly => 0,
        };
        let remaining = amount - from_primary;
        if remaining == 0 {
            return Ok(Withdrawal {
                from_primary,
                fallback_units: 0.0,
            });
        }

        let fallback_units = remaining as f64 / self.ratio;
        if self.order.uses_fallback() && self.fallback_covers(actor, fallback_units) {
            return Ok(Withdrawal {
                from_primary,
                fallback_units,
            });
        }

        Err(ArbiterError::InsufficientResource {
            unit: "alternate",
            needed: amount as f64,
            available: self.available(actor) as f64,
        })
    }

    pub fn has_enough(&self, actor: ActorId, amount: u64) -> bool {
        self.plan(actor, amount).is_ok()
    }

    /// Debits `amount` across the chain, all or nothing.
    pub fn try_consume(&self, actor: ActorId, amount: u64) -> Result<Withdrawal, ArbiterError> {
        let plan = self.plan(actor, amount)?;

        if plan.from_primary > 0 {
            let withdrawn = self
                .primary_for(actor)
                .is_some_and(|l| l.withdraw(actor, plan.from_primary));
            if !withdrawn {
                return Err(ArbiterError::InsufficientResource {
                    unit: "alternate",
                    needed: amount as f64,
                    available: self.available(actor) as f64,
                });
            }
        }

        if plan.fallback_units > 0.0 {
            let Some(store) = self.fallback_for() else {
                return Err(ArbiterError::InsufficientResource {
                    unit: "alternate",
                    needed: amount as f64,
                    available: plan.from_primary as f64,
                });
            };
            let current = store.current(actor);
            // The primary ledger may already be drained if the store changed
            // since planning.
            if current <= plan.fallback_units + self.floor {
                warn!(%actor, current, needed = plan.fallback_units, "fallback store changed during withdrawal");
                return Err(ArbiterError::InsufficientResource {
                    unit: "alternate",
                    needed: amount as f64,
                    available: plan.from_primary as f64,
                });
            }
            store.set(actor, current - plan.fallback_units);
        }

        debug!(%actor, amount, from_primary = plan.from_primary, fallback_units = plan.fallback_units, "alternate currency consumed");
        Ok(plan)
    }

    pub fn consume(&self, actor: ActorId, amount: u64) -> bool {
        self.try_consume(actor, amount).is_ok()
    }

    /// Non-lethal penalty: lowers the fallback store, never below its floor.
    pub fn apply_penalty(&self, actor: ActorId, amount: f64) {
        let Some(store) = self.fallback.as_ref() else {
            return;
        };
        let current = store.current(actor);
        if current > self.floor && amount > 0.0 {
            store.set(actor, (current - amount).max(self.floor));
        }
    }

    /// Hardcore penalty: empties the fallback store.
    pub fn apply_terminal_penalty(&self, actor: ActorId) {
        if let Some(store) = self.fallback.as_ref() {
            warn!(%actor, "terminal penalty applied");
            store.set(actor, 0.0);
        }
    }
}

impl std::fmt::Debug for AlternateCurrencyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlternateCurrencyAdapter")
            .field("order", &self.order)
            .field("ratio", &self.ratio)
            .field("floor", &self.floor)
            .field("has_primary", &self.primary.is_some())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}
