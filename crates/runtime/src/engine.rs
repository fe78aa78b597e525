//! The arbitration engine: the two hook entry points plus the gate.
//!
//! A costed action goes through three calls from its host:
//!
//! 1. [`ArbitrationEngine::on_cost_calculation`] when the host computes the
//!    cost. Normal costs are discounted; when the actor's equipment reroutes
//!    costs to the alternate currency, the alternate amount is staged as a
//!    reservation and the normal cost becomes zero.
//! 2. [`ArbitrationEngine::authorize`] right before the effect executes. A
//!    `Deny` must stop the effect.
//! 3. [`ArbitrationEngine::on_resolution`] once the effect has run (or was
//!    abandoned). Normal costs are debited, reservations are committed or
//!    discarded, and the resolution hooks run.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use arbiter_core::{
    ActionMetadata, ActorDirectory, ActorId, AlternateCostFormula, AlternateCurrencyAdapter,
    ArbiterConfig, ArbiterError, BridgeArbiter, CallerSystem, CastGate, CastRequest,
    CategoryMapper, CooldownLedger, CostReservationLedger, DenyReason, DiscountPipeline,
    EquipmentBonus, EquipmentBonusCache, GateDecision, Namespace, Notice, Notifier, PoolId,
    ShortfallAction, Tick,
};

use crate::events::{Event, EventBus, LedgerEvent, ResolutionOutcome};
use crate::hooks::{HookContext, HookRegistry};

/// How the cost returned by the cost-calculation hook is funded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Funding {
    /// Paid from the normal pools at resolution.
    Pools,
    /// Rerouted to the alternate currency; `amount` is staged.
    Alternate { amount: u64 },
    /// The actor is exempt from costs.
    Unrestricted,
}

/// Answer of the cost-calculation hook.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostQuote {
    /// Cost the host should charge in its native units.
    pub cost: f64,
    pub funding: Funding,
}

impl CostQuote {
    fn pools(cost: f64) -> Self {
        Self {
            cost,
            funding: Funding::Pools,
        }
    }
}

/// Stale state removed by one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reservations: usize,
    pub cooldowns: usize,
}

/// Collaborators the engine is assembled from.
pub struct EngineParts {
    pub config: ArbiterConfig,
    pub directory: Arc<dyn ActorDirectory>,
    pub bridge: Arc<BridgeArbiter>,
    pub reservations: Arc<CostReservationLedger>,
    pub alternate: Arc<AlternateCurrencyAdapter>,
    pub discounts: DiscountPipeline,
    pub cooldowns: Arc<CooldownLedger>,
    pub mappers: HashMap<CallerSystem, Arc<dyn CategoryMapper>>,
    pub equipment_cache: Arc<EquipmentBonusCache>,
    pub notifier: Arc<dyn Notifier>,
    pub hooks: HookRegistry,
    pub events: EventBus,
}

pub struct ArbitrationEngine {
    config: ArbiterConfig,
    directory: Arc<dyn ActorDirectory>,
    bridge: Arc<BridgeArbiter>,
    reservations: Arc<CostReservationLedger>,
    alternate: Arc<AlternateCurrencyAdapter>,
    gate: CastGate,
    discounts: DiscountPipeline,
    formula: AlternateCostFormula,
    cooldowns: Arc<CooldownLedger>,
    mappers: HashMap<CallerSystem, Arc<dyn CategoryMapper>>,
    equipment_cache: Arc<EquipmentBonusCache>,
    notifier: Arc<dyn Notifier>,
    hooks: HookRegistry,
    events: EventBus,
    tick: AtomicU64,
}

impl ArbitrationEngine {
    pub fn new(parts: EngineParts) -> Self {
        let gate = CastGate::new(
            &parts.config,
            Arc::clone(&parts.directory),
            Arc::clone(&parts.bridge),
            Arc::clone(&parts.reservations),
            Arc::clone(&parts.alternate),
            Arc::clone(&parts.notifier),
        );
        Self {
            formula: AlternateCostFormula::from_config(&parts.config),
            config: parts.config,
            directory: parts.directory,
            bridge: parts.bridge,
            reservations: parts.reservations,
            alternate: parts.alternate,
            gate,
            discounts: parts.discounts,
            cooldowns: parts.cooldowns,
            mappers: parts.mappers,
            equipment_cache: parts.equipment_cache,
            notifier: parts.notifier,
            hooks: parts.hooks,
            events: parts.events,
            tick: AtomicU64::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------

    /// Cost-calculation hook.
    ///
    /// Returns the cost the host should charge. When the alternate currency
    /// is engaged the returned cost is zero and the alternate amount is
    /// staged, overwriting any earlier stage of the same system.
    pub fn on_cost_calculation(
        &self,
        actor: ActorId,
        base_cost: f64,
        metadata: &ActionMetadata,
    ) -> CostQuote {
        if self.directory.is_unrestricted(actor) {
            return CostQuote {
                cost: base_cost,
                funding: Funding::Unrestricted,
            };
        }
        if !(base_cost.is_finite() && base_cost > 0.0) {
            return CostQuote::pools(base_cost);
        }

        let equipment = self.discounts.equipment();
        if equipment.alternate_currency_engaged(actor) {
            let matched = equipment.school_matches(actor, metadata.school);
            let amount = self.formula.cost(base_cost, metadata, matched);
            if amount > 0 {
                self.reservations.stage(actor, metadata.system, amount);
                self.events.publish(Event::Ledger(LedgerEvent::Staged {
                    actor,
                    action_id: metadata.action_id.clone(),
                    amount,
                }));
                return CostQuote {
                    cost: 0.0,
                    funding: Funding::Alternate { amount },
                };
            }
        }

        let cost = self.discounts.apply(actor, metadata.school, base_cost);
        if cost != base_cost {
            debug!(%actor, action = %metadata.action_id, base_cost, cost, "discount applied");
        }
        CostQuote::pools(cost)
    }

    /// Pre-execution check: category cooldown first, then the cast gate.
    pub fn authorize(&self, actor: ActorId, request: &CastRequest) -> GateDecision {
        if self.directory.is_unrestricted(actor) {
            return GateDecision::Allow;
        }

        if let Some(reason) = self.cooldown_denial(actor, request) {
            debug!(%actor, action = %request.metadata.action_id, %reason, "cast denied");
            self.notifier.notify(Notice::denied(actor, reason.clone()));
            return GateDecision::Deny(reason);
        }

        self.gate.can_proceed(actor, request)
    }

    fn cooldown_denial(&self, actor: ActorId, request: &CastRequest) -> Option<DenyReason> {
        if !self.cooldowns.is_enabled() {
            return None;
        }
        let category = self
            .mappers
            .get(&request.system())?
            .category(&request.metadata.action_id)?;
        let remaining = self.cooldowns.remaining(
            actor,
            &Namespace::from(request.system()),
            category,
            self.current_tick(),
        );
        (remaining > 0).then(|| DenyReason::OnCooldown {
            category: category.to_string(),
            remaining_ticks: remaining,
        })
    }

    /// Resolution hook.
    ///
    /// `succeeded` tells whether the action's effect ran. Failed actions
    /// discard their reservation; successful ones pay and start their
    /// cooldown. Calling this twice for one action never charges twice for
    /// a reservation.
    pub fn on_resolution(
        &self,
        actor: ActorId,
        request: &CastRequest,
        succeeded: bool,
    ) -> ResolutionOutcome {
        if self.directory.is_unrestricted(actor) {
            return ResolutionOutcome::Skipped;
        }

        let outcome = if !succeeded {
            match self.reservations.discard(actor, request.system()) {
                Some(_) => ResolutionOutcome::Discarded,
                None => ResolutionOutcome::Skipped,
            }
        } else if request.cost.is_finite() && request.cost > 0.0 {
            self.charge_pools(actor, request)
        } else {
            self.commit_reservation(actor, request.system())
        };

        debug!(%actor, action = %request.metadata.action_id, outcome = outcome.label(), "resolved");
        self.run_hooks(actor, request, succeeded, &outcome);
        outcome
    }

    fn charge_pools(&self, actor: ActorId, request: &CastRequest) -> ResolutionOutcome {
        match self.bridge.try_consume(actor, request.cost, request.system()) {
            Ok(()) => ResolutionOutcome::Charged {
                amount: request.cost,
            },
            Err(err) => {
                let reason = match err {
                    ArbiterError::InsufficientResource {
                        needed, available, ..
                    } => DenyReason::InsufficientResource { needed, available },
                    other => {
                        warn!(%actor, error = %other, code = other.error_code(), "pool debit failed");
                        DenyReason::InsufficientResource {
                            needed: request.cost,
                            available: self.bridge.get_balance(actor, request.system()),
                        }
                    }
                };
                self.notifier.notify(Notice::denied(actor, reason.clone()));
                ResolutionOutcome::Shortfall { reason }
            }
        }
    }

    fn commit_reservation(&self, actor: ActorId, system: CallerSystem) -> ResolutionOutcome {
        let staged = self.reservations.peek(actor, system);
        let result = self.reservations.try_commit(actor, system, |amount| {
            self.alternate.try_consume(actor, amount).map(|_| ())
        });

        match result {
            Ok(amount) => {
                if self.config.show_cost_messages {
                    self.notifier.notify(Notice::consumed(actor, amount));
                }
                ResolutionOutcome::Committed { amount }
            }
            Err(ArbiterError::ReservationMissing { .. }) => ResolutionOutcome::Skipped,
            Err(ArbiterError::DoubleCommitAttempt { .. }) => ResolutionOutcome::Skipped,
            Err(ArbiterError::ReservationExpired { .. }) => {
                debug!(%actor, %system, "reservation expired before commit");
                ResolutionOutcome::Discarded
            }
            Err(err) => {
                let needed = staged.map_or(0, |r| r.amount);
                self.reservations.discard(actor, system);
                let reason = DenyReason::InsufficientAlternate {
                    needed,
                    available: self.alternate.available(actor),
                };
                debug!(%actor, error = %err, "alternate commit fell short");
                self.settle_shortfall(actor, reason)
            }
        }
    }

    fn settle_shortfall(&self, actor: ActorId, reason: DenyReason) -> ResolutionOutcome {
        match self.gate.policy().on_shortfall() {
            ShortfallAction::Allow => {
                self.alternate.apply_terminal_penalty(actor);
                self.notifier
                    .notify(Notice::terminal_penalty(actor, reason.clone()));
                ResolutionOutcome::TerminalPenalty { reason }
            }
            ShortfallAction::Deny { penalty } => {
                if penalty {
                    self.alternate
                        .apply_penalty(actor, self.config.insufficient_penalty);
                }
                self.notifier.notify(Notice::cancelled(actor, reason.clone()));
                ResolutionOutcome::Cancelled { reason }
            }
        }
    }

    fn run_hooks(
        &self,
        actor: ActorId,
        request: &CastRequest,
        succeeded: bool,
        outcome: &ResolutionOutcome,
    ) {
        let ctx = HookContext {
            actor,
            request,
            succeeded,
            outcome,
            tick: self.current_tick(),
            cooldowns: &self.cooldowns,
            mapper: self.mappers.get(&request.system()).map(|m| m.as_ref()),
            cross_namespace_factor: self.config.cross_namespace_factor,
        };
        for event in self.hooks.execute(&ctx) {
            self.events.publish(event);
        }
    }

    // ------------------------------------------------------------------
    // Ticks and maintenance
    // ------------------------------------------------------------------

    pub fn current_tick(&self) -> Tick {
        self.tick.load(Ordering::Acquire)
    }

    /// Moves the cooldown clock forward and returns the new tick.
    pub fn advance_tick(&self, delta: Tick) -> Tick {
        self.tick
            .fetch_add(delta, Ordering::AcqRel)
            .saturating_add(delta)
    }

    /// Removes expired reservations and finished cooldowns.
    pub fn sweep(&self) -> SweepReport {
        let tick = self.current_tick();
        let report = SweepReport {
            reservations: self.reservations.sweep_expired(self.reservations.now()),
            cooldowns: self.cooldowns.prune(tick),
        };
        if report != SweepReport::default() {
            debug!(tick, reservations = report.reservations, cooldowns = report.cooldowns, "swept");
        }
        self.events.publish(Event::Ledger(LedgerEvent::Swept {
            tick,
            reservations: report.reservations,
            cooldowns: report.cooldowns,
        }));
        report
    }

    // ------------------------------------------------------------------
    // Actor lifecycle and equipment
    // ------------------------------------------------------------------

    /// Drops every piece of ephemeral state of a departed actor.
    pub fn forget_actor(&self, actor: ActorId) {
        let reservations = self.reservations.discard_actor(actor);
        self.cooldowns.forget(actor);
        self.equipment_cache.invalidate(actor);
        debug!(%actor, reservations, "actor forgotten");
        self.events
            .publish(Event::Ledger(LedgerEvent::ActorForgotten {
                actor,
                reservations,
            }));
    }

    /// Equipment changed, or the actor logged in or respawned.
    pub fn equipment_changed(&self, actor: ActorId) {
        self.equipment_cache.invalidate(actor);
    }

    /// Pushes a gear bonus computed by the host's equipment subsystem.
    pub fn record_equipment_bonus(&self, actor: ActorId, pool: PoolId, bonus: EquipmentBonus) {
        self.equipment_cache.record(actor, pool, bonus);
    }

    pub fn effective_max(&self, actor: ActorId, system: CallerSystem) -> f64 {
        self.bridge.effective_max(actor, system)
    }

    pub fn effective_regen(&self, actor: ActorId, system: CallerSystem, base_regen: f64) -> f64 {
        self.bridge.effective_regen(actor, system, base_regen)
    }

    /// Cooldown ticks left for `action_id`, zero when it has no category.
    pub fn cooldown_remaining(&self, actor: ActorId, system: CallerSystem, action_id: &str) -> Tick {
        let Some(category) = self
            .mappers
            .get(&system)
            .and_then(|m| m.category(action_id))
        else {
            return 0;
        };
        self.cooldowns.remaining(
            actor,
            &Namespace::from(system),
            category,
            self.current_tick(),
        )
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn bridge(&self) -> &Arc<BridgeArbiter> {
        &self.bridge
    }

    pub fn reservations(&self) -> &Arc<CostReservationLedger> {
        &self.reservations
    }

    pub fn alternate(&self) -> &Arc<AlternateCurrencyAdapter> {
        &self.alternate
    }

    pub fn cooldowns(&self) -> &Arc<CooldownLedger> {
        &self.cooldowns
    }

    pub fn discounts(&self) -> &DiscountPipeline {
        &self.discounts
    }

    pub fn gate(&self) -> &CastGate {
        &self.gate
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

impl std::fmt::Debug for ArbitrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArbitrationEngine")
            .field("mode", &self.bridge.resolve_mode())
            .field("tick", &self.current_tick())
            .field("reservations", &self.reservations.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}
