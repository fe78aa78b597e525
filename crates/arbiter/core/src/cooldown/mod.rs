//! Per-actor category cooldowns.
//!
//! Cooldowns are keyed by actor, namespace and category and store the tick at
//! which they end. Namespaces keep the two calling systems apart: an
//! offensive cast in one namespace does not block offensive casts in another
//! unless cross-namespace cooldowns are switched on, in which case a shortened
//! cooldown is also written to every other known namespace.
mod mapper;
mod mirror;

pub use mapper::{CategoryMapper, StaticCategoryMapper};
pub use mirror::CooldownMirror;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::actor::{ActorId, CallerSystem};
use crate::clock::Tick;
use crate::config::ArbiterConfig;

/// Broad class of an action for cooldown purposes.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CooldownCategory {
    Offensive,
    Defensive,
    Utility,
    Movement,
}

/// Partition key separating the cooldowns of unrelated calling systems.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Arc<str>);

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<CallerSystem> for Namespace {
    fn from(system: CallerSystem) -> Self {
        Self::new(system.namespace_label())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Published after a cooldown is written so replicas can follow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CooldownSync {
    pub actor: ActorId,
    pub namespace: Namespace,
    pub category: CooldownCategory,
    pub ends_at: Tick,
    /// Written as the shortened cross-namespace copy.
    pub cross: bool,
}

type ActorCooldowns = HashMap<(Namespace, CooldownCategory), Tick>;

pub struct CooldownLedger {
    entries: DashMap<ActorId, ActorCooldowns>,
    namespaces: DashSet<Namespace>,
    enabled: bool,
    cross_namespace: bool,
    base_duration: Tick,
    reduction_cap: f64,
}

impl CooldownLedger {
    pub fn new(config: &ArbiterConfig) -> Self {
        let ledger = Self {
            entries: DashMap::new(),
            namespaces: DashSet::new(),
            enabled: config.cooldowns_enabled,
            cross_namespace: config.cross_namespace_cooldowns,
            base_duration: config.cooldown_base_duration,
            reduction_cap: config.cooldown_reduction_cap.clamp(0.0, 1.0),
        };
        ledger.register_namespace(CallerSystem::A);
        ledger.register_namespace(CallerSystem::B);
        ledger
    }

    /// Makes `namespace` a target of cross-namespace cooldowns.
    pub fn register_namespace(&self, namespace: impl Into<Namespace>) {
        self.namespaces.insert(namespace.into());
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn base_duration(&self) -> Tick {
        self.base_duration
    }

    /// Base duration shortened by `reduction`, which is capped by
    /// configuration.
    pub fn reduced_duration(&self, duration: Tick, reduction: f64) -> Tick {
        let reduction = if reduction.is_finite() {
            reduction.clamp(0.0, self.reduction_cap)
        } else {
            0.0
        };
        (duration as f64 * (1.0 - reduction)).round() as Tick
    }

    pub fn is_on_cooldown(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        now: Tick,
    ) -> bool {
        self.remaining(actor, namespace, category, now) > 0
    }

    /// Ticks left, zero when not on cooldown.
    pub fn remaining(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        now: Tick,
    ) -> Tick {
        if !self.enabled {
            return 0;
        }
        self.entries
            .get(&actor)
            .and_then(|map| map.get(&(namespace.clone(), category)).copied())
            .map_or(0, |ends_at| ends_at.saturating_sub(now))
    }

    /// Starts a cooldown of `duration` ticks and returns its end tick.
    ///
    /// With cross-namespace cooldowns enabled, every other known namespace
    /// also gets `duration * cross_factor`, without shortening a longer
    /// cooldown already running there.
    pub fn apply(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        duration: Tick,
        cross_factor: f64,
        now: Tick,
    ) -> Option<Tick> {
        self.apply_with_sync(actor, namespace, category, duration, cross_factor, now)
            .first()
            .map(|sync| sync.ends_at)
    }

    /// Like [`apply`](Self::apply), returning one sync per written entry.
    pub fn apply_with_sync(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        duration: Tick,
        cross_factor: f64,
        now: Tick,
    ) -> Vec<CooldownSync> {
        if !self.enabled || duration == 0 {
            return Vec::new();
        }
        self.namespaces.insert(namespace.clone());

        let ends_at = now.saturating_add(duration);
        let mut syncs = vec![CooldownSync {
            actor,
            namespace: namespace.clone(),
            category,
            ends_at,
            cross: false,
        }];

        let cross_duration = if cross_factor.is_finite() {
            (duration as f64 * cross_factor.clamp(0.0, 1.0)).floor() as Tick
        } else {
            0
        };
        if self.cross_namespace && cross_duration > 0 {
            let cross_end = now.saturating_add(cross_duration);
            syncs.extend(
                self.namespaces
                    .iter()
                    .filter(|ns| ns.key() != namespace)
                    .map(|ns| CooldownSync {
                        actor,
                        namespace: ns.key().clone(),
                        category,
                        ends_at: cross_end,
                        cross: true,
                    }),
            );
        }

        let mut map = self.entries.entry(actor).or_default();
        for sync in &mut syncs {
            let slot = map
                .entry((sync.namespace.clone(), category))
                .or_insert(0);
            if sync.cross {
                *slot = (*slot).max(sync.ends_at);
                sync.ends_at = *slot;
            } else {
                *slot = sync.ends_at;
            }
        }
        drop(map);

        debug!(%actor, %namespace, %category, duration, ends_at, cross = syncs.len() - 1, "cooldown applied");
        syncs
    }

    /// Clears one category in every namespace, or everything for the actor.
    pub fn clear(&self, actor: ActorId, category: Option<CooldownCategory>) {
        match category {
            None => {
                self.entries.remove(&actor);
            }
            Some(category) => {
                if let Some(mut map) = self.entries.get_mut(&actor) {
                    map.retain(|(_, c), _| *c != category);
                }
            }
        }
    }

    /// Drops cooldowns that ended before `now`, and actors left with none.
    pub fn prune(&self, now: Tick) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, map| {
            let before = map.len();
            map.retain(|_, ends_at| *ends_at > now);
            removed += before - map.len();
            !map.is_empty()
        });
        removed
    }

    pub fn forget(&self, actor: ActorId) {
        self.entries.remove(&actor);
    }

    pub fn tracked_actors(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for CooldownLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CooldownLedger")
            .field("actors", &self.entries.len())
            .field("namespaces", &self.namespaces.len())
            .field("enabled", &self.enabled)
            .field("cross_namespace", &self.cross_namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTOR: ActorId = ActorId(5);

    fn ledger(cross: bool) -> CooldownLedger {
        CooldownLedger::new(&ArbiterConfig {
            cross_namespace_cooldowns: cross,
            ..ArbiterConfig::default()
        })
    }

    #[test]
    fn cooldown_expires_at_end_tick() {
        let ledger = ledger(false);
        let sys1 = Namespace::new("sys1");
        let sys2 = Namespace::new("sys2");
        ledger.register_namespace(sys2.clone());

        let ends = ledger.apply(ACTOR, &sys1, CooldownCategory::Movement, 100, 0.5, 0);
        assert_eq!(ends, Some(100));

        assert!(ledger.is_on_cooldown(ACTOR, &sys1, CooldownCategory::Movement, 50));
        assert!(!ledger.is_on_cooldown(ACTOR, &sys1, CooldownCategory::Movement, 150));
        assert!(!ledger.is_on_cooldown(ACTOR, &sys2, CooldownCategory::Movement, 50));
        assert_eq!(ledger.remaining(ACTOR, &sys1, CooldownCategory::Movement, 50), 50);
    }

    #[test]
    fn categories_are_independent() {
        let ledger = ledger(false);
        let ns = Namespace::from(CallerSystem::A);
        ledger.apply(ACTOR, &ns, CooldownCategory::Offensive, 100, 0.5, 0);
        assert!(!ledger.is_on_cooldown(ACTOR, &ns, CooldownCategory::Defensive, 10));
    }

    #[test]
    fn cross_namespace_applies_shortened_copy() {
        let ledger = ledger(true);
        let a = Namespace::from(CallerSystem::A);
        let b = Namespace::from(CallerSystem::B);

        let syncs = ledger.apply_with_sync(ACTOR, &a, CooldownCategory::Offensive, 100, 0.5, 10);
        assert_eq!(syncs.len(), 2);
        assert!(syncs[1].cross);
        assert_eq!(syncs[1].namespace, b);

        assert_eq!(ledger.remaining(ACTOR, &a, CooldownCategory::Offensive, 10), 100);
        assert_eq!(ledger.remaining(ACTOR, &b, CooldownCategory::Offensive, 10), 50);
        assert!(!ledger.is_on_cooldown(ACTOR, &b, CooldownCategory::Offensive, 60));
    }

    #[test]
    fn cross_copy_does_not_shorten_running_cooldown() {
        let ledger = ledger(true);
        let a = Namespace::from(CallerSystem::A);
        let b = Namespace::from(CallerSystem::B);

        ledger.apply(ACTOR, &b, CooldownCategory::Utility, 200, 0.5, 0);
        ledger.apply(ACTOR, &a, CooldownCategory::Utility, 100, 0.5, 0);
        assert_eq!(ledger.remaining(ACTOR, &b, CooldownCategory::Utility, 0), 200);
    }

    #[test]
    fn clear_one_category_or_all() {
        let ledger = ledger(false);
        let ns = Namespace::from(CallerSystem::B);
        ledger.apply(ACTOR, &ns, CooldownCategory::Offensive, 100, 0.5, 0);
        ledger.apply(ACTOR, &ns, CooldownCategory::Movement, 100, 0.5, 0);

        ledger.clear(ACTOR, Some(CooldownCategory::Offensive));
        assert!(!ledger.is_on_cooldown(ACTOR, &ns, CooldownCategory::Offensive, 1));
        assert!(ledger.is_on_cooldown(ACTOR, &ns, CooldownCategory::Movement, 1));

        ledger.clear(ACTOR, None);
        assert_eq!(ledger.tracked_actors(), 0);
    }

    #[test]
    fn disabled_ledger_never_blocks() {
        let ledger = CooldownLedger::new(&ArbiterConfig {
            cooldowns_enabled: false,
            ..ArbiterConfig::default()
        });
        let ns = Namespace::from(CallerSystem::A);
        assert_eq!(ledger.apply(ACTOR, &ns, CooldownCategory::Offensive, 100, 0.5, 0), None);
        assert!(!ledger.is_on_cooldown(ACTOR, &ns, CooldownCategory::Offensive, 1));
    }

    #[test]
    fn reduction_is_capped() {
        let ledger = ledger(false);
        assert_eq!(ledger.reduced_duration(100, 0.25), 75);
        assert_eq!(ledger.reduced_duration(100, 0.95), 20);
        assert_eq!(ledger.reduced_duration(100, -1.0), 100);
    }

    #[test]
    fn prune_removes_finished_entries() {
        let ledger = ledger(false);
        let ns = Namespace::from(CallerSystem::A);
        ledger.apply(ACTOR, &ns, CooldownCategory::Offensive, 10, 0.5, 0);
        ledger.apply(ActorId(6), &ns, CooldownCategory::Offensive, 100, 0.5, 0);

        assert_eq!(ledger.prune(20), 1);
        assert_eq!(ledger.tracked_actors(), 1);
    }
}
