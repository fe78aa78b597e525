//! Hook registry for managing and executing resolution hooks.

use std::sync::Arc;

use tracing::debug;

use super::{CooldownHook, HookContext, ResolutionHook, ResolutionJournalHook};
use crate::events::Event;

/// Registry that executes resolution hooks in priority order.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Arc<[Arc<dyn ResolutionHook>]>,
}

impl HookRegistry {
    /// Creates a registry; hooks are sorted by priority (lower values first).
    pub fn new(mut hooks: Vec<Arc<dyn ResolutionHook>>) -> Self {
        hooks.sort_by_key(|h| h.priority());
        Self {
            hooks: hooks.into(),
        }
    }

    /// Creates a registry with the default set of hooks.
    ///
    /// Default hooks include:
    /// - CooldownHook: starts category cooldowns of executed actions
    /// - ResolutionJournalHook: reports outcomes on the ledger topic
    pub fn default_hooks() -> Self {
        Self::new(Self::defaults())
    }

    /// The default hooks plus `extra`.
    pub fn with_defaults(extra: Vec<Arc<dyn ResolutionHook>>) -> Self {
        let mut hooks = Self::defaults();
        hooks.extend(extra);
        Self::new(hooks)
    }

    fn defaults() -> Vec<Arc<dyn ResolutionHook>> {
        vec![
            Arc::new(CooldownHook) as Arc<dyn ResolutionHook>,
            Arc::new(ResolutionJournalHook) as Arc<dyn ResolutionHook>,
        ]
    }

    /// Runs every triggered hook and collects their events.
    pub fn execute(&self, ctx: &HookContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        for hook in self.hooks.iter() {
            if !hook.should_trigger(ctx) {
                continue;
            }
            let produced = hook.run(ctx);
            debug!(hook = hook.name(), actor = %ctx.actor, events = produced.len(), "hook ran");
            events.extend(produced);
        }
        events
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::default_hooks()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::{
        ActionMetadata, ActorId, ArbiterConfig, CallerSystem, CastRequest, CooldownCategory,
        CooldownLedger, StaticCategoryMapper,
    };

    use crate::events::ResolutionOutcome;

    struct Late;

    impl ResolutionHook for Late {
        fn name(&self) -> &'static str {
            "late"
        }

        fn priority(&self) -> i32 {
            500
        }

        fn should_trigger(&self, _ctx: &HookContext<'_>) -> bool {
            true
        }

        fn run(&self, _ctx: &HookContext<'_>) -> Vec<Event> {
            Vec::new()
        }
    }

    #[test]
    fn hooks_are_sorted_by_priority() {
        let registry = HookRegistry::with_defaults(vec![Arc::new(Late)]);
        assert_eq!(registry.names(), vec!["cooldown", "resolution_journal", "late"]);
    }

    #[test]
    fn failed_actions_only_reach_observers() {
        let ledger = CooldownLedger::new(&ArbiterConfig::default());
        let mapper: StaticCategoryMapper =
            [("sys_b:blink", CooldownCategory::Movement)].into_iter().collect();
        let request = CastRequest::new(ActionMetadata::new(CallerSystem::B, "sys_b:blink"), 5.0);
        let outcome = ResolutionOutcome::Skipped;
        let ctx = HookContext {
            actor: ActorId(1),
            request: &request,
            succeeded: false,
            outcome: &outcome,
            tick: 0,
            cooldowns: &ledger,
            mapper: Some(&mapper),
            cross_namespace_factor: 0.5,
        };

        let events = HookRegistry::default_hooks().execute(&ctx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Ledger(_)));
        assert_eq!(ledger.tracked_actors(), 0);
    }
}
