use tracing::trace;

use super::{HookContext, ResolutionHook};
use crate::events::{CooldownEvent, Event};

/// Starts the category cooldown of every action whose effect ran and stood.
///
/// Unmapped actions have no category and are never put on cooldown. Actions
/// cancelled at resolution (alternate or pool shortfall) start none either.
#[derive(Debug, Default, Clone, Copy)]
pub struct CooldownHook;

impl ResolutionHook for CooldownHook {
    fn name(&self) -> &'static str {
        "cooldown"
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn should_trigger(&self, ctx: &HookContext<'_>) -> bool {
        ctx.effect_stands() && ctx.cooldowns.is_enabled() && ctx.mapper.is_some()
    }

    fn run(&self, ctx: &HookContext<'_>) -> Vec<Event> {
        let Some(category) = ctx.mapper.and_then(|m| m.category(ctx.action_id())) else {
            trace!(action = ctx.action_id(), "action has no cooldown category");
            return Vec::new();
        };

        let duration = ctx.cooldowns.reduced_duration(
            ctx.cooldowns.base_duration(),
            ctx.request.metadata.cooldown_reduction,
        );
        ctx.cooldowns
            .apply_with_sync(
                ctx.actor,
                &ctx.namespace(),
                category,
                duration,
                ctx.cross_namespace_factor,
                ctx.tick,
            )
            .iter()
            .map(|sync| Event::Cooldown(CooldownEvent::from(sync)))
            .collect()
    }
}
