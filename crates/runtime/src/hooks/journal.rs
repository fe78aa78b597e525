use super::{HookContext, ResolutionHook};
use crate::events::{Event, LedgerEvent};

/// Reports every resolution on the ledger topic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolutionJournalHook;

impl ResolutionHook for ResolutionJournalHook {
    fn name(&self) -> &'static str {
        "resolution_journal"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn should_trigger(&self, _ctx: &HookContext<'_>) -> bool {
        true
    }

    fn run(&self, ctx: &HookContext<'_>) -> Vec<Event> {
        vec![Event::Ledger(LedgerEvent::Resolved {
            actor: ctx.actor,
            action_id: ctx.action_id().to_owned(),
            outcome: ctx.outcome.clone(),
            tick: ctx.tick,
        })]
    }
}
