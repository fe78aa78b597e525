//! Post-resolution hook system.
//!
//! Hooks run after the resolution hook has settled an action's cost. Each one
//! inspects the [`HookContext`] and may update engine state and emit events
//! that the engine publishes on the bus.
//!
//! # Architecture
//!
//! - Hooks are registered in the `RuntimeBuilder` and sorted by priority
//! - After every resolution, hooks are evaluated in priority order
//! - A hook whose `should_trigger()` returns false is skipped
//! - Events returned by hooks are published after all hooks ran

mod context;
mod cooldown;
mod journal;
mod registry;

pub use context::HookContext;
pub use cooldown::CooldownHook;
pub use journal::ResolutionJournalHook;
pub use registry::HookRegistry;

use crate::events::Event;

/// Hook evaluated after every resolution.
///
/// # Execution Order
///
/// Hooks are sorted by priority (lower values execute first):
/// - Negative priorities: state-changing hooks (cooldowns)
/// - Zero: default priority for most hooks
/// - Positive priorities: observers that only report
pub trait ResolutionHook: Send + Sync {
    /// Returns a human-readable name for this hook (used in logging).
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    fn should_trigger(&self, ctx: &HookContext<'_>) -> bool;

    /// Runs the hook and returns the events to publish.
    fn run(&self, ctx: &HookContext<'_>) -> Vec<Event>;
}
