//! Topic-based event bus for arbitration events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need (a chat overlay to notices, a client replica to
//! cooldowns, diagnostics to ledger activity).

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CooldownEvent, LedgerEvent, ResolutionOutcome};
