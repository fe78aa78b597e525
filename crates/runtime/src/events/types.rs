//! Event types for different topics.

use serde::{Deserialize, Serialize};

use arbiter_core::{ActorId, CooldownCategory, CooldownSync, DenyReason, Tick};

/// A cooldown entry was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownEvent {
    pub actor: ActorId,
    pub namespace: String,
    pub category: CooldownCategory,
    pub ends_at: Tick,
    /// Shortened copy written into another namespace.
    pub cross: bool,
}

impl From<&CooldownSync> for CooldownEvent {
    fn from(sync: &CooldownSync) -> Self {
        Self {
            actor: sync.actor,
            namespace: sync.namespace.as_str().to_owned(),
            category: sync.category,
            ends_at: sync.ends_at,
            cross: sync.cross,
        }
    }
}

impl CooldownEvent {
    /// Rebuilds the core sync notice, e.g. to feed a `CooldownMirror`.
    pub fn to_sync(&self) -> CooldownSync {
        CooldownSync {
            actor: self.actor,
            namespace: self.namespace.as_str().into(),
            category: self.category,
            ends_at: self.ends_at,
            cross: self.cross,
        }
    }
}

/// What the resolution hook did with an action's cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    /// The normal pools were debited.
    Charged { amount: f64 },
    /// A staged alternate-currency reservation was committed.
    Committed { amount: u64 },
    /// The staged reservation was dropped without moving funds.
    Discarded,
    /// The alternate currency fell short at commit; safe policy.
    Cancelled { reason: DenyReason },
    /// The alternate currency fell short at commit; terminal policy.
    TerminalPenalty { reason: DenyReason },
    /// The normal pools could not cover the cost at debit time.
    Shortfall { reason: DenyReason },
    /// Nothing to charge.
    Skipped,
}

impl ResolutionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Charged { .. } => "charged",
            Self::Committed { .. } => "committed",
            Self::Discarded => "discarded",
            Self::Cancelled { .. } => "cancelled",
            Self::TerminalPenalty { .. } => "terminal_penalty",
            Self::Shortfall { .. } => "shortfall",
            Self::Skipped => "skipped",
        }
    }

    /// Funds actually moved.
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Charged { .. } | Self::Committed { .. })
    }

    /// The action keeps its effect: it was paid, free, or let through under
    /// the terminal policy. Cancelled and short actions do not.
    pub fn lets_effect_stand(&self) -> bool {
        matches!(
            self,
            Self::Charged { .. }
                | Self::Committed { .. }
                | Self::TerminalPenalty { .. }
                | Self::Skipped
        )
    }
}

/// Reservation and resolution bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// An alternate-currency cost was staged by the cost-calculation hook.
    Staged {
        actor: ActorId,
        action_id: String,
        amount: u64,
    },
    /// The resolution hook finished.
    Resolved {
        actor: ActorId,
        action_id: String,
        outcome: ResolutionOutcome,
        tick: Tick,
    },
    /// The sweeper removed stale state.
    Swept {
        tick: Tick,
        reservations: usize,
        cooldowns: usize,
    },
    /// Ephemeral state of a departed actor was dropped.
    ActorForgotten { actor: ActorId, reservations: usize },
}
