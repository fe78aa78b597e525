//! The cast gate: the single check every costed action must pass.
//!
//! ```text
//! Start ─ unrestricted actor ──────────────────────────────▶ Allow
//!   │
//!   ├─ cost == 0 ─ pending alternate reservation? ─ no ────▶ Allow
//!   │                        │ yes
//!   │                        ├─ covered ───────────────────▶ Allow
//!   │                        └─ short ─ shortfall policy ──▶ Deny / Allow
//!   │
//!   └─ cost > 0 ─ bridge affordability ────────────────────▶ Allow / Deny
//! ```
//!
//! A denial always produces exactly one notice to the actor. Under the safe
//! shortfall policy an alternate-currency denial also costs a small,
//! non-lethal penalty.

use std::sync::Arc;

use tracing::debug;

use crate::action::CastRequest;
use crate::actor::{ActorDirectory, ActorId};
use crate::alternate::AlternateCurrencyAdapter;
use crate::bridge::BridgeArbiter;
use crate::config::ArbiterConfig;
use crate::error::DenyReason;
use crate::reservation::CostReservationLedger;

/// What a notice tells the actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoticeKind {
    Denied,
    Consumed,
    Cancelled,
    TerminalPenalty,
}

/// User-facing message addressed to one actor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notice {
    pub actor: ActorId,
    pub kind: NoticeKind,
    pub message: String,
    pub reason: Option<DenyReason>,
}

impl Notice {
    pub fn denied(actor: ActorId, reason: DenyReason) -> Self {
        Self {
            actor,
            kind: NoticeKind::Denied,
            message: reason.to_string(),
            reason: Some(reason),
        }
    }

    pub fn consumed(actor: ActorId, amount: u64) -> Self {
        Self {
            actor,
            kind: NoticeKind::Consumed,
            message: format!("Consumed {amount} alternate currency"),
            reason: None,
        }
    }

    pub fn cancelled(actor: ActorId, reason: DenyReason) -> Self {
        Self {
            actor,
            kind: NoticeKind::Cancelled,
            message: format!("Action cancelled: {reason}"),
            reason: Some(reason),
        }
    }

    pub fn terminal_penalty(actor: ActorId, reason: DenyReason) -> Self {
        Self {
            actor,
            kind: NoticeKind::TerminalPenalty,
            message: format!("Paid with your life: {reason}"),
            reason: Some(reason),
        }
    }
}

/// Delivers notices to actors.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Handling of an alternate-currency shortfall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShortfallPolicy {
    /// Refuse the action and charge nothing but a small penalty.
    #[default]
    DenyAndRefundNothing,
    /// Let the action run and apply the terminal penalty at resolution.
    AllowWithTerminalPenalty,
}

/// Outcome selected by a [`ShortfallPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShortfallAction {
    Deny { penalty: bool },
    Allow,
}

impl ShortfallPolicy {
    pub fn from_config(config: &ArbiterConfig) -> Self {
        if config.death_on_insufficient_alternate {
            Self::AllowWithTerminalPenalty
        } else {
            Self::DenyAndRefundNothing
        }
    }

    pub const fn on_shortfall(self) -> ShortfallAction {
        match self {
            Self::DenyAndRefundNothing => ShortfallAction::Deny { penalty: true },
            Self::AllowWithTerminalPenalty => ShortfallAction::Allow,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GateDecision {
    Allow,
    Deny(DenyReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

pub struct CastGate {
    directory: Arc<dyn ActorDirectory>,
    bridge: Arc<BridgeArbiter>,
    reservations: Arc<CostReservationLedger>,
    alternate: Arc<AlternateCurrencyAdapter>,
    notifier: Arc<dyn Notifier>,
    policy: ShortfallPolicy,
    penalty: f64,
}

impl CastGate {
    pub fn new(
        config: &ArbiterConfig,
        directory: Arc<dyn ActorDirectory>,
        bridge: Arc<BridgeArbiter>,
        reservations: Arc<CostReservationLedger>,
        alternate: Arc<AlternateCurrencyAdapter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory,
            bridge,
            reservations,
            alternate,
            notifier,
            policy: ShortfallPolicy::from_config(config),
            penalty: config.insufficient_penalty,
        }
    }

    pub fn policy(&self) -> ShortfallPolicy {
        self.policy
    }

    /// Decides whether `request` may execute. Never panics; a denial is
    /// reported to the actor before returning.
    pub fn can_proceed(&self, actor: ActorId, request: &CastRequest) -> GateDecision {
        if self.directory.is_unrestricted(actor) {
            return GateDecision::Allow;
        }

        let cost = if request.cost.is_finite() {
            request.cost.max(0.0)
        } else {
            f64::INFINITY
        };

        if cost == 0.0 {
            return self.check_reservation(actor, request);
        }

        match self.bridge.can_afford(actor, cost, request.system()) {
            Ok(()) => GateDecision::Allow,
            Err(reason) => self.deny(actor, reason),
        }
    }

    fn check_reservation(&self, actor: ActorId, request: &CastRequest) -> GateDecision {
        let Some(reservation) = self.reservations.pending(actor, request.system()) else {
            return GateDecision::Allow;
        };
        if self.alternate.has_enough(actor, reservation.amount) {
            return GateDecision::Allow;
        }

        let reason = DenyReason::InsufficientAlternate {
            needed: reservation.amount,
            available: self.alternate.available(actor),
        };
        match self.policy.on_shortfall() {
            ShortfallAction::Allow => {
                debug!(%actor, %reason, "shortfall allowed under terminal-penalty policy");
                GateDecision::Allow
            }
            ShortfallAction::Deny { penalty } => {
                self.reservations.discard(actor, request.system());
                if penalty {
                    self.alternate.apply_penalty(actor, self.penalty);
                }
                self.deny(actor, reason)
            }
        }
    }

    fn deny(&self, actor: ActorId, reason: DenyReason) -> GateDecision {
        debug!(%actor, code = reason.code(), %reason, "cast denied");
        self.notifier.notify(Notice::denied(actor, reason.clone()));
        GateDecision::Deny(reason)
    }
}

impl std::fmt::Debug for CastGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastGate")
            .field("policy", &self.policy)
            .field("penalty", &self.penalty)
            .field("mode", &self.bridge.resolve_mode())
            .finish()
    }
}
