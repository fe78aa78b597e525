//! Error taxonomy for arbitration.
//!
//! Every failure in this crate is local and recoverable from the caller's
//! point of view: operations return typed results and nothing panics across
//! the cast gate. [`ArbiterError`] covers ledger and routing failures while
//! [`DenyReason`] is the structured reason attached to a gate denial.

use crate::actor::{ActorId, CallerSystem};
use crate::pool::PoolId;

/// Severity level of an error, used for logging and recovery strategies.
///
/// - **Recoverable**: the actor can succeed later (more resource, re-stage)
/// - **Validation**: bad input or configuration, substituted with a default
/// - **Internal**: a contract violation that the ledger neutralised
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Failures raised by pools, the bridge and the reservation ledger.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ArbiterError {
    #[error("insufficient {unit}: need {needed}, have {available}")]
    InsufficientResource {
        unit: &'static str,
        needed: f64,
        available: f64,
    },

    #[error("reservation for {actor} ({kind}) expired before commit")]
    ReservationExpired { actor: ActorId, kind: CallerSystem },

    #[error("unknown value '{value}' for {key}, using '{fallback}'")]
    UnknownPolicyValue {
        key: &'static str,
        value: String,
        fallback: &'static str,
    },

    #[error("pool {pool} is unavailable")]
    PoolUnavailable { pool: PoolId },

    #[error("reservation for {actor} ({kind}) was already committed")]
    DoubleCommitAttempt { actor: ActorId, kind: CallerSystem },

    #[error("no reservation staged for {actor} ({kind})")]
    ReservationMissing { actor: ActorId, kind: CallerSystem },

    #[error("invalid amount {0}")]
    InvalidAmount(f64),
}

impl ArbiterError {
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientResource { .. }
            | Self::ReservationExpired { .. }
            | Self::ReservationMissing { .. } => ErrorSeverity::Recoverable,
            Self::UnknownPolicyValue { .. }
            | Self::PoolUnavailable { .. }
            | Self::InvalidAmount(_) => ErrorSeverity::Validation,
            Self::DoubleCommitAttempt { .. } => ErrorSeverity::Internal,
        }
    }

    /// Expired reservations are handled exactly like a resource shortfall.
    pub const fn is_insufficient(&self) -> bool {
        matches!(
            self,
            Self::InsufficientResource { .. } | Self::ReservationExpired { .. }
        )
    }

    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientResource { .. } => "INSUFFICIENT_RESOURCE",
            Self::ReservationExpired { .. } => "RESERVATION_EXPIRED",
            Self::UnknownPolicyValue { .. } => "UNKNOWN_POLICY_VALUE",
            Self::PoolUnavailable { .. } => "POOL_UNAVAILABLE",
            Self::DoubleCommitAttempt { .. } => "DOUBLE_COMMIT_ATTEMPT",
            Self::ReservationMissing { .. } => "RESERVATION_MISSING",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
        }
    }
}

/// Why the gate refused an action.
///
/// The `Display` output is the text shown to the actor, always expressed in
/// the unit that ran short.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DenyReason {
    /// Normal pool(s) cannot cover the cost.
    InsufficientResource { needed: f64, available: f64 },
    /// A dual-cost share could not be covered.
    InsufficientDualShare {
        pool: PoolId,
        needed: f64,
        available: f64,
    },
    /// The staged alternate-currency reservation cannot be covered.
    InsufficientAlternate { needed: u64, available: u64 },
    /// The category cooldown has not elapsed.
    OnCooldown { category: String, remaining_ticks: u64 },
}

impl DenyReason {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientResource { .. } | Self::InsufficientDualShare { .. } => {
                "InsufficientResource"
            }
            Self::InsufficientAlternate { .. } => "InsufficientAlternate",
            Self::OnCooldown { .. } => "OnCooldown",
        }
    }

    pub const fn is_alternate(&self) -> bool {
        matches!(self, Self::InsufficientAlternate { .. })
    }
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientResource { needed, available } => write!(
                f,
                "Not enough power: need {}, have {}",
                needed.round(),
                available.floor()
            ),
            Self::InsufficientDualShare {
                pool,
                needed,
                available,
            } => write!(
                f,
                "Not enough {pool} power: need {}, have {}",
                needed.round(),
                available.floor()
            ),
            Self::InsufficientAlternate { needed, available } => write!(
                f,
                "Insufficient alternate currency: need {needed}, have {available}"
            ),
            Self::OnCooldown {
                category,
                remaining_ticks,
            } => write!(f, "{category} is on cooldown for {remaining_ticks} ticks"),
        }
    }
}
