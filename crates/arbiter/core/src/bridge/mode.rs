//! Unification modes and their behaviour flags.

use core::str::FromStr;

use bitflags::bitflags;

use crate::error::ArbiterError;
use crate::pool::PoolId;

/// Process-wide policy deciding which pool(s) fund a cost.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnificationMode {
    /// Everything is paid from Pool A.
    APrimary,
    /// Everything is paid from Pool B.
    #[default]
    BPrimary,
    /// Shared pool serviced by Pool B; both systems read the same balance.
    Hybrid,
    /// Each system reads its own pool; costs are split across both.
    Separate,
    /// No unification: each system uses its native pool.
    Disabled,
}

bitflags! {
    /// Behaviour predicates of a mode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModeFlags: u8 {
        const SHARED_POOL = 1 << 0;
        const DUAL_COST   = 1 << 1;
        const ENABLED     = 1 << 2;
    }
}

/// Row of the mode strategy table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeStrategy {
    pub flags: ModeFlags,
    /// Pool servicing every read and write under the shared-pool family.
    pub shared_pool: Option<PoolId>,
}

const STRATEGIES: [ModeStrategy; 5] = [
    // APrimary
    ModeStrategy {
        flags: ModeFlags::SHARED_POOL.union(ModeFlags::ENABLED),
        shared_pool: Some(PoolId::A),
    },
    // BPrimary
    ModeStrategy {
        flags: ModeFlags::SHARED_POOL.union(ModeFlags::ENABLED),
        shared_pool: Some(PoolId::B),
    },
    // Hybrid
    ModeStrategy {
        flags: ModeFlags::SHARED_POOL.union(ModeFlags::ENABLED),
        shared_pool: Some(PoolId::B),
    },
    // Separate
    ModeStrategy {
        flags: ModeFlags::DUAL_COST.union(ModeFlags::ENABLED),
        shared_pool: None,
    },
    // Disabled
    ModeStrategy {
        flags: ModeFlags::empty(),
        shared_pool: None,
    },
];

impl UnificationMode {
    pub const fn strategy(self) -> ModeStrategy {
        STRATEGIES[self as usize]
    }

    pub const fn flags(self) -> ModeFlags {
        self.strategy().flags
    }

    pub const fn uses_shared_pool(self) -> bool {
        self.flags().contains(ModeFlags::SHARED_POOL)
    }

    pub const fn requires_dual_cost(self) -> bool {
        self.flags().contains(ModeFlags::DUAL_COST)
    }

    pub const fn is_unification_enabled(self) -> bool {
        self.flags().contains(ModeFlags::ENABLED)
    }

    pub const fn shared_pool(self) -> Option<PoolId> {
        self.strategy().shared_pool
    }

    /// Nearest mode that works with Pool A alone.
    pub const fn without_pool_b(self) -> Self {
        match self {
            Self::BPrimary | Self::Hybrid | Self::Separate => Self::APrimary,
            other => other,
        }
    }

    /// Parses a configuration value.
    pub fn parse_config(raw: &str) -> Result<Self, ArbiterError> {
        Self::from_str(raw.trim()).map_err(|_| ArbiterError::UnknownPolicyValue {
            key: "mode",
            value: raw.to_owned(),
            fallback: Self::default().into(),
        })
    }
}
