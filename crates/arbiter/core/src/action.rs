//! Metadata that callers attach to a costed action.

use crate::actor::CallerSystem;
use crate::school::SpellSchool;

/// Rarity tier of a system B action.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpellRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl SpellRarity {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Describes the action whose cost is being arbitrated.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionMetadata {
    /// Identifier used for school classification and cooldown categories.
    pub action_id: String,
    pub system: CallerSystem,
    pub school: SpellSchool,
    /// Glyph tier (1..=3) for system A actions.
    pub tier: u8,
    pub rarity: SpellRarity,
    /// Spell level for system B actions.
    pub level: u32,
    /// Caller-supplied cooldown reduction in `[0, 1]`, capped by configuration.
    pub cooldown_reduction: f64,
}

impl ActionMetadata {
    /// Metadata with the school classified from `action_id`.
    pub fn new(system: CallerSystem, action_id: impl Into<String>) -> Self {
        let action_id = action_id.into();
        Self {
            school: SpellSchool::classify(&action_id),
            action_id,
            system,
            tier: 1,
            rarity: SpellRarity::Common,
            level: 1,
            cooldown_reduction: 0.0,
        }
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_rarity(mut self, rarity: SpellRarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_school(mut self, school: SpellSchool) -> Self {
        self.school = school;
        self
    }

    pub fn with_cooldown_reduction(mut self, reduction: f64) -> Self {
        self.cooldown_reduction = reduction;
        self
    }
}

/// An action about to execute, with the cost returned by the
/// cost-calculation hook.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastRequest {
    pub metadata: ActionMetadata,
    /// Cost in the caller's native units; zero when rerouted to the
    /// alternate currency.
    pub cost: f64,
}

impl CastRequest {
    pub fn new(metadata: ActionMetadata, cost: f64) -> Self {
        Self { metadata, cost }
    }

    pub fn system(&self) -> CallerSystem {
        self.metadata.system
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_classifies_school() {
        let meta = ActionMetadata::new(CallerSystem::B, "sys_b:fireball")
            .with_level(4)
            .with_rarity(SpellRarity::Epic);
        assert_eq!(meta.school, SpellSchool::Fire);
        assert_eq!(meta.rarity.index(), 3);
        assert_eq!(meta.level, 4);
    }
}
