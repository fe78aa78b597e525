use crate::action::ActionMetadata;
use crate::actor::CallerSystem;
use crate::config::ArbiterConfig;

/// Converts a normal-pool cost into alternate-currency units.
///
/// Both calling systems share one shape:
/// `max(minimum, round(cost * base * tier * rarity * (1 + level * per_level)))`.
/// System A actions scale by glyph tier only; system B actions by rarity and
/// level.
#[derive(Clone, Debug, PartialEq)]
pub struct AlternateCostFormula {
    pub base_multiplier_a: f64,
    pub base_multiplier_b: f64,
    pub tier_multipliers: [f64; 3],
    pub rarity_multipliers: [f64; 5],
    pub per_level_multiplier: f64,
    pub minimum_a: u64,
    pub minimum_b: u64,
    pub school_match_multiplier: f64,
    pub discount_floor: u64,
}

impl AlternateCostFormula {
    pub fn from_config(config: &ArbiterConfig) -> Self {
        Self {
            base_multiplier_a: config.alternate_base_multiplier_a,
            base_multiplier_b: config.alternate_base_multiplier_b,
            tier_multipliers: config.alternate_tier_multipliers,
            rarity_multipliers: config.alternate_rarity_multipliers,
            per_level_multiplier: config.alternate_level_multiplier,
            minimum_a: config.minimum_alternate_cost(CallerSystem::A),
            minimum_b: config.minimum_alternate_cost(CallerSystem::B),
            school_match_multiplier: config.alternate_school_match_multiplier,
            discount_floor: config.alternate_discount_floor,
        }
    }

    /// Alternate cost before any school-matching discount.
    ///
    /// Returns zero for a non-positive cost: there is nothing to reroute.
    pub fn raw_cost(&self, base_cost: f64, meta: &ActionMetadata) -> u64 {
        if !(base_cost.is_finite() && base_cost > 0.0) {
            return 0;
        }

        let (base, tier, rarity, level, minimum) = match meta.system {
            CallerSystem::A => {
                let idx = usize::from(meta.tier.clamp(1, 3)) - 1;
                (self.base_multiplier_a, self.tier_multipliers[idx], 1.0, 0.0, self.minimum_a)
            }
            CallerSystem::B => (
                self.base_multiplier_b,
                1.0,
                self.rarity_multipliers[meta.rarity.index()],
                f64::from(meta.level) * self.per_level_multiplier,
                self.minimum_b,
            ),
        };

        let scaled = (base_cost * base * tier * rarity * (1.0 + level)).round();
        (scaled.max(0.0) as u64).max(minimum)
    }

    /// Applies the school-matching reduction.
    ///
    /// The result is floored at `discount_floor` but never exceeds `lp`.
    pub fn apply_school_match(&self, lp: u64, matched: bool) -> u64 {
        if !matched || lp == 0 {
            return lp;
        }
        let discounted = (lp as f64 * self.school_match_multiplier).round() as u64;
        discounted.max(self.discount_floor).min(lp)
    }

    pub fn cost(&self, base_cost: f64, meta: &ActionMetadata, school_matched: bool) -> u64 {
        self.apply_school_match(self.raw_cost(base_cost, meta), school_matched)
    }
}

impl Default for AlternateCostFormula {
    fn default() -> Self {
        Self::from_config(&ArbiterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::SpellRarity;

    #[test]
    fn tier_one_system_a_cost() {
        let formula = AlternateCostFormula::default();
        let meta = ActionMetadata::new(CallerSystem::A, "sys_a:glyph_projectile").with_tier(1);
        assert_eq!(formula.raw_cost(20.0, &meta), 30);
        assert_eq!(formula.raw_cost(20.0, &meta.clone().with_tier(3)), 50);
    }

    #[test]
    fn system_b_scales_with_level_and_rarity() {
        let formula = AlternateCostFormula::default();
        let meta = ActionMetadata::new(CallerSystem::B, "sys_b:fireball")
            .with_level(5)
            .with_rarity(SpellRarity::Rare);
        // 100 * 0.5 * 1.5 * 2.0
        assert_eq!(formula.raw_cost(100.0, &meta), 150);
    }

    #[test]
    fn minimum_cost_applies() {
        let formula = AlternateCostFormula::default();
        let meta = ActionMetadata::new(CallerSystem::B, "sys_b:spark");
        assert_eq!(formula.raw_cost(2.0, &meta), 10);
        assert_eq!(formula.raw_cost(0.0, &meta), 0);
    }

    #[test]
    fn school_match_is_floored_but_never_raises_cost() {
        let formula = AlternateCostFormula::default();
        assert_eq!(formula.apply_school_match(1_000, true), 150);
        assert_eq!(formula.apply_school_match(400, true), 100);
        assert_eq!(formula.apply_school_match(60, true), 60);
        assert_eq!(formula.apply_school_match(1_000, false), 1_000);
    }
}
