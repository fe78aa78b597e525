//! Arbitration configuration.
//!
//! A single flat struct mirrors the recognised configuration keys. Policy
//! values (`mode`, `alternate_source_order`) stay raw strings here; the
//! components that own them resolve them and fall back to a safe default when
//! the value is unknown.

use tracing::warn;

use crate::actor::CallerSystem;

/// Every tunable of the arbitration engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ArbiterConfig {
    // Bridge
    /// Master switch; `false` behaves exactly like the `disabled` mode.
    pub unification_enabled: bool,
    /// One of `a_primary`, `b_primary`, `hybrid`, `separate`, `disabled`.
    pub mode: String,
    pub conversion_rate_a_to_b: f64,
    pub conversion_rate_b_to_a: f64,
    pub dual_cost_split_a: f64,
    pub dual_cost_split_b: f64,
    /// Convert gear bonuses of the non-servicing pool into the servicing pool.
    pub respect_equipment_bonuses: bool,
    pub equipment_cache_ttl_ms: u64,

    // Alternate currency
    /// One of `primary_only`, `primary_then_fallback`, `fallback_only`.
    pub alternate_source_order: String,
    /// Alternate units per fallback unit.
    pub alternate_fallback_ratio: f64,
    /// Fallback store level that is never crossed.
    pub alternate_fallback_floor: f64,
    pub minimum_alternate_cost_a: u64,
    pub minimum_alternate_cost_b: u64,
    pub alternate_base_multiplier_a: f64,
    pub alternate_base_multiplier_b: f64,
    /// Tier 1..=3 multipliers for system A actions.
    pub alternate_tier_multipliers: [f64; 3],
    /// Common, uncommon, rare, epic, legendary multipliers for system B actions.
    pub alternate_rarity_multipliers: [f64; 5],
    pub alternate_level_multiplier: f64,
    pub alternate_school_match_multiplier: f64,
    pub alternate_discount_floor: u64,
    pub death_on_insufficient_alternate: bool,
    /// Fallback-store loss applied on a safe-mode alternate denial.
    pub insufficient_penalty: f64,
    pub show_cost_messages: bool,
    pub reservation_ttl_seconds: f64,
    pub sweep_interval_ticks: u64,

    // Discounts
    pub discounts_enabled: bool,
    pub discount_stacking_allowed: bool,
    pub flat_equipment_discount: f64,
    pub school_discount: f64,
    pub school_match_bonus: f64,
    pub discount_floor: f64,

    // Cooldowns
    pub cooldowns_enabled: bool,
    pub cross_namespace_cooldowns: bool,
    pub cross_namespace_factor: f64,
    pub cooldown_base_duration: u64,
    pub cooldown_reduction_cap: f64,

    pub debug_mode: bool,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            unification_enabled: true,
            mode: "b_primary".to_owned(),
            conversion_rate_a_to_b: 1.0,
            conversion_rate_b_to_a: 1.0,
            dual_cost_split_a: 0.5,
            dual_cost_split_b: 0.5,
            respect_equipment_bonuses: true,
            equipment_cache_ttl_ms: 1_000,

            alternate_source_order: "primary_only".to_owned(),
            alternate_fallback_ratio: 10.0,
            alternate_fallback_floor: 1.0,
            minimum_alternate_cost_a: 10,
            minimum_alternate_cost_b: 10,
            alternate_base_multiplier_a: 1.0,
            alternate_base_multiplier_b: 0.5,
            alternate_tier_multipliers: [1.5, 2.0, 2.5],
            alternate_rarity_multipliers: [1.0, 1.5, 2.0, 3.0, 5.0],
            alternate_level_multiplier: 0.1,
            alternate_school_match_multiplier: 0.15,
            alternate_discount_floor: 100,
            death_on_insufficient_alternate: false,
            insufficient_penalty: 2.0,
            show_cost_messages: true,
            reservation_ttl_seconds: 5.0,
            sweep_interval_ticks: 100,

            discounts_enabled: true,
            discount_stacking_allowed: false,
            flat_equipment_discount: 0.20,
            school_discount: 0.15,
            school_match_bonus: 0.10,
            discount_floor: 0.05,

            cooldowns_enabled: true,
            cross_namespace_cooldowns: false,
            cross_namespace_factor: 0.5,
            cooldown_base_duration: 100,
            cooldown_reduction_cap: 0.8,

            debug_mode: false,
        }
    }
}

/// A numeric option that `sanitize` pulled back into range.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigAdjustment {
    pub key: &'static str,
    pub original: f64,
    pub adjusted: f64,
}

fn clamp_into(
    adjustments: &mut Vec<ConfigAdjustment>,
    key: &'static str,
    value: &mut f64,
    min: f64,
    max: f64,
    default: f64,
) {
    let original = *value;
    let adjusted = if original.is_finite() {
        original.clamp(min, max)
    } else {
        default
    };
    if adjusted != original {
        *value = adjusted;
        adjustments.push(ConfigAdjustment {
            key,
            original,
            adjusted,
        });
    }
}

impl ArbiterConfig {
    /// Clamps every numeric option into its documented range.
    ///
    /// Returns the adjustments made; each one is also logged as a warning.
    pub fn sanitize(&mut self) -> Vec<ConfigAdjustment> {
        let defaults = Self::default();
        let mut out = Vec::new();
        let adj = &mut out;

        clamp_into(adj, "conversion_rate_a_to_b", &mut self.conversion_rate_a_to_b, 0.01, 100.0, 1.0);
        clamp_into(adj, "conversion_rate_b_to_a", &mut self.conversion_rate_b_to_a, 0.01, 100.0, 1.0);
        clamp_into(adj, "dual_cost_split_a", &mut self.dual_cost_split_a, 0.0, 1.0, 0.5);
        clamp_into(adj, "dual_cost_split_b", &mut self.dual_cost_split_b, 0.0, 1.0, 0.5);
        clamp_into(adj, "alternate_fallback_ratio", &mut self.alternate_fallback_ratio, 1.0, 1_000.0, 10.0);
        clamp_into(adj, "alternate_fallback_floor", &mut self.alternate_fallback_floor, 0.0, 1_000.0, 1.0);
        clamp_into(adj, "alternate_base_multiplier_a", &mut self.alternate_base_multiplier_a, 0.1, 100.0, 1.0);
        clamp_into(adj, "alternate_base_multiplier_b", &mut self.alternate_base_multiplier_b, 0.1, 100.0, 0.5);
        for (i, tier) in self.alternate_tier_multipliers.iter_mut().enumerate() {
            clamp_into(adj, "alternate_tier_multipliers", tier, 0.1, 10.0, defaults.alternate_tier_multipliers[i]);
        }
        for (i, rarity) in self.alternate_rarity_multipliers.iter_mut().enumerate() {
            clamp_into(adj, "alternate_rarity_multipliers", rarity, 0.1, 20.0, defaults.alternate_rarity_multipliers[i]);
        }
        clamp_into(adj, "alternate_level_multiplier", &mut self.alternate_level_multiplier, 0.0, 1.0, 0.1);
        clamp_into(adj, "alternate_school_match_multiplier", &mut self.alternate_school_match_multiplier, 0.01, 1.0, 0.15);
        clamp_into(adj, "insufficient_penalty", &mut self.insufficient_penalty, 0.0, 20.0, 2.0);
        clamp_into(adj, "reservation_ttl_seconds", &mut self.reservation_ttl_seconds, 0.1, 60.0, 5.0);
        clamp_into(adj, "flat_equipment_discount", &mut self.flat_equipment_discount, 0.0, 1.0, 0.20);
        clamp_into(adj, "school_discount", &mut self.school_discount, 0.0, 1.0, 0.15);
        clamp_into(adj, "school_match_bonus", &mut self.school_match_bonus, 0.0, 1.0, 0.10);
        clamp_into(adj, "discount_floor", &mut self.discount_floor, 0.0, 1.0, 0.05);
        clamp_into(adj, "cross_namespace_factor", &mut self.cross_namespace_factor, 0.0, 1.0, 0.5);
        clamp_into(adj, "cooldown_reduction_cap", &mut self.cooldown_reduction_cap, 0.0, 1.0, 0.8);

        if self.sweep_interval_ticks == 0 {
            out.push(ConfigAdjustment {
                key: "sweep_interval_ticks",
                original: 0.0,
                adjusted: 1.0,
            });
            self.sweep_interval_ticks = 1;
        }

        for a in &out {
            warn!(key = a.key, original = a.original, adjusted = a.adjusted, "config value out of range");
        }
        out
    }

    pub fn reservation_ttl_ms(&self) -> u64 {
        (self.reservation_ttl_seconds.max(0.0) * 1_000.0).round() as u64
    }

    /// Minimum alternate cost for actions issued by `system`.
    pub fn minimum_alternate_cost(&self, system: CallerSystem) -> u64 {
        match system {
            CallerSystem::A => self.minimum_alternate_cost_a,
            CallerSystem::B => self.minimum_alternate_cost_b,
        }
    }
}
