//! Equipment-sourced cost discounts.
//!
//! Each [`DiscountSource`] inspects the actor's equipment and may contribute
//! a percentage. With stacking the factors multiply; without it the first
//! applicable source wins. The resulting multiplier is always clamped into
//! `[floor, 1]`.
mod sources;

pub use sources::{FlatEquipmentDiscount, SchoolAffinityDiscount};

use std::sync::Arc;

use crate::actor::ActorId;
use crate::config::ArbiterConfig;
use crate::school::SpellSchool;

/// Host view of what an actor currently wears.
pub trait EquipmentView: Send + Sync {
    /// A flat cost-reduction item is worn.
    fn has_flat_discount(&self, actor: ActorId) -> bool;

    /// Schools of the worn school-affinity items.
    fn affinity_schools(&self, actor: ActorId) -> Vec<SpellSchool>;

    /// Worn equipment reroutes costs to the alternate currency.
    fn alternate_currency_engaged(&self, actor: ActorId) -> bool;

    fn school_matches(&self, actor: ActorId, school: SpellSchool) -> bool {
        !school.is_generic() && self.affinity_schools(actor).contains(&school)
    }
}

/// Percentage contributed by one source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscountFactor {
    pub source: &'static str,
    /// Fraction removed from the cost, in `[0, 1]`.
    pub percent: f64,
}

impl DiscountFactor {
    pub fn new(source: &'static str, percent: f64) -> Self {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { source, percent }
    }

    pub fn multiplier(&self) -> f64 {
        1.0 - self.percent
    }
}

pub trait DiscountSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn factor(
        &self,
        actor: ActorId,
        school: SpellSchool,
        equipment: &dyn EquipmentView,
    ) -> Option<DiscountFactor>;
}

pub struct DiscountPipeline {
    sources: Vec<Arc<dyn DiscountSource>>,
    equipment: Arc<dyn EquipmentView>,
    enabled: bool,
    stacking: bool,
    floor: f64,
}

impl DiscountPipeline {
    pub fn new(equipment: Arc<dyn EquipmentView>, stacking: bool, floor: f64) -> Self {
        Self {
            sources: Vec::new(),
            equipment,
            enabled: true,
            stacking,
            floor: if floor.is_finite() {
                floor.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Pipeline with the flat-equipment and school-affinity sources, in that
    /// order.
    pub fn from_config(config: &ArbiterConfig, equipment: Arc<dyn EquipmentView>) -> Self {
        let mut pipeline = Self::new(
            equipment,
            config.discount_stacking_allowed,
            config.discount_floor,
        )
        .with_source(Arc::new(FlatEquipmentDiscount::from_config(config)))
        .with_source(Arc::new(SchoolAffinityDiscount::from_config(config)));
        pipeline.enabled = config.discounts_enabled;
        pipeline
    }

    pub fn with_source(mut self, source: Arc<dyn DiscountSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Factors that would apply, respecting the stacking policy.
    pub fn factors(&self, actor: ActorId, school: SpellSchool) -> Vec<DiscountFactor> {
        let applicable = self
            .sources
            .iter()
            .filter_map(|s| s.factor(actor, school, self.equipment.as_ref()));
        if self.stacking {
            applicable.collect()
        } else {
            applicable.take(1).collect()
        }
    }

    /// Combined multiplier in `[floor, 1]`.
    pub fn compute_multiplier(&self, actor: ActorId, school: SpellSchool) -> f64 {
        if !self.enabled {
            return 1.0;
        }
        let product: f64 = self
            .factors(actor, school)
            .iter()
            .map(DiscountFactor::multiplier)
            .product();
        product.clamp(self.floor, 1.0)
    }

    /// Discounted cost: `max(1, round(cost * multiplier))`. Zero stays zero.
    pub fn apply(&self, actor: ActorId, school: SpellSchool, cost: f64) -> f64 {
        if !self.enabled || !(cost.is_finite() && cost > 0.0) {
            return cost;
        }
        let multiplier = self.compute_multiplier(actor, school);
        if multiplier >= 1.0 {
            return cost;
        }
        (cost * multiplier).round().max(1.0)
    }

    pub fn equipment(&self) -> &Arc<dyn EquipmentView> {
        &self.equipment
    }
}

impl std::fmt::Debug for DiscountPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountPipeline")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("enabled", &self.enabled)
            .field("stacking", &self.stacking)
            .field("floor", &self.floor)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Wardrobe;
    use super::*;
    use proptest::prelude::*;

    const ACTOR: ActorId = ActorId(2);

    fn pipeline(stacking: bool) -> (DiscountPipeline, Arc<Wardrobe>) {
        let wardrobe = Arc::new(Wardrobe::default());
        let config = ArbiterConfig {
            discount_stacking_allowed: stacking,
            ..ArbiterConfig::default()
        };
        (DiscountPipeline::from_config(&config, wardrobe.clone()), wardrobe)
    }

    #[test]
    fn no_equipment_no_discount() {
        let (pipeline, _) = pipeline(true);
        assert_eq!(pipeline.compute_multiplier(ACTOR, SpellSchool::Fire), 1.0);
        assert_eq!(pipeline.apply(ACTOR, SpellSchool::Fire, 40.0), 40.0);
    }

    #[test]
    fn first_source_wins_without_stacking() {
        let (pipeline, wardrobe) = pipeline(false);
        wardrobe.wear_flat(ACTOR);
        wardrobe.wear_affinity(ACTOR, SpellSchool::Fire);

        let factors = pipeline.factors(ACTOR, SpellSchool::Fire);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].source, "flat_equipment");
        assert!((pipeline.compute_multiplier(ACTOR, SpellSchool::Fire) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn stacking_multiplies_sources() {
        let (pipeline, wardrobe) = pipeline(true);
        wardrobe.wear_flat(ACTOR);
        wardrobe.wear_affinity(ACTOR, SpellSchool::Fire);

        // 0.8 * (1 - 0.25)
        let m = pipeline.compute_multiplier(ACTOR, SpellSchool::Fire);
        assert!((m - 0.6).abs() < 1e-9);
        assert_eq!(pipeline.apply(ACTOR, SpellSchool::Fire, 50.0), 30.0);
        // Unmatched school only gets the base affinity discount.
        let unmatched = pipeline.compute_multiplier(ACTOR, SpellSchool::Ice);
        assert!((unmatched - 0.8 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn discounted_cost_never_drops_below_one() {
        let (pipeline, wardrobe) = pipeline(true);
        wardrobe.wear_flat(ACTOR);
        assert_eq!(pipeline.apply(ACTOR, SpellSchool::Generic, 1.0), 1.0);
        assert_eq!(pipeline.apply(ACTOR, SpellSchool::Generic, 0.0), 0.0);
    }

    #[test]
    fn disabled_pipeline_is_identity() {
        let wardrobe = Arc::new(Wardrobe::default());
        wardrobe.wear_flat(ACTOR);
        let config = ArbiterConfig {
            discounts_enabled: false,
            ..ArbiterConfig::default()
        };
        let pipeline = DiscountPipeline::from_config(&config, wardrobe);
        assert_eq!(pipeline.compute_multiplier(ACTOR, SpellSchool::Fire), 1.0);
        assert_eq!(pipeline.apply(ACTOR, SpellSchool::Fire, 33.0), 33.0);
    }

    #[test]
    fn generic_school_never_matches() {
        let wardrobe = Wardrobe::default();
        wardrobe.wear_affinity(ACTOR, SpellSchool::Generic);
        assert!(!wardrobe.school_matches(ACTOR, SpellSchool::Generic));
        assert_eq!(wardrobe.affinity_schools(ACTOR), vec![SpellSchool::Generic]);
    }

    struct Fixed(f64);

    impl DiscountSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn factor(&self, _: ActorId, _: SpellSchool, _: &dyn EquipmentView) -> Option<DiscountFactor> {
            Some(DiscountFactor::new("fixed", self.0))
        }
    }

    proptest! {
        #[test]
        fn multiplier_stays_in_range(
            percents in prop::collection::vec(-0.5f64..1.5, 0..6),
            stacking in any::<bool>(),
            floor in 0.0f64..1.0,
        ) {
            let mut pipeline = DiscountPipeline::new(Arc::new(Wardrobe::default()), stacking, floor);
            for p in percents {
                pipeline = pipeline.with_source(Arc::new(Fixed(p)));
            }
            let m = pipeline.compute_multiplier(ACTOR, SpellSchool::Fire);
            prop_assert!(m >= pipeline.floor());
            prop_assert!(m <= 1.0);
        }
    }
}
