use super::{DiscountFactor, DiscountSource, EquipmentView};
use crate::actor::ActorId;
use crate::config::ArbiterConfig;
use crate::school::SpellSchool;

/// Flat discount from a worn cost-reduction item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatEquipmentDiscount {
    pub percent: f64,
}

impl FlatEquipmentDiscount {
    pub fn from_config(config: &ArbiterConfig) -> Self {
        Self {
            percent: config.flat_equipment_discount,
        }
    }
}

impl DiscountSource for FlatEquipmentDiscount {
    fn name(&self) -> &'static str {
        "flat_equipment"
    }

    fn factor(
        &self,
        actor: ActorId,
        _school: SpellSchool,
        equipment: &dyn EquipmentView,
    ) -> Option<DiscountFactor> {
        equipment
            .has_flat_discount(actor)
            .then(|| DiscountFactor::new(self.name(), self.percent))
    }
}

/// Discount from school-affinity items, deeper when the school matches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchoolAffinityDiscount {
    pub base: f64,
    pub match_bonus: f64,
    pub cap: f64,
}

impl SchoolAffinityDiscount {
    pub const CAP: f64 = 0.95;

    pub fn from_config(config: &ArbiterConfig) -> Self {
        Self {
            base: config.school_discount,
            match_bonus: config.school_match_bonus,
            cap: Self::CAP,
        }
    }
}

impl DiscountSource for SchoolAffinityDiscount {
    fn name(&self) -> &'static str {
        "school_affinity"
    }

    fn factor(
        &self,
        actor: ActorId,
        school: SpellSchool,
        equipment: &dyn EquipmentView,
    ) -> Option<DiscountFactor> {
        let schools = equipment.affinity_schools(actor);
        if schools.is_empty() {
            return None;
        }
        let matched = !school.is_generic() && schools.contains(&school);
        let percent = if matched {
            self.base + self.match_bonus
        } else {
            self.base
        };
        Some(DiscountFactor::new(self.name(), percent.min(self.cap)))
    }
}
