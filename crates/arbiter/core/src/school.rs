//! Spell school classification.
//!
//! Actions are tagged with a school by keyword. The school decides whether a
//! school-affinity item on the actor matches the action, which deepens both
//! the normal-cost discount and the alternate-currency discount.

/// Elemental or thematic school of an action.
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
pub enum SpellSchool {
    Fire,
    Ice,
    Lightning,
    Holy,
    Ender,
    Blood,
    Evocation,
    Nature,
    Eldritch,
    Aqua,
    Geo,
    Wind,
    #[default]
    Generic,
}

// Checked in order; "lightning" must come before the "light" keyword of holy.
const KEYWORDS: &[(SpellSchool, &[&str])] = &[
    (SpellSchool::Fire, &["fire", "flame", "ignite", "flare", "burn"]),
    (SpellSchool::Ice, &["ice", "frost", "freeze", "cold"]),
    (SpellSchool::Lightning, &["lightning", "shock", "storm"]),
    (SpellSchool::Holy, &["holy", "heal", "light"]),
    (SpellSchool::Ender, &["ender", "void", "teleport", "blink", "warp"]),
    (SpellSchool::Blood, &["blood", "essence", "drain", "life"]),
    (SpellSchool::Evocation, &["evocation", "machina", "projectile", "fang"]),
    (SpellSchool::Nature, &["nature", "wilds", "grow", "plant", "harvest"]),
    (SpellSchool::Eldritch, &["eldritch", "anomaly", "dark", "wither", "hex"]),
    (SpellSchool::Aqua, &["aqua", "ocean", "water"]),
    (SpellSchool::Geo, &["geo", "stone", "rock", "earth", "crush"]),
    (SpellSchool::Wind, &["wind", "air", "sky", "gust"]),
];

impl SpellSchool {
    /// Classifies an action identifier such as `"sys_a:glyph_ignite"`.
    ///
    /// Only the path after the namespace separator is inspected; unknown
    /// identifiers are [`SpellSchool::Generic`].
    pub fn classify(action_id: &str) -> Self {
        let path = action_id
            .rsplit_once(':')
            .map_or(action_id, |(_, path)| path)
            .to_ascii_lowercase();

        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| path.contains(w)))
            .map_or(Self::Generic, |(school, _)| *school)
    }

    pub fn is_generic(self) -> bool {
        self == Self::Generic
    }
}
