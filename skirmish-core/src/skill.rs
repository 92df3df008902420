//! Skills a unit can use against a target tile

use serde::{Deserialize, Serialize};

use crate::board::Hex;
use crate::unit::Unit;

/// Identifier of a skill instance in a unit's inventory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(pub u32);

/// Skill type shared by all copies of the same skill (e.g. two identical
/// rifles carry the same type)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillType(pub String);

impl SkillType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for SkillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tags used to look up skills by purpose
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTag {
    Damage,
    Suppression,
    Stun,
}

/// Result of a hit-chance query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitChance {
    /// Probability in [0, 1]
    pub chance: f32,
    pub always_hits: bool,
}

impl HitChance {
    pub const MISS: HitChance = HitChance { chance: 0.0, always_hits: false };

    /// Probability to use in expected-value math
    pub fn probability(&self) -> f32 {
        if self.always_hits {
            1.0
        } else {
            self.chance.clamp(0.0, 1.0)
        }
    }
}

/// A usable skill
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub skill_type: SkillType,
    pub tags: Vec<SkillTag>,
    /// Minimum range in tiles (inclusive)
    #[serde(default)]
    pub min_range: u8,
    /// Maximum range in tiles (inclusive)
    pub max_range: u8,
    /// Action points spent per use
    #[serde(default = "default_ap_cost")]
    pub ap_cost: u8,
    /// Base accuracy at one tile
    #[serde(default = "default_accuracy")]
    pub accuracy: f32,
    /// Accuracy lost per tile beyond the first
    #[serde(default)]
    pub accuracy_falloff: f32,
    #[serde(default)]
    pub always_hits: bool,
    #[serde(default)]
    pub damage: f32,
    #[serde(default)]
    pub suppression: f32,
    /// Blast radius; zero for single-target skills
    #[serde(default)]
    pub area_radius: u8,
}

fn default_ap_cost() -> u8 {
    1
}

fn default_accuracy() -> f32 {
    0.75
}

impl Skill {
    pub fn has_tag(&self, tag: SkillTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Whether the unit can pay for this skill right now
    pub fn can_use(&self, unit: &Unit) -> bool {
        unit.action_points >= self.ap_cost
    }

    /// Range membership test between two tiles
    pub fn in_range(&self, from: Hex, to: Hex) -> bool {
        let d = from.distance_to(to);
        d >= self.min_range && d <= self.max_range
    }

    pub fn is_area(&self) -> bool {
        self.area_radius > 0
    }
}
