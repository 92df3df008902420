//! Units on the battlefield and their per-turn state

use serde::{Deserialize, Serialize};

use crate::board::Hex;
use crate::skill::{Skill, SkillTag};

/// Unit identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Faction identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u8);

/// Suppression state; pinned is the stronger of the two
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppression {
    #[default]
    None,
    Suppressed,
    Pinned,
}

/// A unit as seen by the decision engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    #[serde(default)]
    pub name: String,
    pub faction: FactionId,
    /// Key into the scenario's role table
    pub role: String,
    pub tile: Hex,
    pub hitpoints: f32,
    pub max_hitpoints: f32,
    pub action_points: u8,
    pub max_action_points: u8,
    #[serde(default)]
    pub has_acted: bool,
    #[serde(default)]
    pub turn_done: bool,
    #[serde(default)]
    pub suppression: Suppression,
    #[serde(default)]
    pub stunned: bool,
    /// Aggregate threat value, by convention in [0, 1]
    #[serde(default)]
    pub threat: f32,
    /// Tiles per move
    #[serde(default = "default_movement")]
    pub movement: u8,
    /// Sight range in tiles
    #[serde(default = "default_sight")]
    pub sight: u8,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

fn default_movement() -> u8 {
    4
}

fn default_sight() -> u8 {
    10
}

impl Unit {
    pub fn is_alive(&self) -> bool {
        self.hitpoints > 0.0
    }

    /// Current hitpoints as a fraction of the maximum
    pub fn health_ratio(&self) -> f32 {
        if self.max_hitpoints <= 0.0 {
            0.0
        } else {
            (self.hitpoints / self.max_hitpoints).clamp(0.0, 1.0)
        }
    }

    /// Skills carrying a tag, in inventory order
    pub fn skills_tagged(&self, tag: SkillTag) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(move |s| s.has_tag(tag))
    }

    /// Widest (min, max) range over all damage skills, if any
    pub fn damage_range(&self) -> Option<(u8, u8)> {
        self.skills_tagged(SkillTag::Damage).fold(None, |acc, s| match acc {
            None => Some((s.min_range, s.max_range)),
            Some((lo, hi)) => Some((lo.min(s.min_range), hi.max(s.max_range))),
        })
    }
}

/// Cross-agent selection multiplier.
///
/// Lets a faction scheduler rank several agents' chosen actions in one
/// pooled decision. Reads only per-turn unit state.
pub fn selection_multiplier(unit: &Unit) -> f32 {
    let mut multiplier = 1.0f32;
    if !unit.has_acted {
        multiplier *= 1.2;
    }
    let ap_ratio = if unit.max_action_points == 0 {
        0.0
    } else {
        unit.action_points as f32 / unit.max_action_points as f32
    };
    multiplier * (0.8 + 0.4 * ap_ratio)
}
