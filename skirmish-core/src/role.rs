//! Per-archetype role configuration

use serde::{Deserialize, Serialize};

/// Weights and toggles controlling which rules matter for a unit archetype
/// and how strongly.
///
/// Shared between all units of the archetype and read-only while an
/// evaluation runs. Missing fields in JSON take their `Default` value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleData {
    // ------------------------------------------------------------------
    // Tile aggregation weights
    // ------------------------------------------------------------------
    pub utility_scale: f32,
    /// Fraction of the best tile's utility a tile must reach before its
    /// final score is demoted
    pub utility_threshold_scale: f32,
    pub safety_scale: f32,
    pub distance_scale: f32,

    // ------------------------------------------------------------------
    // Behavior weights
    // ------------------------------------------------------------------
    pub move_weight: f32,
    pub inflict_damage_weight: f32,
    pub inflict_suppression_weight: f32,
    pub stun_weight: f32,
    pub friendly_fire_penalty: f32,
    pub friendly_fire_target_value_mult: f32,

    // ------------------------------------------------------------------
    // Criterion toggles
    // ------------------------------------------------------------------
    pub considers_cover: bool,
    pub considers_distance: bool,
    pub avoids_opponents: bool,
    pub seeks_attack_positions: bool,

    // ------------------------------------------------------------------
    // Behavioral flags
    // ------------------------------------------------------------------
    /// May move again after acting this turn
    pub may_evade: bool,
    pub prefers_hidden: bool,
    /// May shoot out of heavy cover
    pub may_peek: bool,
    pub may_use_area_on_single_targets: bool,
}

impl Default for RoleData {
    fn default() -> Self {
        Self {
            utility_scale: 1.0,
            utility_threshold_scale: 0.0,
            safety_scale: 1.0,
            distance_scale: 1.0,
            move_weight: 1.0,
            inflict_damage_weight: 1.0,
            inflict_suppression_weight: 1.0,
            stun_weight: 1.0,
            friendly_fire_penalty: 1.0,
            friendly_fire_target_value_mult: 1.0,
            considers_cover: true,
            considers_distance: true,
            avoids_opponents: true,
            seeks_attack_positions: true,
            may_evade: false,
            prefers_hidden: false,
            may_peek: false,
            may_use_area_on_single_targets: false,
        }
    }
}

impl RoleData {
    /// Set the three tile aggregation scales
    pub fn with_scales(mut self, utility: f32, safety: f32, distance: f32) -> Self {
        self.utility_scale = utility;
        self.safety_scale = safety;
        self.distance_scale = distance;
        self
    }

    /// Role that contributes nothing from any built-in criterion
    pub fn without_criteria(mut self) -> Self {
        self.considers_cover = false;
        self.considers_distance = false;
        self.avoids_opponents = false;
        self.seeks_attack_positions = false;
        self
    }

    /// Role-weighted combination of a tile's criterion scores, before the
    /// global power rescale
    pub fn combine(&self, utility: f32, safety: f32, distance: f32) -> f32 {
        utility * self.utility_scale + safety * self.safety_scale - distance * self.distance_scale
    }
}
