//! The collaborator seam between the decision engine and the game
//!
//! Everything the engine knows about the battlefield comes through
//! [`World`]: geometry, reachability, the opponent registry, skill
//! resolution and the turn bookkeeping it is allowed to touch.

use crate::board::{CoverLevel, Hex};
use crate::role::RoleData;
use crate::skill::{HitChance, Skill};
use crate::unit::{FactionId, Suppression, Unit, UnitId};

/// Snapshot of an opposing unit from the opponent registry
#[derive(Clone, Debug, PartialEq)]
pub struct KnownOpponent {
    pub id: UnitId,
    pub tile: Hex,
    /// Aggregate threat value, by convention in [0, 1]
    pub threat: f32,
    /// (min, max) distance at which the opponent can deal damage
    pub damage_range: Option<(u8, u8)>,
    pub suppression: Suppression,
    pub has_acted: bool,
}

impl KnownOpponent {
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            tile: unit.tile,
            threat: unit.threat,
            damage_range: unit.damage_range(),
            suppression: unit.suppression,
            has_acted: unit.has_acted,
        }
    }

    /// Whether `tile` is inside this opponent's damage range
    pub fn threatens(&self, tile: Hex) -> bool {
        match self.damage_range {
            Some((lo, hi)) => {
                let d = self.tile.distance_to(tile);
                d >= lo && d <= hi
            }
            None => false,
        }
    }
}

/// Read access to the battlefield plus the few writes the engine makes.
///
/// Implementations must be safe to share between agents evaluating
/// concurrently, so the only mutating call (`end_turn`) takes `&self`.
pub trait World: Sync {
    // ------------------------------------------------------------------
    // Units and turn bookkeeping
    // ------------------------------------------------------------------

    fn unit(&self, id: UnitId) -> Option<&Unit>;

    /// Role configuration for the unit's archetype
    fn role(&self, unit: &Unit) -> Option<&RoleData>;

    fn is_turn_done(&self, id: UnitId) -> bool;

    /// Mark the unit's turn as finished
    fn end_turn(&self, id: UnitId);

    /// Whether the unit's action-resolution subsystem is still busy
    fn is_busy(&self, id: UnitId) -> bool;

    /// Whether the mission is in the middle of resolving an action
    fn mission_resolving(&self) -> bool;

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    /// Tiles the unit could move to this turn, in a stable order
    fn reachable_tiles(&self, unit: &Unit) -> Vec<Hex>;

    fn can_reach(&self, unit: &Unit, tile: Hex) -> bool;

    /// Final destination when moving to `tile` (differs under multi-step
    /// movement)
    fn ultimate_tile(&self, _unit: &Unit, tile: Hex) -> Hex {
        tile
    }

    /// Raw distance from the unit's current tile
    fn travel_distance(&self, unit: &Unit, tile: Hex) -> f32 {
        unit.tile.distance_to(tile) as f32
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Cover `tile` offers toward `direction`, ignoring `ignore` as a
    /// blocking entity
    fn cover(&self, tile: Hex, direction: u8, ignore: Option<UnitId>) -> CoverLevel;

    /// Whether `viewer` can see `tile`
    fn is_visible(&self, viewer: UnitId, tile: Hex) -> bool;

    // ------------------------------------------------------------------
    // Registries
    // ------------------------------------------------------------------

    /// Opposing units known to `faction`
    fn known_opponents(&self, faction: FactionId) -> Vec<KnownOpponent>;

    /// Living units within `radius` of `center`
    fn units_within(&self, center: Hex, radius: u8) -> Vec<&Unit>;

    // ------------------------------------------------------------------
    // Skill resolution
    // ------------------------------------------------------------------

    fn hit_chance(&self, attacker: &Unit, skill: &Skill, from: Hex, target: Hex) -> HitChance;

    fn expected_damage(&self, attacker: &Unit, skill: &Skill, target: &Unit) -> f32;

    fn expected_suppression(&self, attacker: &Unit, skill: &Skill, target: &Unit) -> f32;
}
