//! Sandbox battlefield: a self-contained `World` over a JSON scenario

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::behavior::{Action, BehaviorKind};
use crate::board::{CoverLevel, Hex, DEFAULT_BOARD_RADIUS, MAX_BOARD_RADIUS};
use crate::error::{RuleError, ScenarioError};
use crate::role::RoleData;
use crate::skill::{HitChance, Skill};
use crate::unit::{FactionId, Unit, UnitId};
use crate::world::{KnownOpponent, World};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Accuracy lost by the attacker per cover level of the target
pub const COVER_ACCURACY_PENALTY: [f32; 4] = [0.0, 0.15, 0.3, 0.45];

// ============================================================================
// SCENARIO FILE FORMAT
// ============================================================================

/// One face of a tile's cover table
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverEntry {
    pub tile: Hex,
    /// Direction index (0-5) the cover faces
    pub direction: u8,
    pub level: CoverLevel,
}

/// Serialized battlefield contents
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_radius")]
    pub radius: i8,
    #[serde(default)]
    pub roles: BTreeMap<String, RoleData>,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub cover: Vec<CoverEntry>,
    #[serde(default)]
    pub concealed: Vec<Hex>,
    #[serde(default)]
    pub busy: Vec<UnitId>,
    #[serde(default)]
    pub mission_resolving: bool,
}

fn default_radius() -> i8 {
    DEFAULT_BOARD_RADIUS
}

impl Scenario {
    /// Check board size, ids, roles, board bounds and tile occupancy
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(0..=MAX_BOARD_RADIUS).contains(&self.radius) {
            return Err(ScenarioError::BoardRadius(self.radius));
        }

        let mut ids = FxHashSet::default();
        let mut occupied: FxHashMap<Hex, UnitId> = FxHashMap::default();

        for unit in &self.units {
            if !ids.insert(unit.id) {
                return Err(ScenarioError::DuplicateUnit(unit.id));
            }
            if !self.roles.contains_key(&unit.role) {
                return Err(ScenarioError::UnknownRole { unit: unit.id, role: unit.role.clone() });
            }
            if !unit.tile.within(self.radius) {
                return Err(ScenarioError::OffBoard { unit: unit.id, tile: unit.tile });
            }
            if unit.action_points > unit.max_action_points {
                return Err(ScenarioError::ActionPoints(unit.id));
            }
            if !unit.is_alive() {
                continue;
            }
            if let Some(&first) = occupied.get(&unit.tile) {
                return Err(ScenarioError::SharedTile { first, second: unit.id, tile: unit.tile });
            }
            occupied.insert(unit.tile, unit.id);
        }
        Ok(())
    }
}

// ============================================================================
// BATTLEFIELD
// ============================================================================

/// Deterministic in-memory battlefield.
///
/// Unit order is the scenario order and every registry query reports in
/// that order. Turn-done marks are atomics so agents evaluating
/// concurrently can end their turns through a shared reference.
pub struct Battlefield {
    name: String,
    radius: i8,
    units: Vec<Unit>,
    index: FxHashMap<UnitId, usize>,
    roles: FxHashMap<String, RoleData>,
    cover: FxHashMap<(Hex, u8), CoverLevel>,
    concealed: FxHashSet<Hex>,
    busy: FxHashSet<UnitId>,
    mission_resolving: bool,
    turn_done: Vec<AtomicBool>,
}

impl Battlefield {
    /// Build from a validated scenario
    pub fn from_scenario(scenario: Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let index = scenario
            .units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.id, i))
            .collect();
        let turn_done = scenario
            .units
            .iter()
            .map(|u| AtomicBool::new(u.turn_done))
            .collect();
        let cover = scenario
            .cover
            .iter()
            .map(|c| ((c.tile, c.direction % 6), c.level))
            .collect();

        Ok(Self {
            name: scenario.name,
            radius: scenario.radius,
            units: scenario.units,
            index,
            roles: scenario.roles.into_iter().collect(),
            cover,
            concealed: scenario.concealed.into_iter().collect(),
            busy: scenario.busy.into_iter().collect(),
            mission_resolving: scenario.mission_resolving,
            turn_done,
        })
    }

    /// Load and validate a scenario file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        let battlefield = Self::from_scenario(scenario)
            .with_context(|| format!("validating scenario {}", path.display()))?;
        Ok(battlefield)
    }

    /// Save current state as a scenario file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(&self.to_scenario())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Snapshot of the current state in file format
    pub fn to_scenario(&self) -> Scenario {
        let units = self
            .units
            .iter()
            .zip(&self.turn_done)
            .map(|(u, done)| Unit {
                turn_done: u.turn_done || done.load(Ordering::Acquire),
                ..u.clone()
            })
            .collect();

        let mut cover: Vec<CoverEntry> = self
            .cover
            .iter()
            .map(|(&(tile, direction), &level)| CoverEntry { tile, direction, level })
            .collect();
        cover.sort_by_key(|c| (c.tile, c.direction));
        let mut concealed: Vec<Hex> = self.concealed.iter().copied().collect();
        concealed.sort();
        let mut busy: Vec<UnitId> = self.busy.iter().copied().collect();
        busy.sort();

        Scenario {
            name: self.name.clone(),
            radius: self.radius,
            roles: self.roles.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            units,
            cover,
            concealed,
            busy,
            mission_resolving: self.mission_resolving,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn radius(&self) -> i8 {
        self.radius
    }

    /// All units in scenario order, living or not
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Distinct factions in order of first appearance
    pub fn factions(&self) -> Vec<FactionId> {
        let mut out = Vec::new();
        for unit in &self.units {
            if !out.contains(&unit.faction) {
                out.push(unit.faction);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn set_cover(&mut self, tile: Hex, direction: u8, level: CoverLevel) {
        self.cover.insert((tile, direction % 6), level);
    }

    /// Make a tile visible only from adjacent tiles
    pub fn conceal(&mut self, tile: Hex) {
        self.concealed.insert(tile);
    }

    pub fn set_role(&mut self, name: impl Into<String>, role: RoleData) {
        self.roles.insert(name.into(), role);
    }

    pub fn set_busy(&mut self, id: UnitId, busy: bool) {
        if busy {
            self.busy.insert(id);
        } else {
            self.busy.remove(&id);
        }
    }

    pub fn set_mission_resolving(&mut self, resolving: bool) {
        self.mission_resolving = resolving;
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        let &i = self.index.get(&id)?;
        self.units.get_mut(i)
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    /// Refresh action points and clear turn marks for one faction
    pub fn begin_turn(&mut self, faction: FactionId) {
        for (unit, done) in self.units.iter_mut().zip(self.turn_done.iter_mut()) {
            if unit.faction != faction {
                continue;
            }
            unit.action_points = unit.max_action_points;
            unit.has_acted = false;
            unit.turn_done = false;
            *done.get_mut() = false;
        }
    }

    /// Carry out an action's bookkeeping: move the unit or spend the
    /// skill's action points. Effects on the target are not resolved.
    pub fn apply(&mut self, action: &Action) -> Result<(), RuleError> {
        let radius = self.radius;
        let occupied = self.occupant(action.tile).filter(|&id| id != action.unit);
        let unit = self.unit_mut(action.unit).ok_or(RuleError::UnknownUnit(action.unit))?;

        match action.kind {
            BehaviorKind::Move => {
                if let Some(other) = occupied {
                    tracing::warn!(unit = %action.unit, tile = %action.tile, occupant = %other, "move onto occupied tile");
                }
                if !action.tile.within(radius) {
                    tracing::warn!(unit = %action.unit, tile = %action.tile, "move off the board");
                }
                unit.tile = action.tile;
                unit.action_points = unit.action_points.saturating_sub(1);
            }
            BehaviorKind::InflictDamage | BehaviorKind::InflictSuppression | BehaviorKind::Stun => {
                let cost = action
                    .skill
                    .and_then(|id| unit.skills.iter().find(|s| s.id == id))
                    .map(|s| s.ap_cost)
                    .ok_or(RuleError::NoSkill)?;
                unit.action_points = unit.action_points.saturating_sub(cost);
            }
        }
        unit.has_acted = true;

        tracing::debug!(unit = %action.unit, kind = ?action.kind, tile = %action.tile, ap = unit.action_points, "applied action");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn slot(&self, id: UnitId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Living unit standing on `tile`
    fn occupant(&self, tile: Hex) -> Option<UnitId> {
        self.units
            .iter()
            .find(|u| u.is_alive() && u.tile == tile)
            .map(|u| u.id)
    }

    fn living(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }
}

impl World for Battlefield {
    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.slot(id).map(|i| &self.units[i])
    }

    fn role(&self, unit: &Unit) -> Option<&RoleData> {
        self.roles.get(&unit.role)
    }

    fn is_turn_done(&self, id: UnitId) -> bool {
        match self.slot(id) {
            Some(i) => self.units[i].turn_done || self.turn_done[i].load(Ordering::Acquire),
            None => true,
        }
    }

    fn end_turn(&self, id: UnitId) {
        if let Some(i) = self.slot(id) {
            self.turn_done[i].store(true, Ordering::Release);
        }
    }

    fn is_busy(&self, id: UnitId) -> bool {
        self.busy.contains(&id)
    }

    fn mission_resolving(&self) -> bool {
        self.mission_resolving
    }

    fn reachable_tiles(&self, unit: &Unit) -> Vec<Hex> {
        if unit.action_points == 0 {
            return Vec::new();
        }
        // Nothing on the board lies further than its diameter
        let reach = unit.movement.min(self.radius.max(0) as u8 * 2);
        unit.tile
            .spiral(reach)
            .into_iter()
            .skip(1)
            .filter(|&tile| tile.within(self.radius) && self.occupant(tile).is_none())
            .collect()
    }

    fn can_reach(&self, unit: &Unit, tile: Hex) -> bool {
        unit.action_points > 0
            && tile != unit.tile
            && tile.within(self.radius)
            && unit.tile.distance_to(tile) <= unit.movement
            && self.occupant(tile).is_none()
    }

    fn cover(&self, tile: Hex, direction: u8, ignore: Option<UnitId>) -> CoverLevel {
        let direction = direction % 6;
        let mut level = self.cover.get(&(tile, direction)).copied().unwrap_or_default();

        // A living unit on the neighbouring tile is light cover at least
        let neighbor = tile.neighbor(direction);
        if let Some(id) = self.occupant(neighbor) {
            if Some(id) != ignore {
                level = level.max(CoverLevel::Light);
            }
        }
        level
    }

    fn is_visible(&self, viewer: UnitId, tile: Hex) -> bool {
        let Some(viewer) = self.unit(viewer) else {
            return false;
        };
        let d = viewer.tile.distance_to(tile);
        d <= viewer.sight && (d <= 1 || !self.concealed.contains(&tile))
    }

    fn known_opponents(&self, faction: FactionId) -> Vec<KnownOpponent> {
        self.living()
            .filter(|u| u.faction != faction)
            .map(KnownOpponent::from_unit)
            .collect()
    }

    fn units_within(&self, center: Hex, radius: u8) -> Vec<&Unit> {
        self.living()
            .filter(|u| u.tile.distance_to(center) <= radius)
            .collect()
    }

    fn hit_chance(&self, attacker: &Unit, skill: &Skill, from: Hex, target: Hex) -> HitChance {
        if skill.always_hits {
            return HitChance { chance: 1.0, always_hits: true };
        }
        let d = from.distance_to(target);
        if d == 0 {
            return HitChance::MISS;
        }
        let cover = match target.direction_to(from) {
            Some(dir) => self.cover(target, dir, Some(attacker.id)),
            None => CoverLevel::None,
        };
        let chance = skill.accuracy
            - skill.accuracy_falloff * (d as f32 - 1.0)
            - COVER_ACCURACY_PENALTY[cover.index()];
        HitChance { chance: chance.clamp(0.0, 1.0), always_hits: false }
    }

    fn expected_damage(&self, _attacker: &Unit, skill: &Skill, _target: &Unit) -> f32 {
        skill.damage
    }

    fn expected_suppression(&self, _attacker: &Unit, skill: &Skill, _target: &Unit) -> f32 {
        skill.suppression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{battlefield, rifle, unit};

    fn scenario(units: Vec<Unit>) -> Scenario {
        let mut roles = BTreeMap::new();
        roles.insert("default".to_string(), RoleData::default());
        Scenario {
            name: "test".to_string(),
            radius: 4,
            roles,
            units,
            cover: Vec::new(),
            concealed: Vec::new(),
            busy: Vec::new(),
            mission_resolving: false,
        }
    }

    #[test]
    fn test_validate_rejects_bad_scenarios() {
        let dup = scenario(vec![unit(1, 0, Hex::new(0, 0)), unit(1, 1, Hex::new(1, 0))]);
        assert!(matches!(dup.validate(), Err(ScenarioError::DuplicateUnit(UnitId(1)))));

        let mut stranger = unit(1, 0, Hex::new(0, 0));
        stranger.role = "sniper".to_string();
        assert!(matches!(
            scenario(vec![stranger]).validate(),
            Err(ScenarioError::UnknownRole { .. })
        ));

        let off = scenario(vec![unit(1, 0, Hex::new(5, 0))]);
        assert!(matches!(off.validate(), Err(ScenarioError::OffBoard { .. })));

        let shared = scenario(vec![unit(1, 0, Hex::new(0, 0)), unit(2, 1, Hex::new(0, 0))]);
        assert!(matches!(shared.validate(), Err(ScenarioError::SharedTile { .. })));

        let mut greedy = unit(1, 0, Hex::new(0, 0));
        greedy.action_points = 5;
        assert!(matches!(
            scenario(vec![greedy]).validate(),
            Err(ScenarioError::ActionPoints(UnitId(1)))
        ));
    }

    #[test]
    fn test_validate_bounds_board_radius() {
        let mut huge = scenario(vec![unit(1, 0, Hex::new(0, 0))]);
        huge.radius = MAX_BOARD_RADIUS + 1;
        assert!(matches!(huge.validate(), Err(ScenarioError::BoardRadius(64))));

        let mut negative = scenario(vec![unit(1, 0, Hex::new(0, 0))]);
        negative.radius = -1;
        assert!(matches!(negative.validate(), Err(ScenarioError::BoardRadius(-1))));

        let mut largest = scenario(vec![unit(1, 0, Hex::new(-MAX_BOARD_RADIUS, 0))]);
        largest.radius = MAX_BOARD_RADIUS;
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_movement_beyond_board_is_clamped() {
        let mut runner = unit(1, 0, Hex::new(-8, 0));
        runner.movement = 130;
        let world = battlefield(vec![runner]);
        let me = world.unit(UnitId(1)).unwrap();

        let tiles = world.reachable_tiles(me);
        // Every other tile of a radius-8 board: 3 * 8 * 9 + 1 - 1
        assert_eq!(tiles.len(), 216);
        assert!(tiles.iter().all(|t| t.within(8)));

        let mut edge = unit(1, 0, Hex::new(-MAX_BOARD_RADIUS, 0));
        edge.movement = u8::MAX;
        let mut wide = scenario(vec![edge]);
        wide.radius = MAX_BOARD_RADIUS;
        let world = Battlefield::from_scenario(wide).unwrap();
        let me = world.unit(UnitId(1)).unwrap();
        assert_eq!(world.reachable_tiles(me).len(), 3 * 63 * 64);
    }

    #[test]
    fn test_dead_units_do_not_occupy() {
        let mut corpse = unit(2, 1, Hex::new(1, 0));
        corpse.hitpoints = 0.0;
        let world = battlefield(vec![unit(1, 0, Hex::new(0, 0)), corpse]);
        let me = world.unit(UnitId(1)).unwrap();
        assert!(world.can_reach(me, Hex::new(1, 0)));
        assert!(world.known_opponents(FactionId(0)).is_empty());
    }

    #[test]
    fn test_reachable_tiles() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.movement = 1;
        let world = battlefield(vec![me, unit(2, 1, Hex::new(1, 0))]);
        let me = world.unit(UnitId(1)).unwrap();

        let tiles = world.reachable_tiles(me);
        assert_eq!(tiles.len(), 5);
        assert!(!tiles.contains(&Hex::new(0, 0)));
        assert!(!tiles.contains(&Hex::new(1, 0)));
        assert!(tiles.iter().all(|&t| world.can_reach(me, t)));
    }

    #[test]
    fn test_no_action_points_no_movement() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.action_points = 0;
        let world = battlefield(vec![me]);
        let me = world.unit(UnitId(1)).unwrap();
        assert!(world.reachable_tiles(me).is_empty());
        assert!(!world.can_reach(me, Hex::new(1, 0)));
    }

    #[test]
    fn test_adjacent_unit_is_light_cover() {
        let world = battlefield(vec![unit(1, 0, Hex::new(0, 0)), unit(2, 0, Hex::new(0, -1))]);
        assert_eq!(world.cover(Hex::new(0, 0), 0, None), CoverLevel::Light);
        assert_eq!(world.cover(Hex::new(0, 0), 0, Some(UnitId(2))), CoverLevel::None);
        assert_eq!(world.cover(Hex::new(0, 0), 3, None), CoverLevel::None);
    }

    #[test]
    fn test_concealed_tiles_seen_only_up_close() {
        let mut world = battlefield(vec![unit(1, 0, Hex::new(0, 0))]);
        world.conceal(Hex::new(0, 3));
        world.conceal(Hex::new(0, 1));
        assert!(!world.is_visible(UnitId(1), Hex::new(0, 3)));
        assert!(world.is_visible(UnitId(1), Hex::new(0, 1)));
        assert!(world.is_visible(UnitId(1), Hex::new(3, 0)));
        assert!(!world.is_visible(UnitId(9), Hex::new(0, 1)));
    }

    #[test]
    fn test_hit_chance_falloff_and_cover() {
        let shooter = unit(1, 0, Hex::new(0, 0));
        let target = unit(2, 1, Hex::new(0, -3));
        let mut world = battlefield(vec![shooter, target]);
        let gun = rifle(1, 6);
        let me = world.unit(UnitId(1)).unwrap().clone();

        let open = world.hit_chance(&me, &gun, Hex::new(0, 0), Hex::new(0, -3));
        assert!((open.chance - (0.8 - 0.05 * 2.0)).abs() < 1e-5);

        // South face of the target points back at the shooter
        world.set_cover(Hex::new(0, -3), 3, CoverLevel::Medium);
        let covered = world.hit_chance(&me, &gun, Hex::new(0, 0), Hex::new(0, -3));
        assert!((covered.chance - (0.8 - 0.05 * 2.0 - 0.3)).abs() < 1e-5);
    }

    #[test]
    fn test_end_turn_through_shared_reference() {
        let world = battlefield(vec![unit(1, 0, Hex::new(0, 0))]);
        assert!(!world.is_turn_done(UnitId(1)));
        world.end_turn(UnitId(1));
        assert!(world.is_turn_done(UnitId(1)));
        assert!(world.is_turn_done(UnitId(42)));
        assert!(world.to_scenario().units[0].turn_done);
    }

    #[test]
    fn test_apply_and_begin_turn() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(rifle(5, 6));
        let mut world = battlefield(vec![me]);

        world
            .apply(&Action {
                unit: UnitId(1),
                kind: BehaviorKind::Move,
                tile: Hex::new(1, 0),
                target: None,
                skill: None,
            })
            .unwrap();
        let moved = world.unit(UnitId(1)).unwrap();
        assert_eq!(moved.tile, Hex::new(1, 0));
        assert_eq!(moved.action_points, 1);
        assert!(moved.has_acted);

        let shot = Action {
            unit: UnitId(1),
            kind: BehaviorKind::InflictDamage,
            tile: Hex::new(3, 0),
            target: None,
            skill: Some(crate::skill::SkillId(5)),
        };
        world.apply(&shot).unwrap();
        assert_eq!(world.unit(UnitId(1)).unwrap().action_points, 0);

        world.end_turn(UnitId(1));
        world.begin_turn(FactionId(0));
        let fresh = world.unit(UnitId(1)).unwrap();
        assert_eq!(fresh.action_points, 2);
        assert!(!fresh.has_acted);
        assert!(!world.is_turn_done(UnitId(1)));
    }

    #[test]
    fn test_apply_unknown_skill() {
        let mut world = battlefield(vec![unit(1, 0, Hex::new(0, 0))]);
        let action = Action {
            unit: UnitId(1),
            kind: BehaviorKind::Stun,
            tile: Hex::new(1, 0),
            target: None,
            skill: Some(crate::skill::SkillId(3)),
        };
        assert!(matches!(world.apply(&action), Err(RuleError::NoSkill)));
    }

    #[test]
    fn test_scenario_json_defaults() {
        let json = r#"{
            "roles": { "default": { "may_peek": true } },
            "units": [{
                "id": 1, "faction": 0, "role": "default", "tile": { "q": 0, "r": 0 },
                "hitpoints": 5, "max_hitpoints": 5, "action_points": 2, "max_action_points": 2
            }]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.radius, DEFAULT_BOARD_RADIUS);
        assert!(scenario.roles["default"].may_peek);
        assert!(scenario.roles["default"].considers_cover);
        let world = Battlefield::from_scenario(scenario).unwrap();
        assert_eq!(world.unit(UnitId(1)).unwrap().movement, 4);
    }
}
