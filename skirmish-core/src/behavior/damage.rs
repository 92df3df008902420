//! Attack a target to deal damage

use crate::context::EvalContext;
use crate::error::RuleError;
use crate::skill::{SkillTag, SkillType};
use crate::tile::TileMap;
use crate::unit::UnitId;

use super::attack::{hit_probability, AttackCore};
use super::{Action, Behavior, BehaviorKind, DedupKey};

/// Multiplier when the expected damage would finish the target
pub const KILL_BONUS: f32 = 1.5;

/// Bonus at zero health for targets that survive; scales linearly with
/// missing health
const WOUNDED_BONUS: f32 = 0.5;

/// Deal damage with one skill type
pub struct InflictDamage {
    core: AttackCore,
}

impl InflictDamage {
    pub fn new(skill_type: SkillType) -> Self {
        Self {
            core: AttackCore::new(BehaviorKind::InflictDamage, SkillTag::Damage, skill_type),
        }
    }
}

impl Behavior for InflictDamage {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::InflictDamage
    }

    fn dedup_key(&self) -> Option<DedupKey> {
        Some(self.core.dedup_key())
    }

    fn reset(&mut self) {
        self.core.reset();
    }

    fn collect(&mut self, ctx: &mut EvalContext<'_>) -> bool {
        self.core.collect(ctx)
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>, _tiles: &TileMap) -> Result<bool, RuleError> {
        let unit = ctx.unit;
        let role = ctx.role;
        let config = ctx.config;

        self.core.pick_target(ctx, config.damage_score_mult, config.damage_base_score, |skill, opp, target| {
            let hit = hit_probability(ctx, skill, target);
            let expected = ctx.world.expected_damage(unit, skill, target);

            let mut value = hit * expected;
            value *= 1.0 + opp.threat * config.threat_value_scale;
            if expected >= target.hitpoints {
                value *= KILL_BONUS;
            } else {
                value *= 1.0 + WOUNDED_BONUS * (1.0 - target.health_ratio());
            }

            if skill.is_area() {
                let caught = ctx.world.units_within(target.tile, skill.area_radius);
                let enemies = caught.iter().filter(|u| u.faction != unit.faction).count();
                if enemies <= 1 && !role.may_use_area_on_single_targets {
                    return None;
                }
                for friend in caught.iter().filter(|u| u.faction == unit.faction) {
                    value -= hit
                        * ctx.world.expected_damage(unit, skill, friend)
                        * role.friendly_fire_target_value_mult
                        * role.friendly_fire_penalty;
                }
            }

            Some(value * role.inflict_damage_weight)
        })
    }

    fn score(&self) -> f32 {
        self.core.score()
    }

    fn action(&self, unit: UnitId) -> Option<Action> {
        self.core.action(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Hex;
    use crate::config::EngineConfig;
    use crate::role::RoleData;
    use crate::testing::{battlefield, grenade, rifle, unit};
    use crate::world::World;

    fn evaluate(world: &crate::battlefield::Battlefield, role: &RoleData) -> (bool, InflictDamage) {
        let me = world.unit(UnitId(1)).unwrap();
        let config = EngineConfig::default();
        let mut ctx = EvalContext::new(me, role, world, &config);
        let skill_type = me.skills[0].skill_type.clone();
        let mut behavior = InflictDamage::new(skill_type);
        assert!(behavior.collect(&mut ctx));
        behavior.reset();
        let ok = behavior.evaluate(&ctx, &TileMap::new()).unwrap();
        (ok, behavior)
    }

    #[test]
    fn test_prefers_killable_target() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(rifle(1, 6));
        let healthy = unit(2, 1, Hex::new(0, -2));
        let mut wounded = unit(3, 1, Hex::new(2, -2));
        wounded.hitpoints = 3.0;
        let world = battlefield(vec![me, healthy, wounded]);

        let (ok, behavior) = evaluate(&world, &RoleData::default());
        assert!(ok);
        assert!(behavior.score() > 0.0);
        assert_eq!(behavior.action(UnitId(1)).unwrap().target, Some(UnitId(3)));
    }

    #[test]
    fn test_equal_targets_first_wins() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(rifle(1, 6));
        let a = unit(2, 1, Hex::new(0, -2));
        let b = unit(3, 1, Hex::new(0, 2));
        let world = battlefield(vec![me, a, b]);

        let (_, behavior) = evaluate(&world, &RoleData::default());
        assert_eq!(behavior.action(UnitId(1)).unwrap().target, Some(UnitId(2)));
    }

    #[test]
    fn test_score_formula() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        let mut gun = rifle(1, 6);
        gun.always_hits = true;
        gun.damage = 4.0;
        me.skills.push(gun);
        let foe = unit(2, 1, Hex::new(0, -1));
        let world = battlefield(vec![me, foe]);
        let config = EngineConfig::default();

        let (ok, behavior) = evaluate(&world, &RoleData::default());
        assert!(ok);
        // hit 1.0, damage 4, threat 0, full health -> value 4
        let expected = (4.0 * config.damage_score_mult + config.damage_base_score).floor();
        assert_eq!(behavior.score(), expected);
    }

    #[test]
    fn test_area_skill_on_single_target_needs_flag() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(grenade(1));
        let foe = unit(2, 1, Hex::new(0, -3));
        let world = battlefield(vec![me, foe]);

        let (ok, _) = evaluate(&world, &RoleData::default());
        assert!(!ok);

        let role = RoleData { may_use_area_on_single_targets: true, ..RoleData::default() };
        let (ok, _) = evaluate(&world, &role);
        assert!(ok);
    }

    #[test]
    fn test_friendly_fire_lowers_score() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(grenade(1));
        let a = unit(2, 1, Hex::new(0, -3));
        let b = unit(3, 1, Hex::new(1, -3));
        let clean = battlefield(vec![me.clone(), a.clone(), b.clone()]);
        let (ok, clean_behavior) = evaluate(&clean, &RoleData::default());
        assert!(ok);

        let buddy = unit(4, 0, Hex::new(1, -4));
        let crowded = battlefield(vec![me, a, b, buddy]);
        let (_, crowded_behavior) = evaluate(&crowded, &RoleData::default());
        assert!(crowded_behavior.score() < clean_behavior.score());
    }

    #[test]
    fn test_evaluate_without_collect_is_error() {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(rifle(1, 6));
        let world = battlefield(vec![me]);
        let me = world.unit(UnitId(1)).unwrap();
        let role = RoleData::default();
        let config = EngineConfig::default();
        let ctx = EvalContext::new(me, &role, &world, &config);
        let mut behavior = InflictDamage::new(SkillType::new("rifle"));
        assert!(matches!(behavior.evaluate(&ctx, &TileMap::new()), Err(RuleError::NoSkill)));
    }
}
