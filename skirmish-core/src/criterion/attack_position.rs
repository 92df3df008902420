//! Utility of a tile as a firing position

use crate::board::CoverLevel;
use crate::context::EvalContext;
use crate::error::RuleError;
use crate::role::RoleData;
use crate::skill::SkillTag;
use crate::tile::{Contribution, TileMap, TileScore};
use crate::unit::Unit;
use crate::world::KnownOpponent;

use super::{Criterion, CriterionKind};

/// Scores each tile by the best expected damage the unit could deal from
/// it, then demotes tiles that fall well short of the best one.
///
/// Evaluation queries hit chances for every skill/opponent pair, which is
/// the most expensive rule in the set, so it asks for several workers.
pub struct AttackPositions {
    threads: usize,
}

impl AttackPositions {
    pub fn with_threads(threads: usize) -> Self {
        Self { threads: threads.max(1) }
    }

    /// Heavy cover between the tile and the target blocks the shot unless
    /// the role may peek
    fn line_blocked(ctx: &EvalContext<'_>, tile: &TileScore, opp: &KnownOpponent) -> bool {
        if ctx.role.may_peek {
            return false;
        }
        match tile.tile.direction_to(opp.tile) {
            Some(dir) => ctx.world.cover(tile.tile, dir, Some(ctx.unit.id)) == CoverLevel::Heavy,
            None => false,
        }
    }
}

impl Default for AttackPositions {
    fn default() -> Self {
        Self::with_threads(4)
    }
}

impl Criterion for AttackPositions {
    fn kind(&self) -> CriterionKind {
        CriterionKind::AttackPositions
    }

    fn is_valid(&self, _unit: &Unit, role: &RoleData) -> bool {
        role.seeks_attack_positions
    }

    fn threads(&self) -> usize {
        self.threads
    }

    fn collect(&self, ctx: &mut EvalContext<'_>) -> Result<(), RuleError> {
        ctx.collect_opponents();
        Ok(())
    }

    fn evaluate(&self, ctx: &EvalContext<'_>, tile: &TileScore) -> Result<Contribution, RuleError> {
        let opponents = ctx.opponents()?;
        let mut best = 0.0f32;

        for skill in ctx.unit.skills_tagged(SkillTag::Damage) {
            if !skill.can_use(ctx.unit) {
                continue;
            }
            for opp in opponents {
                if !skill.in_range(tile.tile, opp.tile) || Self::line_blocked(ctx, tile, opp) {
                    continue;
                }
                let Some(target) = ctx.world.unit(opp.id) else {
                    continue;
                };
                let hit = ctx.world.hit_chance(ctx.unit, skill, tile.tile, opp.tile);
                let value = hit.probability() * ctx.world.expected_damage(ctx.unit, skill, target);
                if value > best {
                    best = value;
                }
            }
        }

        Ok(Contribution::utility(best))
    }

    fn post_process(&self, ctx: &EvalContext<'_>, tiles: &mut TileMap) -> Result<(), RuleError> {
        let threshold = ctx.role.utility_threshold_scale;
        if threshold <= 0.0 {
            return Ok(());
        }
        let best = tiles.iter().map(|t| t.utility_score).fold(0.0f32, f32::max);
        if best <= 0.0 {
            return Ok(());
        }

        let cutoff = best * threshold;
        for t in tiles.iter_mut() {
            if t.utility_score < cutoff && t.final_score > 0.0 {
                t.final_score *= t.utility_score.max(0.0) / cutoff;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Hex;
    use crate::config::EngineConfig;
    use crate::testing::{battlefield, rifle, unit};
    use crate::unit::UnitId;
    use crate::world::World;

    fn setup() -> crate::battlefield::Battlefield {
        let mut me = unit(1, 0, Hex::new(0, 0));
        me.skills.push(rifle(1, 3));
        let foe = unit(2, 1, Hex::new(0, -4));
        battlefield(vec![me, foe])
    }

    #[test]
    fn test_utility_only_in_range() {
        let world = setup();
        let me = world.unit(UnitId(1)).unwrap();
        let role = RoleData::default();
        let config = EngineConfig::default();
        let mut ctx = EvalContext::new(me, &role, &world, &config);
        AttackPositions::default().collect(&mut ctx).unwrap();

        let here = TileScore::new(Hex::new(0, 0), Hex::new(0, 0), 0.0);
        let closer = TileScore::new(Hex::new(0, -1), Hex::new(0, -1), 1.0);
        assert_eq!(AttackPositions::default().evaluate(&ctx, &here).unwrap().utility, 0.0);
        assert!(AttackPositions::default().evaluate(&ctx, &closer).unwrap().utility > 0.0);
    }

    #[test]
    fn test_heavy_cover_blocks_unless_peeking() {
        let mut world = setup();
        world.set_cover(Hex::new(0, -1), 0, CoverLevel::Heavy);
        let me = world.unit(UnitId(1)).unwrap();
        let config = EngineConfig::default();
        let tile = TileScore::new(Hex::new(0, -1), Hex::new(0, -1), 1.0);

        let role = RoleData::default();
        let mut ctx = EvalContext::new(me, &role, &world, &config);
        ctx.collect_opponents();
        assert_eq!(AttackPositions::default().evaluate(&ctx, &tile).unwrap().utility, 0.0);

        let peeker = RoleData { may_peek: true, ..RoleData::default() };
        let mut ctx = EvalContext::new(me, &peeker, &world, &config);
        ctx.collect_opponents();
        assert!(AttackPositions::default().evaluate(&ctx, &tile).unwrap().utility > 0.0);
    }

    #[test]
    fn test_post_process_demotes_weak_positions() {
        let world = setup();
        let me = world.unit(UnitId(1)).unwrap();
        let role = RoleData { utility_threshold_scale: 0.5, ..RoleData::default() };
        let config = EngineConfig::default();
        let ctx = EvalContext::new(me, &role, &world, &config);

        let mut tiles = TileMap::new();
        for (q, utility) in [(0, 8.0f32), (1, 2.0), (2, 6.0)] {
            let mut s = TileScore::new(Hex::new(q, 0), Hex::new(q, 0), q as f32);
            s.utility_score = utility;
            s.final_score = 10.0;
            tiles.insert(s);
        }
        AttackPositions::default().post_process(&ctx, &mut tiles).unwrap();

        assert_eq!(tiles.get(Hex::new(0, 0)).unwrap().final_score, 10.0);
        // 2 / (8 * 0.5) = 0.5
        assert_eq!(tiles.get(Hex::new(1, 0)).unwrap().final_score, 5.0);
        assert_eq!(tiles.get(Hex::new(2, 0)).unwrap().final_score, 10.0);
    }
}
