//! Attack a target to stun it

use crate::context::EvalContext;
use crate::error::RuleError;
use crate::skill::{SkillTag, SkillType};
use crate::tile::TileMap;
use crate::unit::UnitId;

use super::attack::{hit_probability, AttackCore};
use super::{Action, Behavior, BehaviorKind, DedupKey};

/// Stun the most threatening target that is not already stunned
pub struct Stun {
    core: AttackCore,
}

impl Stun {
    pub fn new(skill_type: SkillType) -> Self {
        Self {
            core: AttackCore::new(BehaviorKind::Stun, SkillTag::Stun, skill_type),
        }
    }
}

impl Behavior for Stun {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Stun
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
        let config = ctx.config;
        let weight = ctx.role.stun_weight;

        self.core.pick_target(ctx, config.stun_score_mult, config.stun_base_score, |skill, opp, target| {
            if target.stunned {
                return None;
            }
            Some(hit_probability(ctx, skill, target) * opp.threat.max(0.0) * weight)
        })
    }

    fn score(&self) -> f32 {
        self.core.score()
    }

    fn action(&self, unit: UnitId) -> Option<Action> {
        self.core.action(unit)
    }
}
