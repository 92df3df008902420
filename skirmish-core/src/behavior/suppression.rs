//! Attack a target to suppress it

use crate::context::EvalContext;
use crate::error::RuleError;
use crate::skill::{SkillTag, SkillType};
use crate::tile::TileMap;
use crate::unit::{Suppression, UnitId};

use super::attack::{hit_probability, AttackCore};
use super::{Action, Behavior, BehaviorKind, DedupKey};

/// Value multiplier against targets that are already suppressed or pinned
const ALREADY_SUPPRESSED: f32 = 0.5;

/// Suppress with one skill type
pub struct InflictSuppression {
    core: AttackCore,
}

impl InflictSuppression {
    pub fn new(skill_type: SkillType) -> Self {
        Self {
            core: AttackCore::new(BehaviorKind::InflictSuppression, SkillTag::Suppression, skill_type),
        }
    }
}

impl Behavior for InflictSuppression {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::InflictSuppression
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
        let weight = ctx.role.inflict_suppression_weight;

        self.core.pick_target(
            ctx,
            config.suppression_score_mult,
            config.suppression_base_score,
            |skill, opp, target| {
                let hit = hit_probability(ctx, skill, target);
                let mut value = hit * ctx.world.expected_suppression(ctx.unit, skill, target);
                value *= 1.0 + opp.threat * config.threat_value_scale;
                if target.suppression != Suppression::None {
                    value *= ALREADY_SUPPRESSED;
                }
                Some(value * weight)
            },
        )
    }

    fn score(&self) -> f32 {
        self.core.score()
    }

    fn action(&self, unit: UnitId) -> Option<Action> {
        self.core.action(unit)
    }
}
