//! Shared state and target selection for the attack family

use crate::board::Hex;
use crate::context::EvalContext;
use crate::error::RuleError;
use crate::skill::{Skill, SkillTag, SkillType};
use crate::unit::{Unit, UnitId};
use crate::world::KnownOpponent;

use super::{Action, BehaviorKind, DedupKey};

/// Skill, score and target bookkeeping common to every attack behavior
#[derive(Clone, Debug)]
pub(super) struct AttackCore {
    kind: BehaviorKind,
    tag: SkillTag,
    skill_type: SkillType,
    skill: Option<Skill>,
    score: f32,
    target: Option<(Hex, UnitId)>,
}

impl AttackCore {
    pub fn new(kind: BehaviorKind, tag: SkillTag, skill_type: SkillType) -> Self {
        Self {
            kind,
            tag,
            skill_type,
            skill: None,
            score: 0.0,
            target: None,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            kind: self.kind,
            skill_type: self.skill_type.clone(),
        }
    }

    pub fn reset(&mut self) {
        self.score = 0.0;
        self.target = None;
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    /// First usable skill of the right type and tag in the unit's inventory
    pub fn collect(&mut self, ctx: &mut EvalContext<'_>) -> bool {
        ctx.collect_opponents();
        self.skill = ctx
            .unit
            .skills
            .iter()
            .find(|s| s.skill_type == self.skill_type && s.has_tag(self.tag) && s.can_use(ctx.unit))
            .cloned();
        self.skill.is_some()
    }

    /// Value every living opponent within range of the unit's tile and keep
    /// the first strictly best one.
    ///
    /// `value_of` returns `None` to rule a target out. The winning value is
    /// turned into an integer score as `floor(value * mult + base)`.
    pub fn pick_target<F>(
        &mut self,
        ctx: &EvalContext<'_>,
        mult: f32,
        base: f32,
        mut value_of: F,
    ) -> Result<bool, RuleError>
    where
        F: FnMut(&Skill, &KnownOpponent, &Unit) -> Option<f32>,
    {
        let skill = self.skill.as_ref().ok_or(RuleError::NoSkill)?;
        let unit = ctx.unit;

        let mut best: Option<(f32, &KnownOpponent)> = None;
        for opp in ctx.opponents()? {
            if !skill.in_range(unit.tile, opp.tile) {
                continue;
            }
            let Some(target) = ctx.world.unit(opp.id) else {
                continue;
            };
            if !target.is_alive() {
                continue;
            }
            let Some(value) = value_of(skill, opp, target) else {
                continue;
            };
            if !value.is_finite() {
                return Err(RuleError::NonFinite { what: "target value", tile: opp.tile });
            }
            if best.map_or(true, |(b, _)| value > b) {
                best = Some((value, opp));
            }
        }

        match best {
            Some((value, opp)) if value > 0.0 => {
                self.score = (value * mult + base).floor();
                self.target = Some((opp.tile, opp.id));
                Ok(self.score > 0.0)
            }
            _ => Ok(false),
        }
    }

    pub fn action(&self, unit: UnitId) -> Option<Action> {
        let (tile, target) = self.target?;
        let skill = self.skill.as_ref()?;
        Some(Action {
            unit,
            kind: self.kind,
            tile,
            target: Some(target),
            skill: Some(skill.id),
        })
    }
}

/// Hit probability from the unit's current tile
pub(super) fn hit_probability(ctx: &EvalContext<'_>, skill: &Skill, target: &Unit) -> f32 {
    ctx.world
        .hit_chance(ctx.unit, skill, ctx.unit.tile, target.tile)
        .probability()
}
