//! Candidate actions
//!
//! Each agent owns one instance per action kind and reuses it across
//! turns; only the score and target fields are transient. Attack-family
//! behaviors carry a [`DedupKey`] so that two copies of the same skill
//! are only considered once.

mod attack;
mod damage;
mod movement;
mod stun;
mod suppression;

pub use damage::{InflictDamage, KILL_BONUS};
pub use movement::Move;
pub use stun::Stun;
pub use suppression::InflictSuppression;

use crate::board::Hex;
use crate::context::EvalContext;
use crate::error::RuleError;
use crate::skill::{SkillId, SkillTag, SkillType};
use crate::tile::TileMap;
use crate::unit::{Unit, UnitId};

/// Discriminator for behavior variants; the declaration order is the
/// sort order used to group behaviors before evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BehaviorKind {
    Move,
    InflictDamage,
    InflictSuppression,
    Stun,
}

/// Identity of an attack-family behavior for de-duplication
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub kind: BehaviorKind,
    pub skill_type: SkillType,
}

/// The chosen action handed to the caller for execution
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub unit: UnitId,
    pub kind: BehaviorKind,
    /// Destination for moves, target tile for attacks
    pub tile: Hex,
    pub target: Option<UnitId>,
    pub skill: Option<SkillId>,
}

/// Candidate action rule
pub trait Behavior: Send + Sync {
    fn kind(&self) -> BehaviorKind;

    /// Attack-family behaviors return their de-duplication key
    fn dedup_key(&self) -> Option<DedupKey> {
        None
    }

    /// Clear score and target
    fn reset(&mut self);

    /// Gather the means to act; false excludes the behavior this evaluation
    fn collect(&mut self, ctx: &mut EvalContext<'_>) -> bool;

    /// Compute target and score; false means not usable
    fn evaluate(&mut self, ctx: &EvalContext<'_>, tiles: &TileMap) -> Result<bool, RuleError>;

    fn score(&self) -> f32;

    /// Action for the last successful evaluation
    fn action(&self, unit: UnitId) -> Option<Action>;
}

/// Default behavior list for a unit: a move plus one attack behavior per
/// tagged skill in inventory order
pub fn for_unit(unit: &Unit) -> Vec<Box<dyn Behavior>> {
    let mut behaviors: Vec<Box<dyn Behavior>> = vec![Box::new(Move::new())];
    for skill in &unit.skills {
        if skill.has_tag(SkillTag::Damage) {
            behaviors.push(Box::new(InflictDamage::new(skill.skill_type.clone())));
        }
        if skill.has_tag(SkillTag::Suppression) {
            behaviors.push(Box::new(InflictSuppression::new(skill.skill_type.clone())));
        }
        if skill.has_tag(SkillTag::Stun) {
            behaviors.push(Box::new(Stun::new(skill.skill_type.clone())));
        }
    }
    behaviors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rifle, unit};

    #[test]
    fn test_for_unit_builds_one_per_tag() {
        let mut u = unit(1, 0, Hex::new(0, 0));
        let mut smg = rifle(2, 3);
        smg.tags.push(SkillTag::Suppression);
        u.skills.push(rifle(1, 6));
        u.skills.push(smg);

        let kinds: Vec<BehaviorKind> = for_unit(&u).iter().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                BehaviorKind::Move,
                BehaviorKind::InflictDamage,
                BehaviorKind::InflictDamage,
                BehaviorKind::InflictSuppression,
            ]
        );
    }

    #[test]
    fn test_kind_sort_order() {
        assert!(BehaviorKind::Move < BehaviorKind::InflictDamage);
        assert!(BehaviorKind::InflictDamage < BehaviorKind::InflictSuppression);
        assert!(BehaviorKind::InflictSuppression < BehaviorKind::Stun);
    }
}
