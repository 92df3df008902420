//! Move to the best-scoring reachable tile

use crate::board::Hex;
use crate::context::EvalContext;
use crate::error::RuleError;
use crate::tile::TileMap;
use crate::unit::UnitId;

use super::{Action, Behavior, BehaviorKind};

/// Move to the reachable tile with the greatest final score
#[derive(Debug, Default)]
pub struct Move {
    score: f32,
    destination: Option<Hex>,
}

impl Move {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for Move {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Move
    }

    fn reset(&mut self) {
        self.score = 0.0;
        self.destination = None;
    }

    fn collect(&mut self, ctx: &mut EvalContext<'_>) -> bool {
        let unit = ctx.unit;
        unit.action_points > 0 && (!unit.has_acted || ctx.role.may_evade)
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>, tiles: &TileMap) -> Result<bool, RuleError> {
        let current = ctx.unit.tile;

        let mut best: Option<(Hex, f32)> = None;
        for score in tiles {
            if score.tile == current || !ctx.world.can_reach(ctx.unit, score.tile) {
                continue;
            }
            if !score.final_score.is_finite() {
                return Err(RuleError::NonFinite { what: "final score", tile: score.tile });
            }
            if best.map_or(true, |(_, b)| score.final_score > b) {
                best = Some((score.ultimate_tile, score.final_score));
            }
        }

        match best {
            Some((tile, value)) if value > 0.0 => {
                self.score = value * ctx.role.move_weight;
                self.destination = Some(tile);
                Ok(self.score > 0.0)
            }
            _ => Ok(false),
        }
    }

    fn score(&self) -> f32 {
        self.score
    }

    fn action(&self, unit: UnitId) -> Option<Action> {
        Some(Action {
            unit,
            kind: BehaviorKind::Move,
            tile: self.destination?,
            target: None,
            skill: None,
        })
    }
}
