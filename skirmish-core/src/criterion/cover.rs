//! Cover against known opponents

use crate::board::CoverLevel;
use crate::context::EvalContext;
use crate::error::RuleError;
use crate::role::RoleData;
use crate::tile::{Contribution, TileScore};
use crate::unit::Unit;

use super::{Criterion, CriterionKind};

/// Exposure penalty per cover level (none, light, medium, heavy)
pub const COVER_PENALTY: [f32; 4] = [1.0, 0.7, 0.4, 0.1];

/// Penalty multiplier when the opponent cannot see the tile
pub const HIDDEN_PENALTY_FACTOR: f32 = 0.9;

/// Safety per unit of unpenalized exposure
const SAFETY_SCALE: f32 = 10.0;

/// Rewards tiles whose cover faces the opponents that threaten them
pub struct CoverAgainstOpponents;

impl Criterion for CoverAgainstOpponents {
    fn kind(&self) -> CriterionKind {
        CriterionKind::CoverAgainstOpponents
    }

    fn is_valid(&self, _unit: &Unit, role: &RoleData) -> bool {
        role.considers_cover
    }

    fn collect(&self, ctx: &mut EvalContext<'_>) -> Result<(), RuleError> {
        ctx.collect_opponents();
        Ok(())
    }

    fn evaluate(&self, ctx: &EvalContext<'_>, tile: &TileScore) -> Result<Contribution, RuleError> {
        let opponents = ctx.opponents()?;

        let mut total_penalty = 0.0f32;
        let mut worst_cover: Option<CoverLevel> = None;
        let mut seen = false;

        for opp in opponents {
            let cover = match tile.tile.direction_to(opp.tile) {
                Some(dir) => ctx.world.cover(tile.tile, dir, Some(ctx.unit.id)),
                None => CoverLevel::None,
            };
            worst_cover = Some(worst_cover.map_or(cover, |w| w.min(cover)));

            let mut penalty = COVER_PENALTY[cover.index()];
            if ctx.world.is_visible(opp.id, tile.tile) {
                seen = true;
            } else {
                penalty *= HIDDEN_PENALTY_FACTOR;
            }
            total_penalty += penalty * opp.threat;
        }

        let mut safety = (1.0 - total_penalty) * SAFETY_SCALE;
        if ctx.role.prefers_hidden && !seen {
            safety += ctx.config.hidden_safety_bonus;
        }

        Ok(Contribution {
            safety,
            cover: worst_cover,
            visible: Some(seen),
            ..Default::default()
        })
    }
}
