//! Distance from the unit's current tile

use crate::context::EvalContext;
use crate::error::RuleError;
use crate::role::RoleData;
use crate::tile::{Contribution, TileScore};
use crate::unit::Unit;

use super::{Criterion, CriterionKind};

/// Distance score per tile of travel
pub const DISTANCE_WEIGHT: f32 = 0.5;

/// Penalizes tiles far from where the unit stands
pub struct DistanceToCurrentTile;

impl Criterion for DistanceToCurrentTile {
    fn kind(&self) -> CriterionKind {
        CriterionKind::DistanceToCurrentTile
    }

    fn is_valid(&self, _unit: &Unit, role: &RoleData) -> bool {
        role.considers_distance
    }

    fn evaluate(&self, _ctx: &EvalContext<'_>, tile: &TileScore) -> Result<Contribution, RuleError> {
        Ok(Contribution::distance(tile.distance_to_current * DISTANCE_WEIGHT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Hex;
    use crate::config::EngineConfig;
    use crate::testing::{battlefield, unit};
    use crate::world::World;

    #[test]
    fn test_half_point_per_tile() {
        let world = battlefield(vec![unit(1, 0, Hex::new(0, 0))]);
        let me = world.unit(crate::unit::UnitId(1)).unwrap();
        let role = RoleData::default();
        let config = EngineConfig::default();
        let ctx = EvalContext::new(me, &role, &world, &config);

        let c = DistanceToCurrentTile
            .evaluate(&ctx, &TileScore::new(Hex::new(0, 3), Hex::new(0, 3), 3.0))
            .unwrap();
        assert_eq!(c.distance, 1.5);
        assert_eq!(c.safety, 0.0);
        assert_eq!(c.utility, 0.0);
    }
}
