//! Threat from opponents that can reach a tile

use crate::config::EngineConfig;
use crate::context::EvalContext;
use crate::error::RuleError;
use crate::role::RoleData;
use crate::tile::{Contribution, TileScore};
use crate::unit::{Suppression, Unit};
use crate::world::KnownOpponent;

use super::{Criterion, CriterionKind};

/// Removes safety for every opponent whose damage range covers the tile
pub struct ThreatFromOpponents;

impl ThreatFromOpponents {
    /// Threat an opponent poses after state discounts
    pub fn discounted_threat(opp: &KnownOpponent, config: &EngineConfig) -> f32 {
        let mut threat = opp.threat;
        threat *= match opp.suppression {
            Suppression::None => 1.0,
            Suppression::Suppressed => config.suppressed_discount,
            Suppression::Pinned => config.pinned_discount,
        };
        if opp.has_acted {
            threat *= config.acted_discount;
        }
        threat
    }
}

impl Criterion for ThreatFromOpponents {
    fn kind(&self) -> CriterionKind {
        CriterionKind::ThreatFromOpponents
    }

    fn is_valid(&self, _unit: &Unit, role: &RoleData) -> bool {
        role.avoids_opponents
    }

    fn collect(&self, ctx: &mut EvalContext<'_>) -> Result<(), RuleError> {
        ctx.collect_opponents();
        Ok(())
    }

    fn evaluate(&self, ctx: &EvalContext<'_>, tile: &TileScore) -> Result<Contribution, RuleError> {
        let safety: f32 = ctx
            .opponents()?
            .iter()
            .filter(|opp| opp.threatens(tile.tile))
            .map(|opp| Self::discounted_threat(opp, ctx.config) * ctx.config.threat_safety_scale)
            .sum();
        Ok(Contribution::safety(-safety))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Hex;
    use crate::testing::{battlefield, rifle, unit};
    use crate::unit::UnitId;
    use crate::world::World;

    fn opponent(suppression: Suppression, acted: bool) -> KnownOpponent {
        KnownOpponent {
            id: UnitId(9),
            tile: Hex::new(0, 0),
            threat: 1.0,
            damage_range: Some((1, 5)),
            suppression,
            has_acted: acted,
        }
    }

    #[test]
    fn test_discounts() {
        let config = EngineConfig::default();
        let full = ThreatFromOpponents::discounted_threat(&opponent(Suppression::None, false), &config);
        let suppressed = ThreatFromOpponents::discounted_threat(&opponent(Suppression::Suppressed, false), &config);
        let pinned = ThreatFromOpponents::discounted_threat(&opponent(Suppression::Pinned, false), &config);
        let acted = ThreatFromOpponents::discounted_threat(&opponent(Suppression::None, true), &config);
        let both = ThreatFromOpponents::discounted_threat(&opponent(Suppression::Pinned, true), &config);

        assert_eq!(full, 1.0);
        assert_eq!(suppressed, config.suppressed_discount);
        assert_eq!(pinned, config.pinned_discount);
        assert_eq!(acted, config.acted_discount);
        assert!((both - config.pinned_discount * config.acted_discount).abs() < 1e-6);
        assert!(pinned < suppressed);
    }

    #[test]
    fn test_only_tiles_in_range_lose_safety() {
        let me = unit(1, 0, Hex::new(0, 0));
        let mut foe = unit(2, 1, Hex::new(0, -6));
        foe.threat = 0.5;
        foe.skills.push(rifle(10, 4));
        let world = battlefield(vec![me, foe]);
        let me = world.unit(UnitId(1)).unwrap();
        let role = RoleData::default();
        let config = EngineConfig::default();
        let mut ctx = EvalContext::new(me, &role, &world, &config);
        ThreatFromOpponents.collect(&mut ctx).unwrap();

        // Six tiles away: outside a 4-tile rifle
        let far = ThreatFromOpponents
            .evaluate(&ctx, &TileScore::new(Hex::new(0, 0), Hex::new(0, 0), 0.0))
            .unwrap();
        assert_eq!(far.safety, 0.0);

        // Three tiles away: inside
        let near = ThreatFromOpponents
            .evaluate(&ctx, &TileScore::new(Hex::new(0, -3), Hex::new(0, -3), 3.0))
            .unwrap();
        assert!((near.safety + 0.5 * config.threat_safety_scale).abs() < 1e-5);
    }

    #[test]
    fn test_evaluate_before_collect_fails() {
        let world = battlefield(vec![unit(1, 0, Hex::new(0, 0))]);
        let me = world.unit(UnitId(1)).unwrap();
        let role = RoleData::default();
        let config = EngineConfig::default();
        let ctx = EvalContext::new(me, &role, &world, &config);
        let result = ThreatFromOpponents.evaluate(&ctx, &TileScore::new(Hex::new(0, 0), Hex::new(0, 0), 0.0));
        assert!(matches!(result, Err(RuleError::NotCollected(_))));
    }
}
