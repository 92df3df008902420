//! Tile-scoring rules
//!
//! A criterion scores one tile along one axis (utility, safety, distance)
//! for the evaluating unit. Criteria are registered once in a
//! [`CriterionRegistry`] shared by every agent, so implementations keep
//! no mutable state: per-evaluation caches go on the [`EvalContext`].

mod attack_position;
mod cover;
mod distance;
mod threat;

pub use attack_position::AttackPositions;
pub use cover::{CoverAgainstOpponents, COVER_PENALTY, HIDDEN_PENALTY_FACTOR};
pub use distance::{DistanceToCurrentTile, DISTANCE_WEIGHT};
pub use threat::ThreatFromOpponents;

use crate::context::EvalContext;
use crate::error::RuleError;
use crate::role::RoleData;
use crate::tile::{Contribution, TileMap, TileScore};
use crate::unit::Unit;

/// Discriminator for the built-in criteria
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CriterionKind {
    CoverAgainstOpponents,
    DistanceToCurrentTile,
    ThreatFromOpponents,
    AttackPositions,
    /// Criteria defined outside this crate
    Custom(&'static str),
}

/// Tile-scoring rule
pub trait Criterion: Send + Sync {
    fn kind(&self) -> CriterionKind;

    /// Whether this rule participates for the unit; re-checked every
    /// evaluation
    fn is_valid(&self, unit: &Unit, role: &RoleData) -> bool;

    /// Desired parallelism for `evaluate`
    fn threads(&self) -> usize {
        1
    }

    /// One-time setup per evaluation
    fn collect(&self, _ctx: &mut EvalContext<'_>) -> Result<(), RuleError> {
        Ok(())
    }

    /// Contribution to a single tile. Called concurrently across tiles.
    fn evaluate(&self, ctx: &EvalContext<'_>, tile: &TileScore) -> Result<Contribution, RuleError>;

    /// Cross-tile pass after final scores are computed
    fn post_process(&self, _ctx: &EvalContext<'_>, _tiles: &mut TileMap) -> Result<(), RuleError> {
        Ok(())
    }
}

/// Process-wide, read-only list of criteria in registration order
pub struct CriterionRegistry {
    criteria: Vec<Box<dyn Criterion>>,
}

impl CriterionRegistry {
    /// Registry with no criteria
    pub fn empty() -> Self {
        Self { criteria: Vec::new() }
    }

    /// Registry with the built-in criteria
    pub fn with_builtins() -> Self {
        Self::empty()
            .register(CoverAgainstOpponents)
            .register(DistanceToCurrentTile)
            .register(ThreatFromOpponents)
            .register(AttackPositions::default())
    }

    /// Append a criterion
    pub fn register(mut self, criterion: impl Criterion + 'static) -> Self {
        self.criteria.push(Box::new(criterion));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Criterion> {
        self.criteria.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registration_order() {
        let registry = CriterionRegistry::with_builtins();
        let kinds: Vec<CriterionKind> = registry.iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                CriterionKind::CoverAgainstOpponents,
                CriterionKind::DistanceToCurrentTile,
                CriterionKind::ThreatFromOpponents,
                CriterionKind::AttackPositions,
            ]
        );
    }

    #[test]
    fn test_toggles_gate_validity() {
        let registry = CriterionRegistry::with_builtins();
        let role = RoleData::default().without_criteria();
        let unit = crate::testing::unit(1, 0, crate::board::Hex::new(0, 0));
        assert!(registry.iter().all(|c| !c.is_valid(&unit, &role)));
        let role = RoleData::default();
        assert!(registry.iter().all(|c| c.is_valid(&unit, &role)));
    }
}
