//! Error types

use crate::board::Hex;
use crate::unit::UnitId;

/// Failure inside a single criterion or behavior.
///
/// The agent logs these and treats the rule as having contributed
/// nothing; they never abort an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("{0} read before collect")]
    NotCollected(&'static str),

    #[error("unit {0} is not on the battlefield")]
    UnknownUnit(UnitId),

    #[error("non-finite {what} at {tile}")]
    NonFinite { what: &'static str, tile: Hex },

    #[error("no usable skill was collected")]
    NoSkill,

    #[error("rule panicked: {0}")]
    Panicked(String),
}

/// Invalid scenario contents
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("board radius {0} is outside 0..=63")]
    BoardRadius(i8),

    #[error("duplicate unit id {0}")]
    DuplicateUnit(UnitId),

    #[error("unit {unit} uses unknown role '{role}'")]
    UnknownRole { unit: UnitId, role: String },

    #[error("unit {unit} stands off the board at {tile}")]
    OffBoard { unit: UnitId, tile: Hex },

    #[error("units {first} and {second} share tile {tile}")]
    SharedTile { first: UnitId, second: UnitId, tile: Hex },

    #[error("unit {0} has max_action_points below action_points")]
    ActionPoints(UnitId),
}
