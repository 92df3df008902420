//! Per-evaluation context handed to every rule

use crate::config::EngineConfig;
use crate::error::RuleError;
use crate::role::RoleData;
use crate::unit::Unit;
use crate::world::{KnownOpponent, World};

/// Everything a criterion or behavior may read during one agent's
/// evaluation, plus the caches `collect` fills.
///
/// Rules are shared between agents and hold no state of their own; any
/// per-evaluation data they gather lives here and is dropped with the
/// context.
pub struct EvalContext<'a> {
    pub unit: &'a Unit,
    pub role: &'a RoleData,
    pub world: &'a dyn World,
    pub config: &'a EngineConfig,
    opponents: Option<Vec<KnownOpponent>>,
}

impl<'a> EvalContext<'a> {
    pub fn new(unit: &'a Unit, role: &'a RoleData, world: &'a dyn World, config: &'a EngineConfig) -> Self {
        Self {
            unit,
            role,
            world,
            config,
            opponents: None,
        }
    }

    /// Fetch the opponent registry once for this evaluation
    pub fn collect_opponents(&mut self) {
        if self.opponents.is_none() {
            self.opponents = Some(self.world.known_opponents(self.unit.faction));
        }
    }

    /// Opponents gathered by [`collect_opponents`](Self::collect_opponents)
    pub fn opponents(&self) -> Result<&[KnownOpponent], RuleError> {
        self.opponents
            .as_deref()
            .ok_or(RuleError::NotCollected("opponent list"))
    }
}
