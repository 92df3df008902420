//! Configuration for faction scheduling
//!
//! Level 4 - Utilities and configuration

/// Upper bound on actions taken in one faction turn
pub const MAX_ACTIONS_PER_TURN: usize = 64;

/// Faction scheduler configuration
#[derive(Clone, Debug)]
pub struct FactionConfig {
    /// Evaluate agents on the rayon pool
    pub parallel: bool,
    /// Actions allowed before the turn is cut short
    pub max_actions: usize,
}

impl Default for FactionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_actions: MAX_ACTIONS_PER_TURN,
        }
    }
}

impl FactionConfig {
    /// Evaluate agents one after another
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    /// Set the per-turn action bound
    pub fn with_max_actions(mut self, max_actions: usize) -> Self {
        self.max_actions = max_actions;
        self
    }
}
