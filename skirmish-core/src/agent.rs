//! Per-unit decision pipeline
//!
//! - Level 1: `Agent::evaluate()` - orchestration
//! - Level 2: readiness wait, tile evaluation, behavior evaluation
//! - Level 3: criterion passes, post-processing, selection

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::behavior::{self, Action, Behavior};
use crate::config::EngineConfig;
use crate::context::EvalContext;
use crate::criterion::{Criterion, CriterionRegistry};
use crate::error::RuleError;
use crate::tile::{TileMap, TileScore};
use crate::unit::{selection_multiplier, FactionId, Unit, UnitId};
use crate::world::World;

// ============================================================================
// STATE
// ============================================================================

/// Where the agent is in its evaluation cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AgentState {
    #[default]
    None,
    EvaluatingTiles,
    EvaluatingBehaviors,
    ReadyToExecute,
    Executing,
}

/// Why a turn was ended from inside `evaluate`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnEndReason {
    SkipFlag,
    IterationLimit,
}

/// Outcome of one `evaluate` call
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Evaluation {
    /// Unit missing, dead, roleless or already done; nothing changed
    Skipped,
    TurnEnded(TurnEndReason),
    /// Readiness wait timed out; no iteration consumed
    NotReady,
    /// No behavior scored above zero
    NoAction,
    Ready { score: f32 },
}

/// Decision-maker for one unit
pub struct Agent {
    unit: UnitId,
    faction: FactionId,
    behaviors: Vec<Box<dyn Behavior>>,
    selected: Option<usize>,
    selected_score: f32,
    iterations: u32,
    state: AgentState,
    tiles: TileMap,
    ready_at: Option<Instant>,
    skip_evaluation: bool,
    criteria: Arc<CriterionRegistry>,
    config: Arc<EngineConfig>,
}

impl Agent {
    /// Agent with the default behavior list for the unit's skills
    pub fn new(unit: &Unit, criteria: Arc<CriterionRegistry>, config: Arc<EngineConfig>) -> Self {
        Self::with_behaviors(unit, behavior::for_unit(unit), criteria, config)
    }

    pub fn with_behaviors(
        unit: &Unit,
        behaviors: Vec<Box<dyn Behavior>>,
        criteria: Arc<CriterionRegistry>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            unit: unit.id,
            faction: unit.faction,
            behaviors,
            selected: None,
            selected_score: 0.0,
            iterations: 0,
            state: AgentState::None,
            tiles: TileMap::new(),
            ready_at: None,
            skip_evaluation: false,
            criteria,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn unit_id(&self) -> UnitId {
        self.unit
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Score of the selected behavior after the selection multiplier
    pub fn selected_score(&self) -> f32 {
        self.selected_score
    }

    /// Tile map of the last evaluation
    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    pub fn behaviors(&self) -> &[Box<dyn Behavior>] {
        &self.behaviors
    }

    /// The chosen behavior, only while ready or executing
    pub fn selected_behavior(&self) -> Option<&dyn Behavior> {
        match self.state {
            AgentState::ReadyToExecute | AgentState::Executing => {
                self.selected.map(|i| self.behaviors[i].as_ref())
            }
            _ => None,
        }
    }

    /// Action of the selected behavior without starting execution
    pub fn selected_action(&self) -> Option<Action> {
        self.selected_behavior()?.action(self.unit)
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Start a new turn: clears the iteration counter and any selection
    pub fn begin_turn(&mut self) {
        self.iterations = 0;
        self.clear_selection();
        self.state = AgentState::None;
    }

    /// Another agent won the pooled pick. The evaluation that made this
    /// one ready is not counted toward the iteration guard, so waiting for
    /// a turn never ends it.
    pub fn pass_over(&mut self) {
        if self.state == AgentState::ReadyToExecute {
            self.iterations = self.iterations.saturating_sub(1);
        }
    }

    /// Hold off evaluation for `delay` from now
    pub fn delay(&mut self, delay: Duration) {
        self.ready_at = Some(Instant::now() + delay);
    }

    /// Debug switch: end the unit's turn on the next evaluation
    pub fn set_skip(&mut self, skip: bool) {
        self.skip_evaluation = skip;
    }

    /// Hand the selected action to the caller and enter `Executing`
    pub fn execute(&mut self) -> Option<Action> {
        if self.state != AgentState::ReadyToExecute {
            return None;
        }
        let action = self.selected_action()?;
        self.state = AgentState::Executing;
        tracing::debug!(unit = %self.unit, kind = ?action.kind, tile = %action.tile, "executing");
        Some(action)
    }

    /// Single readiness check.
    ///
    /// Ready once the delay has passed, the unit is not busy and either the
    /// mission is idle or the unit still has action points.
    pub fn is_ready(&self, world: &dyn World, now: Instant) -> bool {
        if self.ready_at.map_or(false, |at| now < at) {
            return false;
        }
        if world.is_busy(self.unit) {
            return false;
        }
        match world.unit(self.unit) {
            Some(unit) => !world.mission_resolving() || unit.action_points > 0,
            None => false,
        }
    }

    // ========================================================================
    // Level 1 - Orchestration
    // ========================================================================

    /// Run one full evaluation cycle against the world
    pub fn evaluate(&mut self, world: &dyn World) -> Evaluation {
        let Some(unit) = world.unit(self.unit) else {
            return Evaluation::Skipped;
        };
        if !unit.is_alive() || world.is_turn_done(self.unit) {
            return Evaluation::Skipped;
        }

        if self.skip_evaluation {
            tracing::debug!(unit = %self.unit, "skip flag set, ending turn");
            world.end_turn(self.unit);
            return Evaluation::TurnEnded(TurnEndReason::SkipFlag);
        }

        let Some(role) = world.role(unit) else {
            tracing::warn!(unit = %self.unit, role = %unit.role, "no role data");
            return Evaluation::Skipped;
        };

        self.state = AgentState::None;
        self.tiles.clear();
        self.clear_selection();

        if !self.wait_until_ready(world) {
            tracing::debug!(unit = %self.unit, "not ready before timeout");
            return Evaluation::NotReady;
        }

        self.iterations += 1;
        if self.iterations > self.config.max_iterations {
            tracing::warn!(
                unit = %self.unit,
                iterations = self.iterations,
                "iteration limit reached, ending turn"
            );
            world.end_turn(self.unit);
            return Evaluation::TurnEnded(TurnEndReason::IterationLimit);
        }

        let config = Arc::clone(&self.config);
        let criteria = Arc::clone(&self.criteria);
        let mut ctx = EvalContext::new(unit, role, world, &config);

        self.state = AgentState::EvaluatingTiles;
        self.evaluate_tiles(&mut ctx, &criteria);

        self.state = AgentState::EvaluatingBehaviors;
        let Some((index, raw)) = self.evaluate_behaviors(&mut ctx) else {
            tracing::debug!(unit = %self.unit, "no usable behavior");
            return Evaluation::NoAction;
        };

        let score = (raw * selection_multiplier(unit)).max(1.0);
        self.selected = Some(index);
        self.selected_score = score;
        self.state = AgentState::ReadyToExecute;

        tracing::debug!(
            unit = %self.unit,
            kind = ?self.behaviors[index].kind(),
            raw,
            score,
            "behavior selected"
        );
        Evaluation::Ready { score }
    }

    // ========================================================================
    // Level 2 - Phases
    // ========================================================================

    /// Poll `is_ready` until it holds or the configured time box runs out
    pub fn wait_until_ready(&self, world: &dyn World) -> bool {
        let deadline = Instant::now() + self.config.readiness_timeout;
        loop {
            let now = Instant::now();
            if self.is_ready(world, now) {
                return true;
            }
            if now >= deadline {
                return false;
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Build the tile map, run every valid criterion over it, then
    /// combine and post-process
    fn evaluate_tiles(&mut self, ctx: &mut EvalContext<'_>, criteria: &CriterionRegistry) {
        self.build_tile_map(ctx);

        let mut active: Vec<&dyn Criterion> = Vec::new();
        for criterion in criteria.iter() {
            if !criterion.is_valid(ctx.unit, ctx.role) {
                continue;
            }
            match guarded(|| criterion.collect(ctx)) {
                Ok(()) => active.push(criterion),
                Err(e) => {
                    tracing::warn!(unit = %self.unit, criterion = ?criterion.kind(), error = %e, "criterion collect failed");
                }
            }
        }
        let ctx: &EvalContext<'_> = ctx;

        for criterion in active.iter().filter(|c| c.threads() <= 1) {
            score_tiles(*criterion, ctx, self.tiles.as_mut_slice());
        }
        for criterion in active.iter().filter(|c| c.threads() > 1) {
            self.score_tiles_parallel(*criterion, ctx);
        }

        for tile in self.tiles.iter_mut() {
            let combined = ctx.role.combine(tile.utility_score, tile.safety_score, tile.distance_score);
            tile.final_score = ctx.config.rescale(combined);
        }

        for criterion in &active {
            if let Err(e) = guarded(|| criterion.post_process(ctx, &mut self.tiles)) {
                tracing::warn!(unit = %self.unit, criterion = ?criterion.kind(), error = %e, "post-process failed");
            }
        }

        tracing::debug!(unit = %self.unit, tiles = self.tiles.len(), criteria = active.len(), "tiles evaluated");
    }

    /// Group, de-duplicate, collect and evaluate behaviors; returns the
    /// index and raw score of the strictly best one
    fn evaluate_behaviors(&mut self, ctx: &mut EvalContext<'_>) -> Option<(usize, f32)> {
        self.behaviors.sort_by_key(|b| b.kind());

        let mut seen = FxHashSet::default();
        let mut collected = Vec::new();
        for (i, behavior) in self.behaviors.iter_mut().enumerate() {
            if let Some(key) = behavior.dedup_key() {
                if !seen.insert(key) {
                    continue;
                }
            }
            match guarded(|| Ok(behavior.collect(ctx))) {
                Ok(true) => collected.push(i),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(unit = %self.unit, behavior = ?behavior.kind(), error = %e, "behavior collect failed");
                }
            }
        }
        let ctx: &EvalContext<'_> = ctx;

        for behavior in self.behaviors.iter_mut() {
            behavior.reset();
        }

        let mut best: Option<(usize, f32)> = None;
        for &i in &collected {
            let behavior = &mut self.behaviors[i];
            let tiles = &self.tiles;
            match guarded(|| behavior.evaluate(ctx, tiles)) {
                Ok(true) => {
                    let score = behavior.score();
                    if score > 0.0 && best.map_or(true, |(_, b)| score > b) {
                        best = Some((i, score));
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(unit = %self.unit, behavior = ?behavior.kind(), error = %e, "behavior evaluation failed");
                }
            }
        }

        tracing::debug!(unit = %self.unit, collected = collected.len(), "behaviors evaluated");
        best
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Current tile first, then the reachable tiles in reported order
    fn build_tile_map(&mut self, ctx: &EvalContext<'_>) {
        let unit = ctx.unit;
        let world = ctx.world;

        self.tiles.insert(TileScore::new(
            unit.tile,
            world.ultimate_tile(unit, unit.tile),
            world.travel_distance(unit, unit.tile),
        ));
        for tile in world.reachable_tiles(unit) {
            self.tiles.insert(TileScore::new(
                tile,
                world.ultimate_tile(unit, tile),
                world.travel_distance(unit, tile),
            ));
        }
    }

    /// Split the tiles into exactly `threads` contiguous partitions on the
    /// worker pool when there is enough work per worker, otherwise run in order
    fn score_tiles_parallel(&mut self, criterion: &dyn Criterion, ctx: &EvalContext<'_>) {
        let threads = criterion.threads();
        let len = self.tiles.len();
        if threads.saturating_mul(self.config.min_tiles_per_thread) < len {
            partition(self.tiles.as_mut_slice(), threads)
                .into_par_iter()
                .for_each(|tiles| score_tiles(criterion, ctx, tiles));
        } else {
            score_tiles(criterion, ctx, self.tiles.as_mut_slice());
        }
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.selected_score = 0.0;
    }
}

// ============================================================================
// Level 4 - Per-tile scoring
// ============================================================================

/// Accumulate one criterion's contribution into each tile. A failing or
/// non-finite evaluation leaves that tile untouched.
fn score_tiles(criterion: &dyn Criterion, ctx: &EvalContext<'_>, tiles: &mut [TileScore]) {
    for tile in tiles {
        let current: &TileScore = tile;
        match guarded(|| criterion.evaluate(ctx, current)) {
            Ok(contribution) if contribution.is_finite() => tile.apply(&contribution),
            Ok(_) => {
                let e = RuleError::NonFinite { what: "contribution", tile: tile.tile };
                tracing::warn!(criterion = ?criterion.kind(), error = %e, "tile skipped");
            }
            Err(e) => {
                tracing::warn!(criterion = ?criterion.kind(), tile = %tile.tile, error = %e, "tile evaluation failed");
            }
        }
    }
}

/// `parts` contiguous slices whose lengths differ by at most one, longer
/// ones first
fn partition<T>(mut items: &mut [T], parts: usize) -> Vec<&mut [T]> {
    let parts = parts.clamp(1, items.len().max(1));
    let (base, extra) = (items.len() / parts, items.len() % parts);
    let mut out = Vec::with_capacity(parts);
    for i in 0..parts {
        let size = base + usize::from(i < extra);
        let (head, tail) = std::mem::take(&mut items).split_at_mut(size);
        out.push(head);
        items = tail;
    }
    out
}

/// Run a rule, turning a panic into a `RuleError` so one broken rule
/// cannot abort the whole evaluation
fn guarded<T>(rule: impl FnOnce() -> Result<T, RuleError>) -> Result<T, RuleError> {
    match panic::catch_unwind(AssertUnwindSafe(rule)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(RuleError::Panicked(message))
        }
    }
}
