//! Faction turn loop - evaluate every agent, act with the best one, repeat
//!
//! Level 1 / Level 2 - Orchestration and phases

use std::sync::Arc;

use rayon::prelude::*;

use skirmish_core::{
    Action, Agent, AgentState, Battlefield, CriterionRegistry, EngineConfig, Evaluation, FactionId,
    RuleError, World,
};

use crate::config::FactionConfig;

/// What happened during one faction turn
#[derive(Clone, Debug, Default)]
pub struct TurnReport {
    /// Actions applied, in order
    pub actions: Vec<Action>,
    /// Evaluation rounds run (each round evaluates every agent)
    pub rounds: usize,
}

/// The agents of one faction plus their scheduling policy
pub struct Faction {
    id: FactionId,
    agents: Vec<Agent>,
    config: FactionConfig,
}

impl Faction {
    pub fn new(id: FactionId, agents: Vec<Agent>, config: FactionConfig) -> Self {
        Self { id, agents, config }
    }

    /// One agent per living unit of the faction, in scenario order
    pub fn from_battlefield(
        world: &Battlefield,
        id: FactionId,
        criteria: Arc<CriterionRegistry>,
        engine: Arc<EngineConfig>,
        config: FactionConfig,
    ) -> Self {
        let agents = world
            .units()
            .iter()
            .filter(|u| u.faction == id && u.is_alive())
            .map(|u| Agent::new(u, Arc::clone(&criteria), Arc::clone(&engine)))
            .collect();
        Self::new(id, agents, config)
    }

    pub fn id(&self) -> FactionId {
        self.id
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    // ========================================================================
    // Level 1 - Orchestration
    // ========================================================================

    /// Play a full turn: refresh the faction's units, then repeatedly pick
    /// and apply the best action until no agent has one left
    pub fn run_turn(&mut self, world: &mut Battlefield) -> Result<TurnReport, RuleError> {
        world.begin_turn(self.id);
        self.begin_turn();

        let mut report = TurnReport::default();
        while report.actions.len() < self.config.max_actions {
            report.rounds += 1;
            let Some(action) = self.step(world)? else {
                break;
            };
            report.actions.push(action);
        }
        if report.actions.len() >= self.config.max_actions {
            tracing::warn!(faction = self.id.0, actions = report.actions.len(), "action limit reached");
        }

        for agent in &self.agents {
            world.end_turn(agent.unit_id());
        }

        tracing::info!(
            faction = self.id.0,
            actions = report.actions.len(),
            rounds = report.rounds,
            "turn finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Level 2 - Phases
    // ========================================================================

    /// Reset every agent's per-turn counters
    pub fn begin_turn(&mut self) {
        for agent in &mut self.agents {
            agent.begin_turn();
        }
    }

    /// Evaluate every agent against the same world state
    pub fn evaluate_all(&mut self, world: &dyn World) -> Vec<Evaluation> {
        if self.config.parallel {
            self.agents.par_iter_mut().map(|a| a.evaluate(world)).collect()
        } else {
            self.agents.iter_mut().map(|a| a.evaluate(world)).collect()
        }
    }

    /// Index of the ready agent with the strictly greatest adjusted score
    pub fn pick_next(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, agent) in self.agents.iter().enumerate() {
            if agent.state() != AgentState::ReadyToExecute {
                continue;
            }
            let score = agent.selected_score();
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Evaluate, pick one agent, execute and apply its action
    pub fn step(&mut self, world: &mut Battlefield) -> Result<Option<Action>, RuleError> {
        let outcomes = self.evaluate_all(&*world);
        tracing::debug!(faction = self.id.0, ?outcomes, "round evaluated");

        let Some(index) = self.pick_next() else {
            return Ok(None);
        };
        for (i, other) in self.agents.iter_mut().enumerate() {
            if i != index {
                other.pass_over();
            }
        }
        let agent = &mut self.agents[index];
        let score = agent.selected_score();
        let Some(action) = agent.execute() else {
            return Ok(None);
        };

        world.apply(&action)?;
        tracing::info!(
            unit = %action.unit,
            kind = ?action.kind,
            tile = %action.tile,
            score,
            "action applied"
        );
        Ok(Some(action))
    }
}
