//! Decide command - evaluate one unit on a scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: evaluate_unit(), report_decision()
//! - Level 3: best_tiles()
//! - Level 4: formatting (see report.rs)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use skirmish_core::{
    Agent, Battlefield, CriterionRegistry, EngineConfig, Evaluation, TileScore, UnitId, World,
};

use crate::report::{outcome, print_json, ActionRecord, TileRecord};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct DecideArgs {
    /// Scenario JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Unit to evaluate
    #[arg(long)]
    pub unit: u32,

    /// Number of best tiles to list
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Everything one decision produced
#[derive(Serialize)]
struct Decision {
    unit: u32,
    outcome: String,
    score: Option<f32>,
    action: Option<ActionRecord>,
    tiles: Vec<TileRecord>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run decide command
pub fn run(args: DecideArgs, engine: EngineConfig) -> Result<()> {
    let world = Battlefield::load(&args.scenario)?;
    tracing::info!("Loaded scenario '{}' ({} units)", world.name(), world.units().len());

    let decision = evaluate_unit(&world, UnitId(args.unit), engine, args.top)?;
    report_decision(&decision, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn evaluate_unit(world: &Battlefield, id: UnitId, engine: EngineConfig, top: usize) -> Result<Decision> {
    let unit = world
        .unit(id)
        .with_context(|| format!("Unit {} is not in the scenario", id))?;

    let mut agent = Agent::new(unit, Arc::new(CriterionRegistry::with_builtins()), Arc::new(engine));
    let evaluation = agent.evaluate(world);
    let (label, score) = outcome(&evaluation);
    tracing::info!("Unit {}: {}", id, label);

    let action = match evaluation {
        Evaluation::Ready { .. } => agent.execute().as_ref().map(ActionRecord::from),
        _ => None,
    };

    Ok(Decision {
        unit: id.0,
        outcome: label,
        score,
        action,
        tiles: best_tiles(agent.tiles().iter(), top),
    })
}

fn report_decision(decision: &Decision, json: bool) -> Result<()> {
    if json {
        return print_json(decision);
    }

    println!("\n=== Decision for unit #{} ===", decision.unit);
    match decision.score {
        Some(score) => println!("Outcome: {} (score {:.2})", decision.outcome, score),
        None => println!("Outcome: {}", decision.outcome),
    }
    if let Some(action) = &decision.action {
        print!("Action:  {} -> {}", action.kind, action.tile);
        if let Some(target) = action.target {
            print!(" targeting #{}", target);
        }
        println!();
    }

    if !decision.tiles.is_empty() {
        println!("\nBest tiles:");
        for t in &decision.tiles {
            println!(
                "  {:>10}  final {:>8.2}  utility {:>6.2}  safety {:>6.2}  distance {:>5.2}",
                t.tile.to_string(),
                t.final_score,
                t.utility,
                t.safety,
                t.distance
            );
        }
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// The `top` tiles by final score, first seen first among equals
fn best_tiles<'a>(tiles: impl Iterator<Item = &'a TileScore>, top: usize) -> Vec<TileRecord> {
    let mut ranked: Vec<&TileScore> = tiles.collect();
    ranked.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    ranked.into_iter().take(top).map(TileRecord::from).collect()
}
