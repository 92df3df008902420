//! Turn command - play faction turns on a scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_factions(), play_turns(), report_turns()
//! - Level 3: (delegated to skirmish-faction)
//! - Level 4: formatting (see report.rs)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use skirmish_core::{Battlefield, CriterionRegistry, EngineConfig, FactionId};
use skirmish_faction::{Faction, FactionConfig};

use crate::report::{print_json, ActionRecord};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TurnArgs {
    /// Scenario JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Only play this faction (default: every faction in scenario order)
    #[arg(long)]
    pub faction: Option<u8>,

    /// Number of rounds; each round gives every playing faction one turn
    #[arg(long, default_value = "1")]
    pub rounds: usize,

    /// Evaluate agents one at a time instead of on the thread pool
    #[arg(long)]
    pub sequential: bool,

    /// Write the resulting scenario here
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One faction turn as reported
#[derive(Serialize)]
struct TurnRecord {
    round: usize,
    faction: u8,
    evaluation_rounds: usize,
    actions: Vec<ActionRecord>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run turn command
///
/// 1. Load the scenario
/// 2. Build one scheduler per playing faction
/// 3. Play the requested rounds
/// 4. Report, and save the final state if asked
pub fn run(args: TurnArgs, engine: EngineConfig) -> Result<()> {
    let mut world = Battlefield::load(&args.scenario)?;
    tracing::info!("Loaded scenario '{}' ({} units)", world.name(), world.units().len());

    let mut factions = build_factions(&world, &args, engine)?;
    let turns = play_turns(&mut world, &mut factions, args.rounds)?;

    report_turns(&turns, args.json)?;

    if let Some(path) = &args.output {
        world
            .save(path)
            .with_context(|| format!("Failed to save scenario: {}", path.display()))?;
        tracing::info!("Saved scenario to {}", path.display());
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_factions(world: &Battlefield, args: &TurnArgs, engine: EngineConfig) -> Result<Vec<Faction>> {
    let present = world.factions();
    let ids = match args.faction {
        Some(id) => {
            if !present.contains(&FactionId(id)) {
                bail!("Faction {} has no units in the scenario", id);
            }
            vec![FactionId(id)]
        }
        None => present,
    };

    let criteria = Arc::new(CriterionRegistry::with_builtins());
    let engine = Arc::new(engine);
    let config = if args.sequential {
        FactionConfig::sequential()
    } else {
        FactionConfig::default()
    };

    Ok(ids
        .into_iter()
        .map(|id| Faction::from_battlefield(world, id, Arc::clone(&criteria), Arc::clone(&engine), config.clone()))
        .collect())
}

fn play_turns(world: &mut Battlefield, factions: &mut [Faction], rounds: usize) -> Result<Vec<TurnRecord>> {
    let mut turns = Vec::new();
    for round in 1..=rounds {
        for faction in factions.iter_mut() {
            let report = faction
                .run_turn(world)
                .with_context(|| format!("Faction {} failed in round {}", faction.id().0, round))?;
            tracing::info!(
                "Round {}: faction {} took {} actions",
                round,
                faction.id().0,
                report.actions.len()
            );
            turns.push(TurnRecord {
                round,
                faction: faction.id().0,
                evaluation_rounds: report.rounds,
                actions: report.actions.iter().map(ActionRecord::from).collect(),
            });
        }
    }
    Ok(turns)
}

fn report_turns(turns: &[TurnRecord], json: bool) -> Result<()> {
    if json {
        return print_json(&turns);
    }

    println!("\n=== Turns ===");
    for turn in turns {
        println!(
            "Round {} faction {}: {} actions ({} evaluation rounds)",
            turn.round,
            turn.faction,
            turn.actions.len(),
            turn.evaluation_rounds
        );
        for action in &turn.actions {
            match action.target {
                Some(target) => println!("  #{} {} -> {} targeting #{}", action.unit, action.kind, action.tile, target),
                None => println!("  #{} {} -> {}", action.unit, action.kind, action.tile),
            }
        }
    }
    Ok(())
}
