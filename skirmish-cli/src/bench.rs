//! Bench command - time agent evaluation on generated scenarios
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: generate_scenario(), time_rounds(), report_results()
//! - Level 3: random_unit(), free_tile()
//! - Level 4: RNG creation, formatting

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use skirmish_core::{
    Battlefield, CriterionRegistry, EngineConfig, Evaluation, FactionId, Hex, RoleData, Scenario,
    Skill, SkillId, SkillTag, SkillType, Suppression, Unit, UnitId, MAX_BOARD_RADIUS,
};
use skirmish_faction::{Faction, FactionConfig};

use crate::report::print_json;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    /// Units per side
    #[arg(long, default_value = "6")]
    pub units: usize,

    /// Timed evaluation rounds
    #[arg(long, default_value = "20")]
    pub rounds: usize,

    /// Board radius
    #[arg(long, default_value = "8")]
    pub radius: i8,

    /// Evaluate agents one at a time instead of on the thread pool
    #[arg(long)]
    pub sequential: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Timing summary
#[derive(Serialize)]
struct BenchResults {
    agents: usize,
    rounds: usize,
    ready: usize,
    total_ms: f64,
    ms_per_round: f64,
    ms_per_agent: f64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
pub fn run(args: BenchArgs, engine: EngineConfig, seed: Option<u64>) -> Result<()> {
    if !(3..=MAX_BOARD_RADIUS).contains(&args.radius) || args.units == 0 {
        bail!(
            "Need a board radius between 3 and {} and at least one unit per side",
            MAX_BOARD_RADIUS
        );
    }
    let mut rng = create_rng(seed);

    let world = Battlefield::from_scenario(generate_scenario(&args, &mut rng)?)?;
    tracing::info!(
        "Generated {} units on a radius-{} board",
        world.units().len(),
        args.radius
    );

    let config = if args.sequential {
        FactionConfig::sequential()
    } else {
        FactionConfig::default()
    };
    let mut faction = Faction::from_battlefield(
        &world,
        FactionId(0),
        Arc::new(CriterionRegistry::with_builtins()),
        Arc::new(engine),
        config,
    );

    let results = time_rounds(&world, &mut faction, args.rounds);
    report_results(&results, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Two sides facing each other across the board
fn generate_scenario(args: &BenchArgs, rng: &mut ChaCha8Rng) -> Result<Scenario> {
    let mut units = Vec::with_capacity(args.units * 2);
    let mut next_id = 1u32;
    for faction in 0..2u8 {
        for _ in 0..args.units {
            let Some(tile) = free_tile(rng, args.radius, faction, &units) else {
                bail!("No room for {} units per side on a radius-{} board", args.units, args.radius);
            };
            units.push(random_unit(rng, next_id, faction, tile));
            next_id += 1;
        }
    }

    let mut roles = BTreeMap::new();
    roles.insert("line".to_string(), RoleData::default());
    roles.insert(
        "scout".to_string(),
        RoleData {
            prefers_hidden: true,
            may_evade: true,
            ..RoleData::default()
        },
    );

    Ok(Scenario {
        name: "bench".to_string(),
        radius: args.radius,
        roles,
        units,
        cover: Vec::new(),
        concealed: Vec::new(),
        busy: Vec::new(),
        mission_resolving: false,
    })
}

/// Evaluate every agent `rounds` times against an unchanging world
fn time_rounds(world: &Battlefield, faction: &mut Faction, rounds: usize) -> BenchResults {
    let mut total = Duration::ZERO;
    let mut ready = 0;
    for _ in 0..rounds {
        // Iteration counters would otherwise end the turn after 16 rounds
        faction.begin_turn();
        let start = Instant::now();
        let outcomes = faction.evaluate_all(world);
        total += start.elapsed();
        ready += outcomes
            .iter()
            .filter(|o| matches!(o, Evaluation::Ready { .. }))
            .count();
    }

    let agents = faction.agents().len();
    let total_ms = total.as_secs_f64() * 1000.0;
    let ms_per_round = if rounds > 0 { total_ms / rounds as f64 } else { 0.0 };
    BenchResults {
        agents,
        rounds,
        ready,
        total_ms,
        ms_per_round,
        ms_per_agent: if agents > 0 { ms_per_round / agents as f64 } else { 0.0 },
    }
}

fn report_results(results: &BenchResults, json: bool) -> Result<()> {
    if json {
        return print_json(results);
    }
    println!("\n=== Benchmark ===");
    println!("Agents:        {}", results.agents);
    println!("Rounds:        {}", results.rounds);
    println!("Ready results: {}", results.ready);
    println!("Total:         {:.2} ms", results.total_ms);
    println!("Per round:     {:.3} ms", results.ms_per_round);
    println!("Per agent:     {:.3} ms", results.ms_per_agent);
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn random_unit(rng: &mut ChaCha8Rng, id: u32, faction: u8, tile: Hex) -> Unit {
    let max_range = rng.gen_range(3..=6);
    let mut tags = vec![SkillTag::Damage];
    if rng.gen_bool(0.3) {
        tags.push(SkillTag::Suppression);
    }
    Unit {
        id: UnitId(id),
        name: format!("unit-{id}"),
        faction: FactionId(faction),
        role: if rng.gen_bool(0.25) { "scout" } else { "line" }.to_string(),
        tile,
        hitpoints: 10.0,
        max_hitpoints: 10.0,
        action_points: 2,
        max_action_points: 2,
        has_acted: false,
        turn_done: false,
        suppression: Suppression::None,
        stunned: false,
        threat: rng.gen_range(0.2..1.0),
        movement: rng.gen_range(3..=5),
        sight: 10,
        skills: vec![Skill {
            id: SkillId(1),
            skill_type: SkillType::new(format!("rifle-{max_range}")),
            tags,
            min_range: 1,
            max_range,
            ap_cost: 1,
            accuracy: rng.gen_range(0.6..0.9),
            accuracy_falloff: 0.05,
            always_hits: false,
            damage: rng.gen_range(2.0..5.0),
            suppression: 1.0,
            area_radius: 0,
        }],
    }
}

/// Random unoccupied tile on the faction's half of the board
fn free_tile(rng: &mut ChaCha8Rng, radius: i8, faction: u8, units: &[Unit]) -> Option<Hex> {
    const ATTEMPTS: usize = 200;
    for _ in 0..ATTEMPTS {
        let r = match faction {
            0 => rng.gen_range(2..=radius),
            _ => rng.gen_range(-radius..=-2),
        };
        let q = rng.gen_range(-radius..=radius);
        let tile = Hex::new(q, r);
        if tile.within(radius) && units.iter().all(|u| u.tile != tile) {
            return Some(tile);
        }
    }
    None
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
