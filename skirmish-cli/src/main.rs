//! SKIRMISH CLI - Command-line interface
//!
//! Commands:
//! - decide: Evaluate one unit and print its chosen action
//! - turn: Play whole faction turns on a scenario
//! - bench: Time agent evaluation on generated scenarios

mod bench;
mod decide;
mod report;
mod turn;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Utility-based tactical AI decision engine")]
struct Cli {
    /// Engine configuration JSON file (defaults apply to missing fields)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Random seed for generated scenarios
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one unit and print its chosen action
    Decide(decide::DecideArgs),
    /// Play faction turns on a scenario
    Turn(turn::TurnArgs),
    /// Benchmark agent evaluation
    Bench(bench::BenchArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = report::load_engine_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Decide(args) => decide::run(args, engine),
        Commands::Turn(args) => turn::run(args, engine),
        Commands::Bench(args) => bench::run(args, engine, cli.seed),
    }
}
