use std::path::PathBuf;

use clap::Parser;

use tractor_sim::config::{ResolvedOutputs, SimConfig};
use tractor_sim::logging::init_logging;
use tractor_sim::runner::SimRunner;

/// Seeded round simulator for the tractor rules engine.
#[derive(Debug, Parser)]
#[command(
    name = "tractor-sim",
    author,
    version,
    about = "Deterministic Tractor round simulator"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "sim/sim.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of rounds to play.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<usize>,

    /// Override the RNG seed for session generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no rounds are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SimConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(rounds) = cli.rounds {
        config.rounds.count = rounds;
    }

    if let Some(seed) = cli.seed {
        config.rounds.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let rounds = config.rounds.count;
    let batch_size = config.rounds.batch_size;

    println!(
        "Loaded configuration '{run_id}' ({rounds} round{}, dealing {batch_size} card{} per batch)",
        if rounds == 1 { "" } else { "s" },
        if batch_size == 1 { "" } else { "s" }
    );

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = SimRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Simulation complete for '{run_id}': {} rounds over {} games → {} rows at {}",
        summary.rounds_played,
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!(
        "Attackers advanced in {} of {} rounds",
        summary.attacker_advances, summary.rounds_played
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
