//! Epidemic Simulation Runner
//!
//! Builds a model from command-line options and an optional TOML config,
//! runs it, and writes the daily statistics and final population snapshot
//! as JSON.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use epi_core::error::Result;
use epi_core::output::{write_snapshot, write_stats};
use epi_core::{Model, ModelConfig};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "epi_sim")]
#[command(about = "An agent-based respiratory epidemic simulation")]
struct Args {
    /// Number of agents
    #[arg(long, default_value_t = 1000)]
    population: usize,

    /// Number of days to simulate
    #[arg(long, default_value_t = 100)]
    days: u32,

    /// Initially infected agents
    #[arg(long, default_value_t = 5)]
    seeds: usize,

    /// Random seed, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for output files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Also write every transmission to transmissions.jsonl
    #[arg(long)]
    events: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ModelConfig::from_file(path)?,
        None => ModelConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    fs::create_dir_all(&args.output_dir)?;

    let mut model = Model::new(args.population, config)?;
    if args.events {
        model = model.with_event_log(args.output_dir.join("transmissions.jsonl"))?;
    }

    let rows = model.run_simulation(args.days, args.seeds, !args.quiet)?;

    let stats_path = args.output_dir.join("daily_stats.json");
    write_stats(&rows, &stats_path)?;
    info!(path = %stats_path.display(), rows = rows.len(), "wrote daily statistics");

    let snapshot_path = args.output_dir.join("final_snapshot.json");
    write_snapshot(&model.snapshot(), &snapshot_path)?;
    info!(path = %snapshot_path.display(), "wrote final snapshot");

    if let Some(last) = rows.last() {
        let attack_rate = 1.0 - last.susceptible as f64 / model.population_size() as f64;
        info!(
            days = rows.len(),
            transmissions = model.transmission_events().len(),
            dead = last.dead,
            attack_rate,
            "run complete"
        );
    }
    Ok(())
}
