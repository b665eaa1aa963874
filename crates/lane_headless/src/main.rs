//! Headless lane battle runner.
//!
//! Runs scenarios without graphics and prints JSON reports on stdout.
//! Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run a single match
//! cargo run -p lane_headless -- run --scenario scenarios/skirmish.ron
//!
//! # Run a batch balance test
//! cargo run -p lane_headless -- batch --scenario scenarios/skirmish.ron --count 1000 --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p lane_headless -- verify --seed 12345 --runs 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lane_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_match, MatchOverrides},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "lane_headless")]
#[command(about = "Headless lane battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match and print its report
    Run {
        /// Scenario file to load (defaults to the stock skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the match time limit
        #[arg(long)]
        max_seconds: Option<u32>,

        /// Override the battle seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a batch of matches over consecutive seeds
    Batch {
        /// Scenario file to load (defaults to the stock skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Seed of the first match
        #[arg(long, default_value = "0")]
        seed_start: u64,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Override the match time limit
        #[arg(long)]
        max_seconds: Option<u32>,

        /// Write the full results to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario file to load (defaults to the stock skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the JSON reports, so logs go to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            max_seconds,
            seed,
        } => cmd_run(scenario, MatchOverrides { seed, max_seconds }),
        Commands::Batch {
            scenario,
            count,
            seed_start,
            parallel,
            max_seconds,
            output,
        } => {
            let mut config = BatchConfig::new(count)
                .with_seed(seed_start)
                .with_parallel(parallel);
            config.max_seconds = max_seconds;
            cmd_batch(scenario, config, output)
        }
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(scenario, seed, runs),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::skirmish()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ScenarioError> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{json}");
    Ok(())
}

fn cmd_run(path: Option<PathBuf>, overrides: MatchOverrides) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(path)?;
    let report = run_match(&scenario, overrides)?;
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_batch(
    path: Option<PathBuf>,
    config: BatchConfig,
    output: Option<PathBuf>,
) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(path)?;
    let results = run_batch(&scenario, config);

    for error in &results.errors {
        tracing::warn!(
            index = error.match_index,
            seed = error.seed,
            "Match failed: {}",
            error.message
        );
    }
    if let Some(output) = output {
        results.save(&output)?;
        tracing::info!(path = %output.display(), "Batch results saved");
    }
    print_json(&results.summary)?;

    Ok(if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_verify(path: Option<PathBuf>, seed: u64, runs: u32) -> Result<ExitCode, ScenarioError> {
    let scenario = load_scenario(path)?;
    if verify_determinism(&scenario, seed, runs) {
        tracing::info!(seed, runs, "Determinism verified");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(seed, runs, "Determinism check failed");
        Ok(ExitCode::FAILURE)
    }
}
