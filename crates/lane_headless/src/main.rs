//! Headless lane-defense runner.
//!
//! This binary runs matches without graphics, controlled via JSON on stdin/stdout.
//! Designed for scripted controllers, CI testing, and seed sweeps.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p lane_headless
//!
//! # Auto-play one scenario and print its summary
//! cargo run -p lane_headless -- simulate --scenario scenarios/default.ron
//!
//! # Run a seed sweep
//! cargo run -p lane_headless -- batch --count 200 --output results/batch.json
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lane_headless::{
    autoplay,
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "lane_headless")]
#[command(about = "Headless lane-defense runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive match
    Run {
        /// Scenario file to load; starts at passive selection when absent
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Auto-play a scenario and print its summary
    Simulate {
        /// Scenario file (default: built-in defense)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario tick limit
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Scenario file (default: built-in defense)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Run a scenario across many seeds
    Batch {
        /// Scenario file (default: built-in defense)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Write full results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let outcome = match cli.command {
        Some(Commands::Run {
            scenario,
            auto_state,
        }) => cmd_run(scenario, auto_state),
        Some(Commands::Simulate {
            scenario,
            max_ticks,
        }) => cmd_simulate(scenario, max_ticks),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario, runs),
        Some(Commands::Batch {
            scenario,
            count,
            seed,
            parallel,
            output,
        }) => cmd_batch(scenario, count, seed, parallel, output),
        // Default: interactive mode
        None => cmd_run(None, false),
    };

    if let Err(e) = outcome {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::default()),
    }
}

/// Run a single interactive match
fn cmd_run(scenario: Option<PathBuf>, auto_state: bool) -> Result<(), ScenarioError> {
    tracing::info!("Starting interactive session");

    // A scenario file brings the match straight to battle
    let game = match scenario {
        Some(path) => Scenario::load(path)?.build_match()?,
        None => Scenario::default().new_match()?,
    };

    let config = HeadlessConfig {
        auto_state_output: auto_state,
    };
    let mut runner = HeadlessRunner::with_config(game, config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    runner.run(stdin.lock(), BufWriter::new(stdout.lock()))?;
    Ok(())
}

fn cmd_simulate(scenario: Option<PathBuf>, max_ticks: Option<u64>) -> Result<(), ScenarioError> {
    let mut scenario = load_scenario(scenario)?;
    if let Some(max_ticks) = max_ticks {
        scenario.max_ticks = max_ticks;
    }

    let summary = autoplay(&scenario)?;
    tracing::info!(
        result = ?summary.result,
        ticks = summary.ticks,
        points = summary.points,
        "Simulation complete"
    );
    println!(
        "{}",
        serde_json::to_string(&summary).map_err(io::Error::from)?
    );
    Ok(())
}

fn cmd_verify(scenario: Option<PathBuf>, runs: u32) -> Result<(), ScenarioError> {
    let scenario = load_scenario(scenario)?;
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    let report = verify_determinism(&scenario, runs)?;
    for (i, hash) in report.hashes.iter().enumerate() {
        println!("Run {}: hash={hash:016x}", i + 1);
    }

    if report.deterministic {
        println!("✓ All {runs} runs produced identical state");
        Ok(())
    } else {
        eprintln!("✗ DETERMINISM FAILURE: runs diverged");
        std::process::exit(1);
    }
}

fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u32,
    seed: u64,
    parallel: u32,
    output: Option<PathBuf>,
) -> Result<(), ScenarioError> {
    let scenario = load_scenario(scenario)?;
    tracing::info!(
        scenario = %scenario.name,
        count,
        seed,
        parallel,
        "Starting batch run"
    );

    let results = run_batch(
        &scenario,
        BatchConfig {
            game_count: count,
            seed_start: seed,
            parallel_games: parallel,
        },
    )?;

    let summary = &results.summary;
    println!("\n=== Batch Results ===");
    println!("Matches: {}", summary.games);
    println!(
        "Victories: {} ({:.1}%)",
        summary.victories,
        summary.win_rate() * 100.0
    );
    println!("Defeats: {}", summary.defeats);
    println!("Timeouts: {}", summary.timeouts);
    println!("Avg ticks: {:.0}", summary.avg_ticks);
    println!("Avg points: {:.1}", summary.avg_points);
    println!("Avg waves cleared: {:.2}", summary.avg_waves_cleared);
    println!("Duration: {:.2}s", results.duration_seconds);

    if let Some(path) = output {
        results.save(&path)?;
        println!("Results saved to: {}", path.display());
    }
    Ok(())
}
