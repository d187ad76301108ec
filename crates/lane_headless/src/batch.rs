//! Batch runner for multi-seed statistics and determinism checks.
//!
//! Runs the same scenario across many spawn seeds in parallel using rayon.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::protocol::GameResult;
use crate::runner::{autoplay, MatchSummary};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to run.
    pub game_count: u32,
    /// First seed; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Maximum parallel matches (0 = use rayon default).
    pub parallel_games: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            parallel_games: 0,
        }
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches completed.
    pub games: u32,
    /// Victories.
    pub victories: u32,
    /// Defeats.
    pub defeats: u32,
    /// Matches stopped by the tick limit.
    pub timeouts: u32,
    /// Average battle ticks.
    pub avg_ticks: f64,
    /// Average final points.
    pub avg_points: f64,
    /// Average waves cleared.
    pub avg_waves_cleared: f64,
}

impl BatchSummary {
    /// Summarize a set of matches.
    pub fn from_games(games: &[MatchSummary]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let n = games.len() as f64;
        let count =
            |result: GameResult| games.iter().filter(|g| g.result == result).count() as u32;
        Self {
            games: games.len() as u32,
            victories: count(GameResult::Victory),
            defeats: count(GameResult::Defeat),
            timeouts: count(GameResult::Timeout),
            avg_ticks: games.iter().map(|g| g.ticks as f64).sum::<f64>() / n,
            avg_points: games.iter().map(|g| f64::from(g.points)).sum::<f64>() / n,
            avg_waves_cleared: games.iter().map(|g| g.waves_cleared as f64).sum::<f64>() / n,
        }
    }

    /// Fraction of matches won.
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        f64::from(self.victories) / f64::from(self.games)
    }
}

/// Everything a batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// Batch configuration.
    pub config: BatchConfig,
    /// Per-match results, in seed order.
    pub games: Vec<MatchSummary>,
    /// Aggregates.
    pub summary: BatchSummary,
    /// Wall-clock duration.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Write the results as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::from)?;
        Ok(())
    }
}

/// Run `scenario` once per seed in parallel.
///
/// A seed whose setup is rejected fails the whole batch, since every seed
/// shares the same setup.
pub fn run_batch(
    scenario: &Scenario,
    config: BatchConfig,
) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let games = (0..config.game_count)
        .into_par_iter()
        .map(|i| autoplay(&scenario.with_seed(config.seed_start.wrapping_add(u64::from(i)))))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        games = games.len(),
        win_rate = summary.win_rate(),
        duration_seconds,
        "Batch complete"
    );

    Ok(BatchResults {
        scenario: scenario.name.clone(),
        config,
        games,
        summary,
        duration_seconds,
    })
}

/// Result of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run agreed.
    pub deterministic: bool,
}

/// Auto-play `scenario` `runs` times in parallel and compare final hashes.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<VerifyReport, ScenarioError> {
    let hashes = (0..runs)
        .into_par_iter()
        .map(|_| autoplay(scenario).map(|s| s.final_hash))
        .collect::<Result<Vec<_>, _>>()?;

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(?hashes, "Runs diverged");
    }
    Ok(VerifyReport {
        hashes,
        deterministic,
    })
}
