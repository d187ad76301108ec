//! Multi-seed trial statistics for headless matches.
//!
//! Runs the same roster against many spawn seeds to see how often it holds
//! the wall. Matches that reach placement between waves are advanced by
//! re-placing the roster at its original positions.

use lane_core::phase::MatchPhase;
use lane_core::simulation::Match;
use tracing::debug;

/// How one trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialOutcome {
    /// Every wave cleared.
    Victory,
    /// The wall fell.
    Defeat,
    /// The tick limit was reached first.
    Timeout,
}

/// Result of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialResult {
    /// Spawn seed.
    pub seed: u64,
    /// How the match ended.
    pub outcome: TrialOutcome,
    /// Battle ticks elapsed.
    pub ticks: u64,
    /// Points at the end.
    pub points: u32,
    /// Waves fully cleared.
    pub waves_cleared: usize,
}

/// Statistics for a set of trials.
#[derive(Debug, Clone, Default)]
pub struct TrialStats {
    /// Total trials run.
    pub total: u32,
    /// Victories.
    pub victories: u32,
    /// Defeats.
    pub defeats: u32,
    /// Timeouts.
    pub timeouts: u32,
    /// Average ticks to resolution.
    pub avg_ticks: f64,
    /// Average points at the end.
    pub avg_points: f64,
}

impl TrialStats {
    /// Summarize a set of results.
    pub fn from_results(results: &[TrialResult]) -> Self {
        let mut stats = Self::default();
        if results.is_empty() {
            return stats;
        }
        for result in results {
            stats.total += 1;
            match result.outcome {
                TrialOutcome::Victory => stats.victories += 1,
                TrialOutcome::Defeat => stats.defeats += 1,
                TrialOutcome::Timeout => stats.timeouts += 1,
            }
        }
        let n = results.len() as f64;
        stats.avg_ticks = results.iter().map(|r| r.ticks as f64).sum::<f64>() / n;
        stats.avg_points = results.iter().map(|r| f64::from(r.points)).sum::<f64>() / n;
        stats
    }

    /// Fraction of trials won (0.0 to 1.0).
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.victories) / f64::from(self.total)
    }
}

/// Play one match to completion or until `max_ticks`.
///
/// Between waves every unit is placed again where it stood at the start of
/// the match.
pub fn run_trial(mut game: Match, seed: u64, max_ticks: u64) -> TrialResult {
    let placements: Vec<_> = game
        .units()
        .iter()
        .map(|u| (u.archetype.clone(), u.position))
        .collect();
    let mut waves_cleared = 0;

    while game.tick_count() < max_ticks {
        match game.phase() {
            MatchPhase::Battle => {
                game.tick();
            }
            MatchPhase::Placement => {
                waves_cleared += 1;
                for (archetype, position) in &placements {
                    let _ = game.place_unit(archetype, *position);
                }
                if game.begin_battle().is_err() {
                    break;
                }
            }
            _ => break,
        }
    }

    let outcome = match game.phase() {
        MatchPhase::Victory => {
            waves_cleared += 1;
            TrialOutcome::Victory
        }
        MatchPhase::Defeat => TrialOutcome::Defeat,
        _ => TrialOutcome::Timeout,
    };
    debug!(seed, ?outcome, ticks = game.tick_count(), "Trial finished");

    TrialResult {
        seed,
        outcome,
        ticks: game.tick_count(),
        points: game.points(),
        waves_cleared,
    }
}

/// Run one trial per seed. `setup` builds a match in battle for a seed.
pub fn run_trials<F>(setup: F, seeds: impl IntoIterator<Item = u64>, max_ticks: u64) -> Vec<TrialResult>
where
    F: Fn(u64) -> Match,
{
    seeds
        .into_iter()
        .map(|seed| run_trial(setup(seed), seed, max_ticks))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{battle_match, default_battle};
    use lane_core::data::MatchConfig;

    #[test]
    fn test_stats_from_results() {
        let results = [
            TrialResult {
                seed: 1,
                outcome: TrialOutcome::Victory,
                ticks: 100,
                points: 200,
                waves_cleared: 3,
            },
            TrialResult {
                seed: 2,
                outcome: TrialOutcome::Defeat,
                ticks: 300,
                points: 100,
                waves_cleared: 1,
            },
        ];
        let stats = TrialStats::from_results(&results);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.victories, 1);
        assert_eq!(stats.defeats, 1);
        assert!((stats.win_rate() - 0.5).abs() < f64::EPSILON);
        assert!((stats.avg_ticks - 200.0).abs() < f64::EPSILON);
        assert!((stats.avg_points - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrialStats::from_results(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.win_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_trial_respects_tick_limit() {
        let result = run_trial(default_battle(5), 5, 30);
        assert_eq!(result.outcome, TrialOutcome::Timeout);
        assert_eq!(result.ticks, 30);
    }

    #[test]
    fn test_undefended_wall_falls() {
        let config = MatchConfig {
            wall_hp: lane_core::math::Fixed::from_num(10),
            ..MatchConfig::default()
        };
        let mut game = battle_match(config, "HP_BOOST", &[("CLERIC", 700, 300)]);
        game.units_mut().clear();

        let result = run_trial(game, 0, 20_000);
        assert_eq!(result.outcome, TrialOutcome::Defeat);
    }

    #[test]
    fn test_trials_are_reproducible() {
        let first = run_trials(default_battle, [1, 2], 600);
        let second = run_trials(default_battle, [1, 2], 600);
        assert_eq!(first, second);
    }
}
