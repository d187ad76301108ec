//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical commands and seed.
//!
//! # Testing Strategy
//!
//! A match must replay exactly from its command list and seed. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`lane_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entities live in ordered `Vec`s and roster state in ordered sets.
//!
//! - **System randomness**: Spawn positions and archetype picks come from the
//!   scheduler's seeded `ChaCha8Rng`.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (targeting, fields, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full matches are reproducible
//! 4. **Parallel tests**: Running N matches on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use lane_core::simulation::{Match, PlayerCommand};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use lane_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a match twice from the same setup and compare final hashes.
pub fn verify_match_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Match,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |game| {
            game.tick();
        },
        Match::state_hash,
    )
    .is_deterministic
}

/// Run N matches on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under different thread
/// scheduling or memory layout.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_matches: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Match + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..num_ticks {
                        game.tick();
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Match,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.tick();
        second.tick();

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Rebuild a match from its command list and compare with the original.
///
/// Applies `commands` to a fresh match from `new_match`, runs `num_ticks`,
/// and checks the hash against `expected`.
pub fn verify_command_replay<F>(
    new_match: F,
    commands: &[PlayerCommand],
    num_ticks: u64,
    expected: u64,
) -> bool
where
    F: Fn() -> Match,
{
    let mut game = new_match();
    for command in commands {
        if game.apply(command.clone()).is_err() {
            return false;
        }
    }
    for _ in 0..num_ticks {
        game.tick();
    }
    game.state_hash() == expected
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for combat properties.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of damage, shields, cooldowns and fields.
pub mod strategies {
    use lane_core::data::SpawnSegment;
    use lane_core::math::{Fixed, Vec2Fixed};
    use proptest::prelude::*;

    /// Generate a non-negative stat with two decimal places.
    ///
    /// Range: 0 to 500
    pub fn arb_stat() -> impl Strategy<Value = Fixed> {
        (0i32..50_000i32).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(100))
    }

    /// Generate a damage amount (1-500).
    pub fn arb_damage() -> impl Strategy<Value = Fixed> {
        (1i32..500i32).prop_map(Fixed::from_num)
    }

    /// Generate a shield amount (0-200).
    pub fn arb_shield() -> impl Strategy<Value = Fixed> {
        (0i32..200i32).prop_map(Fixed::from_num)
    }

    /// Generate a position on the default 800x600 field.
    pub fn arb_field_position() -> impl Strategy<Value = Vec2Fixed> {
        (0i32..=800i32, 0i32..=600i32).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Generate a field radius (10-200).
    pub fn arb_radius() -> impl Strategy<Value = Fixed> {
        (10i32..200i32).prop_map(Fixed::from_num)
    }

    /// Generate a cooldown in seconds with one decimal place (0.1-20.0).
    pub fn arb_cooldown_secs() -> impl Strategy<Value = Fixed> {
        (1i32..200i32).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(10))
    }

    /// Generate a spawn segment from the bundled attacker archetypes.
    pub fn arb_spawn_segment() -> impl Strategy<Value = SpawnSegment> {
        (
            proptest::sample::subsequence(vec!["BASIC", "FAST", "TANK", "MAGE_ENEMY"], 1..=4),
            0u32..8u32,
            1u32..90u32,
        )
            .prop_map(|(attackers, count, interval)| SpawnSegment {
                attackers: attackers.into_iter().map(str::to_string).collect(),
                count,
                interval,
            })
    }

    /// Generate a list of spawn segments.
    pub fn arb_wave(max_segments: usize) -> impl Strategy<Value = Vec<SpawnSegment>> {
        proptest::collection::vec(arb_spawn_segment(), 0..max_segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{builtin_data, default_battle, DEFAULT_ROSTER};
    use lane_core::data::MatchConfig;
    use lane_core::math::Vec2Fixed;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_default_battle_is_deterministic() {
        assert!(verify_match_determinism(|| default_battle(7), 900));
    }

    #[test]
    fn test_no_divergence_in_default_battle() {
        assert_eq!(find_first_divergence(|| default_battle(11), 600), None);
    }

    #[test]
    fn test_parallel_matches_agree() {
        let result = run_parallel_matches(|| default_battle(3), 4, 400);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = default_battle(1);
        let mut b = default_battle(2);
        for _ in 0..200 {
            a.tick();
            b.tick();
        }
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_command_replay_reproduces_hash() {
        let mut commands = vec![
            PlayerCommand::SelectPassive("HP_BOOST".to_string()),
        ];
        for (archetype, _, _) in DEFAULT_ROSTER {
            commands.push(PlayerCommand::ToggleRosterMember(archetype.to_string()));
        }
        commands.push(PlayerCommand::ConfirmRoster);
        for (archetype, x, y) in DEFAULT_ROSTER {
            commands.push(PlayerCommand::PlaceUnit {
                archetype: archetype.to_string(),
                position: Vec2Fixed::from_ints(x, y),
            });
        }
        commands.push(PlayerCommand::BeginBattle);

        let new_match = || Match::new(MatchConfig::default(), builtin_data());
        let mut original = new_match();
        for command in &commands {
            original.apply(command.clone()).expect("valid command");
        }
        for _ in 0..500 {
            original.tick();
        }

        assert!(verify_command_replay(
            new_match,
            &commands,
            500,
            original.state_hash()
        ));
    }
}
