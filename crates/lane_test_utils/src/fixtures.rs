//! Test fixtures and helpers.
//!
//! Pre-built matches and entities for consistent testing. Everything here
//! draws from the bundled content, so stats match what players see.

use fixed::types::I32F32;
use lane_core::components::{Attacker, Unit};
use lane_core::data::{GameData, MatchConfig};
use lane_core::math::Vec2Fixed;
use lane_core::simulation::Match;

/// Roster used by most multi-unit fixtures: archetype and placement.
pub const DEFAULT_ROSTER: [(&str, i32, i32); 4] = [
    ("MAGE", 620, 200),
    ("ARCHER", 640, 400),
    ("GEOMANCER", 580, 300),
    ("CLERIC", 700, 300),
];

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The bundled game data.
///
/// # Panics
///
/// Panics if the bundled RON fails to parse.
#[must_use]
pub fn builtin_data() -> GameData {
    GameData::builtin().expect("bundled game data parses")
}

/// A unit built from a bundled archetype, placed at `(x, y)`.
///
/// # Panics
///
/// Panics if `archetype` is not bundled.
#[must_use]
pub fn unit(archetype: &str, id: u64, x: i32, y: i32) -> Unit {
    let mut faults = Vec::new();
    let mut unit = builtin_data()
        .build_unit(archetype, &mut faults)
        .expect("bundled archetype");
    unit.id = id;
    unit.position = Vec2Fixed::from_ints(x, y);
    unit
}

/// An attacker built from a bundled archetype, placed at `(x, y)`.
///
/// # Panics
///
/// Panics if `archetype` is not bundled.
#[must_use]
pub fn attacker(archetype: &str, id: u64, x: i32, y: i32) -> Attacker {
    builtin_data()
        .build_attacker(archetype, id, Vec2Fixed::from_ints(x, y))
        .expect("bundled attacker")
}

/// A match with `roster` placed, in placement phase, using `data` and `config`.
///
/// # Panics
///
/// Panics if any setup command is rejected.
#[must_use]
pub fn placed_match_with(
    config: MatchConfig,
    data: GameData,
    passive: &str,
    roster: &[(&str, i32, i32)],
) -> Match {
    let mut game = Match::new(config, data);
    game.select_passive(passive).expect("passive accepted");
    for (archetype, _, _) in roster {
        game.toggle_roster_member(archetype).expect("toggle accepted");
    }
    game.confirm_roster().expect("roster confirmed");
    for (archetype, x, y) in roster {
        game.place_unit(archetype, Vec2Fixed::from_ints(*x, *y))
            .expect("placement accepted");
    }
    game
}

/// A match with `roster` placed and the first wave started.
///
/// # Panics
///
/// Panics if any setup command is rejected.
#[must_use]
pub fn battle_match(config: MatchConfig, passive: &str, roster: &[(&str, i32, i32)]) -> Match {
    let mut game = placed_match_with(config, builtin_data(), passive, roster);
    game.begin_battle().expect("battle started");
    game
}

/// The default roster in battle, seeded with `seed`.
#[must_use]
pub fn default_battle(seed: u64) -> Match {
    battle_match(
        MatchConfig {
            seed,
            ..MatchConfig::default()
        },
        "ATTACK_BOOST",
        &DEFAULT_ROSTER,
    )
}
