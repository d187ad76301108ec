//! Scenario loading and configuration.
//!
//! Scenarios describe a scripted match setup for headless runs: the match
//! configuration, the passive, where each roster member stands, and a tick
//! limit. Content defaults to the bundled data; a scenario may embed its own.

use std::path::Path;

use lane_core::data::{GameData, MatchConfig};
use lane_core::error::{CommandError, ConfigError};
use lane_core::math::Vec2Fixed;
use lane_core::simulation::{coordinate, Match, PlayerCommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Bundled content could not be loaded.
    #[error(transparent)]
    Content(#[from] ConfigError),
    /// A setup command was rejected.
    #[error("Scenario setup rejected: {0}")]
    Rejected(#[from] CommandError),
}

/// Where one roster member stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Archetype id.
    pub archetype: String,
    /// Field x.
    pub x: f64,
    /// Field y.
    pub y: f64,
}

impl Placement {
    /// Create a placement.
    pub fn new(archetype: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            archetype: archetype.into(),
            x,
            y,
        }
    }

    /// Position in simulation coordinates.
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::new(coordinate(self.x), coordinate(self.y))
    }
}

fn default_max_ticks() -> u64 {
    // 30 minutes at 60 tps
    108_000
}

/// A complete scenario configuration.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Mage line",
///     passive: "ATTACK_BOOST",
///     placements: [
///         Placement(archetype: "MAGE", x: 600.0, y: 200.0),
///         Placement(archetype: "CLERIC", x: 700.0, y: 300.0),
///     ],
///     config: MatchConfig(seed: 42),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Match configuration.
    #[serde(default)]
    pub config: MatchConfig,
    /// Passive id.
    pub passive: String,
    /// Roster, in selection order.
    pub placements: Vec<Placement>,
    /// Tick limit for auto-play.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Content override; the bundled data when absent.
    #[serde(default)]
    pub data: Option<GameData>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::default_defense()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A balanced four-unit defense against the bundled waves.
    #[must_use]
    pub fn default_defense() -> Self {
        Self {
            name: "Default Defense".to_string(),
            description: "Mixed roster holding the lane in front of the wall".to_string(),
            config: MatchConfig::default(),
            passive: "ATTACK_BOOST".to_string(),
            placements: vec![
                Placement::new("MAGE", 620.0, 200.0),
                Placement::new("ARCHER", 640.0, 400.0),
                Placement::new("GEOMANCER", 580.0, 300.0),
                Placement::new("CLERIC", 700.0, 300.0),
            ],
            max_ticks: default_max_ticks(),
            data: None,
        }
    }

    /// The same scenario with a different spawn seed.
    #[must_use]
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut scenario = self.clone();
        scenario.config.seed = seed;
        scenario
    }

    /// Setup commands that bring a fresh match to its first battle.
    pub fn commands(&self) -> Vec<PlayerCommand> {
        let mut commands = vec![PlayerCommand::SelectPassive(self.passive.clone())];
        commands.extend(
            self.placements
                .iter()
                .map(|p| PlayerCommand::ToggleRosterMember(p.archetype.clone())),
        );
        commands.push(PlayerCommand::ConfirmRoster);
        commands.extend(self.placements.iter().map(|p| PlayerCommand::PlaceUnit {
            archetype: p.archetype.clone(),
            position: p.position(),
        }));
        commands.push(PlayerCommand::BeginBattle);
        commands
    }

    /// A match in passive selection with this scenario's config and content.
    pub fn new_match(&self) -> Result<Match, ScenarioError> {
        let data = match &self.data {
            Some(data) => data.clone(),
            None => GameData::builtin()?,
        };
        Ok(Match::new(self.config.clone(), data))
    }

    /// A match with every setup command applied, in battle.
    pub fn build_match(&self) -> Result<Match, ScenarioError> {
        let mut game = self.new_match()?;
        for command in self.commands() {
            game.apply(command)?;
        }
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_core::phase::MatchPhase;
    use std::io::Write;

    #[test]
    fn test_default_scenario_builds_battle() {
        let scenario = Scenario::default();
        let game = scenario.build_match().unwrap();
        assert_eq!(game.phase(), MatchPhase::Battle);
        assert_eq!(game.units().len(), 4);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Solo",
                passive: "HP_BOOST",
                placements: [Placement(archetype: "SNIPER", x: 700.0, y: 300.0)],
                config: MatchConfig(seed: 9),
                max_ticks: 600,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Solo");
        assert_eq!(scenario.config.seed, 9);
        assert_eq!(scenario.config.wall_hp, lane_core::math::Fixed::from_num(2000));
        assert_eq!(scenario.max_ticks, 600);
        assert!(scenario.data.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"Scenario(name: "File", passive: "COOLDOWN_REDUCTION", placements: [Placement(archetype: "MAGE", x: 600.0, y: 300.0)])"#
        )
        .unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.passive, "COOLDOWN_REDUCTION");
        assert_eq!(scenario.max_ticks, 108_000);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Scenario::load(dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_rejected_setup_is_reported() {
        let mut scenario = Scenario::default();
        scenario.placements.push(Placement::new("SNIPER", 100.0, 100.0));
        let err = scenario.build_match().unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Rejected(CommandError::RosterFull { cap: 4 })
        ));
    }

    #[test]
    fn test_commands_walk_every_phase() {
        let commands = Scenario::default().commands();
        assert_eq!(
            commands.first(),
            Some(&PlayerCommand::SelectPassive("ATTACK_BOOST".to_string()))
        );
        assert_eq!(commands.last(), Some(&PlayerCommand::BeginBattle));
        assert_eq!(commands.len(), 1 + 4 + 1 + 4 + 1);
    }

    #[test]
    fn test_bundled_scenarios_build() {
        for ron in [
            include_str!("../../../scenarios/default.ron"),
            include_str!("../../../scenarios/frontline.ron"),
        ] {
            let scenario = Scenario::from_ron_str(ron).unwrap();
            let game = scenario.build_match().unwrap();
            assert_eq!(game.phase(), MatchPhase::Battle, "{}", scenario.name);
        }
    }
}
