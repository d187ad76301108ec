//! Match phases and the party roster.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Where the match is in its lifecycle.
///
/// ```text
/// PassiveSelection → PartySelection → Placement → Battle ─┬→ Placement
///                                                          ├→ Victory
///                                                          └→ Defeat
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Choose one passive.
    #[default]
    PassiveSelection,
    /// Choose up to four archetypes.
    PartySelection,
    /// Place one unit per roster member.
    Placement,
    /// Combat runs.
    Battle,
    /// All waves cleared. Terminal.
    Victory,
    /// Wall destroyed. Terminal.
    Defeat,
}

impl MatchPhase {
    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PassiveSelection => "passive selection",
            Self::PartySelection => "party selection",
            Self::Placement => "placement",
            Self::Battle => "battle",
            Self::Victory => "victory",
            Self::Defeat => "defeat",
        };
        f.write_str(name)
    }
}

/// What the phase machine should do after a battle tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// Keep fighting.
    Continue,
    /// Wave cleared and more remain.
    NextWave,
    /// Final wave cleared.
    Victory,
    /// Wall destroyed.
    Defeat,
}

/// Decide how a battle tick ends. A destroyed wall wins over a cleared wave.
#[must_use]
pub fn evaluate_battle(wall_breached: bool, wave_cleared: bool, more_waves: bool) -> BattleOutcome {
    if wall_breached {
        BattleOutcome::Defeat
    } else if !wave_cleared {
        BattleOutcome::Continue
    } else if more_waves {
        BattleOutcome::NextWave
    } else {
        BattleOutcome::Victory
    }
}

/// Selected archetypes and which of them have a unit on the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    members: Vec<String>,
    placed: BTreeSet<String>,
    cap: usize,
}

impl Roster {
    /// Empty roster holding at most `cap` members.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            members: Vec::new(),
            placed: BTreeSet::new(),
            cap,
        }
    }

    /// Add `archetype` if absent, remove it if present.
    ///
    /// Returns whether the archetype is a member afterwards.
    pub fn toggle(&mut self, archetype: &str) -> Result<bool, CommandError> {
        if let Some(pos) = self.members.iter().position(|m| m == archetype) {
            self.members.remove(pos);
            self.placed.remove(archetype);
            return Ok(false);
        }
        if self.members.len() >= self.cap {
            return Err(CommandError::RosterFull { cap: self.cap });
        }
        self.members.push(archetype.to_string());
        Ok(true)
    }

    /// Whether `archetype` is selected.
    #[must_use]
    pub fn contains(&self, archetype: &str) -> bool {
        self.members.iter().any(|m| m == archetype)
    }

    /// Check that `archetype` can be placed now.
    pub fn check_placeable(&self, archetype: &str) -> Result<(), CommandError> {
        if !self.contains(archetype) {
            return Err(CommandError::NotInRoster(archetype.to_string()));
        }
        if self.placed.contains(archetype) {
            return Err(CommandError::AlreadyPlaced(archetype.to_string()));
        }
        Ok(())
    }

    /// Record that `archetype` has a unit on the field.
    pub fn mark_placed(&mut self, archetype: &str) {
        self.placed.insert(archetype.to_string());
    }

    /// Forget all placements, keeping the members.
    pub fn clear_placements(&mut self) {
        self.placed.clear();
    }

    /// Check that every member has been placed.
    pub fn check_complete(&self) -> Result<(), CommandError> {
        if self.members.is_empty() {
            return Err(CommandError::EmptyRoster);
        }
        if self.placed.len() < self.members.len() {
            return Err(CommandError::IncompletePlacement {
                placed: self.placed.len(),
                required: self.members.len(),
            });
        }
        Ok(())
    }

    /// Selected archetypes in selection order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Number of selected archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of placed members.
    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defeat_checked_first() {
        assert_eq!(evaluate_battle(true, true, false), BattleOutcome::Defeat);
        assert_eq!(evaluate_battle(true, true, true), BattleOutcome::Defeat);
        assert_eq!(evaluate_battle(false, false, true), BattleOutcome::Continue);
        assert_eq!(evaluate_battle(false, true, true), BattleOutcome::NextWave);
        assert_eq!(evaluate_battle(false, true, false), BattleOutcome::Victory);
    }

    #[test]
    fn test_roster_cap() {
        let mut roster = Roster::new(2);
        assert_eq!(roster.toggle("MAGE"), Ok(true));
        assert_eq!(roster.toggle("ARCHER"), Ok(true));
        assert_eq!(
            roster.toggle("SNIPER"),
            Err(CommandError::RosterFull { cap: 2 })
        );
        assert_eq!(roster.toggle("MAGE"), Ok(false));
        assert_eq!(roster.toggle("SNIPER"), Ok(true));
        assert_eq!(roster.members(), ["ARCHER", "SNIPER"]);
    }

    #[test]
    fn test_placement_checks() {
        let mut roster = Roster::new(4);
        roster.toggle("MAGE").ok();
        roster.toggle("ARCHER").ok();

        assert_eq!(
            roster.check_placeable("SNIPER"),
            Err(CommandError::NotInRoster("SNIPER".to_string()))
        );
        assert!(roster.check_placeable("MAGE").is_ok());
        roster.mark_placed("MAGE");
        assert_eq!(
            roster.check_placeable("MAGE"),
            Err(CommandError::AlreadyPlaced("MAGE".to_string()))
        );
        assert_eq!(
            roster.check_complete(),
            Err(CommandError::IncompletePlacement {
                placed: 1,
                required: 2
            })
        );

        roster.mark_placed("ARCHER");
        assert!(roster.check_complete().is_ok());

        roster.clear_placements();
        assert_eq!(roster.placed_count(), 0);
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(MatchPhase::Victory.is_terminal());
        assert!(MatchPhase::Defeat.is_terminal());
        assert!(!MatchPhase::Battle.is_terminal());
    }
}
