//! Error types for the match simulation.
//!
//! Two families exist. [`CommandError`] covers player commands issued in the
//! wrong phase or with bad arguments; they are rejected without touching
//! state. [`ConfigError`] covers data that references something unknown; the
//! affected spawn or skill attachment is skipped and the match keeps running.

use thiserror::Error;

use crate::phase::MatchPhase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum GameError {
    /// A player command was rejected.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Game data could not be loaded or resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A rejected player command. State is unchanged when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Command issued outside the phase that accepts it.
    #[error("'{command}' is not accepted during {phase}")]
    WrongPhase {
        /// Command name.
        command: &'static str,
        /// Phase the match was in.
        phase: MatchPhase,
    },

    /// Passive id not present in the game data.
    #[error("Unknown passive: {0}")]
    UnknownPassive(String),

    /// Unit archetype id not present in the game data.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Roster already holds the maximum number of members.
    #[error("Roster is full ({cap} members)")]
    RosterFull {
        /// Roster size limit.
        cap: usize,
    },

    /// Roster has no members.
    #[error("Roster is empty; select at least one character")]
    EmptyRoster,

    /// Archetype was not selected for the roster.
    #[error("{0} is not in the roster")]
    NotInRoster(String),

    /// Archetype already has a unit on the field.
    #[error("{0} has already been placed")]
    AlreadyPlaced(String),

    /// Placement outside the playable field.
    #[error("Position ({x}, {y}) is outside the field")]
    OutOfBounds {
        /// Requested x.
        x: f64,
        /// Requested y.
        y: f64,
    },

    /// Battle requested before every roster slot was placed.
    #[error("Only {placed} of {required} roster members are placed")]
    IncompletePlacement {
        /// Units on the field.
        placed: usize,
        /// Roster size.
        required: usize,
    },
}

/// A fault in game data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// RON content failed to parse.
    #[error("Failed to parse game data: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A unit archetype lists a skill that does not exist.
    #[error("Archetype '{owner}' references unknown skill '{skill}'")]
    UnknownSkill {
        /// Archetype id.
        owner: String,
        /// Missing skill id.
        skill: String,
    },

    /// A unit archetype id could not be resolved.
    #[error("Unknown unit archetype '{0}'")]
    UnknownUnit(String),

    /// A wave references an attacker archetype that does not exist.
    #[error("Unknown attacker archetype '{0}'")]
    UnknownAttacker(String),

    /// An area-denial skill's speed multiplier is outside (0, 1].
    #[error("Skill '{skill}' has slow {slow}, expected a multiplier in (0, 1]")]
    InvalidSlow {
        /// Skill id.
        skill: String,
        /// Offending multiplier.
        slow: f64,
    },

    /// A behavior policy names a skill the archetype does not own.
    #[error("Archetype '{owner}' policy references skill '{skill}' it does not own")]
    PolicySkillMissing {
        /// Archetype id.
        owner: String,
        /// Skill id.
        skill: String,
    },
}
