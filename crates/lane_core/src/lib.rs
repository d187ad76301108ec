//! # Lane Core
//!
//! Deterministic combat core for a lane-defense game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (spawns use a seeded RNG)
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and scripted matches
//! - Replaying a match from its command list and seed
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`components`] - Units, attackers, the wall and floating texts
//! - [`combat`] - Mitigation and the shield-aware damage pipeline
//! - [`skills`] - Skill definitions, targeting and execution
//! - [`behavior`] - Per-unit skill selection policies
//! - [`fields`] - Persistent area-denial zones
//! - [`systems`] - Per-tick unit, attacker and field updates
//! - [`scheduler`] - Wave spawn timing
//! - [`phase`] - Match phases and roster bookkeeping
//! - [`simulation`] - The [`Match`](simulation::Match) orchestrator
//! - [`data`] - RON-driven content and configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod combat;
pub mod components;
pub mod data;
pub mod error;
pub mod events;
pub mod fields;
pub mod math;
pub mod phase;
pub mod scheduler;
pub mod simulation;
pub mod skills;
pub mod snapshot;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::behavior::BehaviorPolicy;
    pub use crate::components::*;
    pub use crate::data::{GameData, MatchConfig};
    pub use crate::error::{CommandError, ConfigError, GameError, Result};
    pub use crate::events::{LogMessage, MatchEvent, Severity, TickEvents};
    pub use crate::fields::{FieldEffect, Shape};
    pub use crate::math::{Fixed, Vec2Fixed, TICK_RATE};
    pub use crate::phase::MatchPhase;
    pub use crate::simulation::{Match, PlayerCommand};
    pub use crate::skills::{Skill, SkillType, TargetMode};
    pub use crate::snapshot::MatchSnapshot;
}
