//! Unit archetype definitions.

use serde::{Deserialize, Serialize};

use crate::components::Facing;
use crate::math::{fixed_serde, Fixed};

/// Declarative behavior policy, with skills referenced by id.
///
/// Resolved into a [`crate::behavior::BehaviorPolicy`] when a unit is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PolicyData {
    /// First usable skill in list order.
    #[default]
    Standard,
    /// Stack on passive hits, burst with the manual-trigger skill.
    StackingBurst {
        /// Stacks needed to fire.
        threshold: u32,
        /// Maximum stored stacks.
        cap: u32,
    },
    /// Prefer `primaries`, use `fallback` only when none is usable.
    ConditionalFallback {
        /// Skill ids tried first, in order.
        primaries: Vec<String>,
        /// Skill id used as last resort.
        fallback: String,
    },
}

/// Data-driven unit archetype.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: "MAGE",
///     name: "Mage",
///     hp: 80.0,
///     attack: 5.0,
///     magic_attack: 25.0,
///     physical_defense: 5.0,
///     magic_defense: 20.0,
///     attack_range: 200.0,
///     attack_speed: 60.0,
///     skills: ["fireball"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Archetype id used by roster and placement commands.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub hp: Fixed,

    /// Physical attack.
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,

    /// Magic attack.
    #[serde(with = "fixed_serde")]
    pub magic_attack: Fixed,

    /// Physical defense.
    #[serde(with = "fixed_serde")]
    pub physical_defense: Fixed,

    /// Magic defense.
    #[serde(with = "fixed_serde")]
    pub magic_defense: Fixed,

    /// Passive attack reach.
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,

    /// Passive attack cadence; the cooldown is `120 / attack_speed` seconds.
    #[serde(with = "fixed_serde")]
    pub attack_speed: Fixed,

    /// Owned skill ids in priority order.
    #[serde(default)]
    pub skills: Vec<String>,

    /// Skill selection policy.
    #[serde(default)]
    pub policy: PolicyData,

    /// Forward direction for line skills.
    #[serde(default)]
    pub facing: Facing,
}
