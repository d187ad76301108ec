//! Party-wide passive modifiers.

use serde::{Deserialize, Serialize};

use crate::components::Unit;
use crate::math::{fixed_serde, Fixed};

/// What a passive changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassiveEffect {
    /// Multiply maximum hit points and refill to the new maximum.
    MaxHealth {
        /// Multiplier.
        #[serde(with = "fixed_serde")]
        multiplier: Fixed,
    },
    /// Multiply attack and magic attack.
    Attack {
        /// Multiplier.
        #[serde(with = "fixed_serde")]
        multiplier: Fixed,
    },
    /// Multiply every skill cooldown.
    Cooldown {
        /// Multiplier.
        #[serde(with = "fixed_serde")]
        multiplier: Fixed,
    },
}

/// Data-driven passive definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveData {
    /// Id used by the select-passive command.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Player-facing description.
    #[serde(default)]
    pub description: String,

    /// Stat change.
    pub effect: PassiveEffect,
}

impl PassiveData {
    /// Apply the passive to one unit.
    pub fn apply(&self, unit: &mut Unit) {
        match self.effect {
            PassiveEffect::MaxHealth { multiplier } => {
                unit.health.max = unit.health.max.saturating_mul(multiplier);
                unit.health.current = unit.health.max;
            }
            PassiveEffect::Attack { multiplier } => {
                unit.attack = unit.attack.saturating_mul(multiplier);
                unit.magic_attack = unit.magic_attack.saturating_mul(multiplier);
            }
            PassiveEffect::Cooldown { multiplier } => {
                for skill in &mut unit.skills {
                    skill.scale_cooldown(multiplier);
                }
            }
        }
    }
}
