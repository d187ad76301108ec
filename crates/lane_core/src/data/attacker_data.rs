//! Attacker archetype definitions.

use serde::{Deserialize, Serialize};

use crate::components::{Attacker, DamageType, Defenses, EntityId, Health};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Data-driven attacker archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackerData {
    /// Archetype id referenced by wave segments.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub hp: Fixed,

    /// Flat damage per hit.
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,

    /// Movement per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,

    /// Points awarded on defeat.
    pub reward: u32,

    /// Physical defense.
    #[serde(with = "fixed_serde")]
    pub physical_defense: Fixed,

    /// Magic defense.
    #[serde(with = "fixed_serde")]
    pub magic_defense: Fixed,

    /// Damage type of this attacker's hits.
    #[serde(default)]
    pub attack_type: DamageType,

    /// Ticks between hits.
    #[serde(default = "default_attack_interval")]
    pub attack_interval: u32,
}

const fn default_attack_interval() -> u32 {
    Attacker::DEFAULT_ATTACK_INTERVAL
}

impl AttackerData {
    /// Create a live attacker at `position`.
    #[must_use]
    pub fn spawn(&self, id: EntityId, position: Vec2Fixed) -> Attacker {
        Attacker {
            id,
            archetype: self.id.clone(),
            name: self.name.clone(),
            health: Health::new(self.hp),
            attack: self.attack,
            speed: self.speed,
            original_speed: self.speed,
            position,
            defenses: Defenses {
                physical: self.physical_defense,
                magic: self.magic_defense,
            },
            attack_type: self.attack_type,
            attack_cooldown: 0,
            attack_interval: self.attack_interval,
            reward: self.reward,
        }
    }
}
