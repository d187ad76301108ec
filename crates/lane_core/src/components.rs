//! Entity model: units, attackers, the wall and floating texts.
//!
//! These are plain data records plus lifecycle flags. Behavior that involves
//! more than one entity lives in [`crate::systems`], [`crate::skills`] and
//! [`crate::fields`].

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorPolicy;
use crate::combat::Damageable;
use crate::math::{Fixed, Vec2Fixed, TICK_RATE};
use crate::skills::Skill;

/// Unique identifier for units and attackers. Assigned in creation order.
pub type EntityId = u64;

/// How a hit is mitigated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DamageType {
    /// Reduced by physical defense.
    #[default]
    Physical,
    /// Reduced by magic defense.
    Magic,
}

/// Direction a unit faces along the lane.
///
/// Attackers enter from the left edge, so units face left by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    /// Toward decreasing x.
    #[default]
    Left,
    /// Toward increasing x.
    Right,
}

impl Facing {
    /// +1 or -1 along the x axis.
    #[must_use]
    pub fn sign(self) -> Fixed {
        match self {
            Facing::Left => -Fixed::ONE,
            Facing::Right => Fixed::ONE,
        }
    }
}

/// Hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    /// Current hit points. May go negative internally.
    pub current: Fixed,
    /// Maximum hit points.
    pub max: Fixed,
}

impl Health {
    /// Full health at `max`.
    #[must_use]
    pub const fn new(max: Fixed) -> Self {
        Self { current: max, max }
    }

    /// Whether hit points are exhausted.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= Fixed::ZERO
    }

    /// Hit points clamped at zero, for display.
    #[must_use]
    pub fn display(&self) -> Fixed {
        self.current.max(Fixed::ZERO)
    }
}

/// Physical and magic defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Defenses {
    /// Subtracted from physical hits.
    pub physical: Fixed,
    /// Subtracted from magic hits.
    pub magic: Fixed,
}

impl Defenses {
    /// The defense stat that mitigates `damage_type`.
    #[must_use]
    pub fn against(&self, damage_type: DamageType) -> Fixed {
        match damage_type {
            DamageType::Physical => self.physical,
            DamageType::Magic => self.magic,
        }
    }
}

/// Temporary damage absorption layered above hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shield {
    /// Remaining absorption.
    pub hp: Fixed,
    /// Ticks until the shield lapses.
    pub remaining: u32,
}

impl Shield {
    /// Whether any absorption is left.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.hp > Fixed::ZERO
    }
}

/// A player-deployed combatant.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Entity id.
    pub id: EntityId,
    /// Archetype id from game data.
    pub archetype: String,
    /// Display name.
    pub name: String,
    /// Hit points.
    pub health: Health,
    /// Physical attack.
    pub attack: Fixed,
    /// Magic attack.
    pub magic_attack: Fixed,
    /// Physical and magic defense.
    pub defenses: Defenses,
    /// Reach of the passive attack.
    pub attack_range: Fixed,
    /// Passive attack cadence; see [`Unit::passive_cooldown_ticks`].
    pub attack_speed: Fixed,
    /// Field position (entity centre).
    pub position: Vec2Fixed,
    /// Forward axis for line skills and rectangular fields.
    pub facing: Facing,
    /// Cleared once on death, never set again for the encounter.
    pub alive: bool,
    /// Absorption buffer from support skills.
    pub shield: Shield,
    /// Ticks until the next passive attack.
    pub attack_cooldown: u32,
    /// Ticks until any skill may fire again.
    pub skill_cooldown: u32,
    /// Owned skills, in priority order.
    pub skills: Vec<Skill>,
    /// Skill selection policy and its per-unit state.
    pub policy: BehaviorPolicy,
}

impl Unit {
    /// The stronger of the two attack stats and the damage type it deals.
    ///
    /// Physical wins ties.
    #[must_use]
    pub fn dominant_attack(&self) -> (Fixed, DamageType) {
        if self.attack >= self.magic_attack {
            (self.attack, DamageType::Physical)
        } else {
            (self.magic_attack, DamageType::Magic)
        }
    }

    /// Passive attack cooldown: `120 / attack_speed` seconds, rounded up to
    /// whole ticks.
    #[must_use]
    pub fn passive_cooldown_ticks(&self) -> u32 {
        if self.attack_speed <= Fixed::ZERO {
            return u32::MAX;
        }
        let seconds = Fixed::from_num(120).saturating_div(self.attack_speed);
        let ticks = seconds.saturating_mul(Fixed::from_num(TICK_RATE)).ceil();
        ticks.to_num::<u32>()
    }

    /// Whether the unit can act and be targeted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.alive && !self.health.is_depleted()
    }
}

impl Damageable for Unit {
    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn shield_mut(&mut self) -> Option<&mut Shield> {
        Some(&mut self.shield)
    }

    fn anchor(&self) -> Vec2Fixed {
        self.position
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn on_depleted(&mut self) {
        self.alive = false;
    }
}

/// A hostile entity advancing toward units or the wall.
#[derive(Debug, Clone, PartialEq)]
pub struct Attacker {
    /// Entity id.
    pub id: EntityId,
    /// Archetype id from game data.
    pub archetype: String,
    /// Display name.
    pub name: String,
    /// Hit points.
    pub health: Health,
    /// Flat damage per hit before mitigation.
    pub attack: Fixed,
    /// Current speed; always `original_speed * active slow`.
    pub speed: Fixed,
    /// Unmodified speed.
    pub original_speed: Fixed,
    /// Field position (entity centre).
    pub position: Vec2Fixed,
    /// Physical and magic defense.
    pub defenses: Defenses,
    /// Damage type of this attacker's hits.
    pub attack_type: DamageType,
    /// Ticks until the next hit.
    pub attack_cooldown: u32,
    /// Ticks between hits.
    pub attack_interval: u32,
    /// Points awarded on defeat.
    pub reward: u32,
}

impl Attacker {
    /// Default ticks between attacker hits.
    pub const DEFAULT_ATTACK_INTERVAL: u32 = TICK_RATE;

    /// Whether the attacker still has hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }

    /// Apply a slow multiplier to the original speed. Writes only on change.
    pub fn apply_slow(&mut self, multiplier: Fixed) {
        let slowed = self.original_speed * multiplier;
        if self.speed != slowed {
            self.speed = slowed;
        }
    }

    /// Return to the unmodified speed. Writes only on change.
    pub fn restore_speed(&mut self) {
        if self.speed != self.original_speed {
            self.speed = self.original_speed;
        }
    }
}

impl Damageable for Attacker {
    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn anchor(&self) -> Vec2Fixed {
        self.position
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// The defended objective. Its depletion ends the match in defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall {
    /// Hit points.
    pub health: Health,
    /// Fixed position; attackers measure reach along x only.
    pub position: Vec2Fixed,
}

impl Wall {
    /// Wall with full health at `position`.
    #[must_use]
    pub fn new(max_hp: Fixed, position: Vec2Fixed) -> Self {
        Self {
            health: Health::new(max_hp),
            position,
        }
    }

    /// Whether the wall has fallen.
    #[must_use]
    pub fn is_breached(&self) -> bool {
        self.health.is_depleted()
    }
}

impl Damageable for Wall {
    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn anchor(&self) -> Vec2Fixed {
        self.position
    }

    fn label(&self) -> &str {
        "Wall"
    }
}

/// Damage number emitted whenever an entity loses hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingText {
    /// Hit points lost.
    pub value: Fixed,
    /// Current position; drifts upward.
    pub position: Vec2Fixed,
    /// Remaining ticks before removal.
    pub life: u32,
}

impl FloatingText {
    /// Ticks a floating text stays visible.
    pub const LIFETIME: u32 = TICK_RATE;

    /// New text at `position` with a full lifetime.
    #[must_use]
    pub fn new(value: Fixed, position: Vec2Fixed) -> Self {
        Self {
            value,
            position,
            life: Self::LIFETIME,
        }
    }

    /// Drift upward half a unit and age one tick.
    pub fn tick(&mut self) {
        self.position.y -= Fixed::from_num(0.5);
        self.life = self.life.saturating_sub(1);
    }

    /// Whether the text should be removed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.life == 0
    }
}
