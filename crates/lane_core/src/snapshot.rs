//! Read-only views of match state for presentation layers.
//!
//! Snapshots convert fixed-point values to `f64` and clamp hit points at
//! zero. Nothing here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::components::{Attacker, EntityId, FloatingText, Unit, Wall};
use crate::events::LogMessage;
use crate::fields::{FieldEffect, Shape};
use crate::math::Fixed;
use crate::phase::MatchPhase;

fn num(value: Fixed) -> f64 {
    value.to_num()
}

/// A skill's cooldown state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    /// Display name.
    pub name: String,
    /// Ticks until ready.
    pub remaining: u32,
}

/// A unit on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Archetype id.
    pub archetype: String,
    /// Display name.
    pub name: String,
    /// Hit points, never negative.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Remaining shield.
    pub shield: f64,
    /// Stored burst stacks.
    pub stacks: u32,
    /// Owned skills.
    pub skills: Vec<SkillSnapshot>,
}

impl From<&Unit> for UnitSnapshot {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            archetype: unit.archetype.clone(),
            name: unit.name.clone(),
            hp: num(unit.health.display()),
            max_hp: num(unit.health.max),
            x: num(unit.position.x),
            y: num(unit.position.y),
            shield: num(unit.shield.hp),
            stacks: unit.policy.stacks(),
            skills: unit
                .skills
                .iter()
                .map(|s| SkillSnapshot {
                    name: s.name.clone(),
                    remaining: s.remaining,
                })
                .collect(),
        }
    }
}

/// An attacker on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackerSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Archetype id.
    pub archetype: String,
    /// Display name.
    pub name: String,
    /// Hit points, never negative.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Current speed.
    pub speed: f64,
}

impl From<&Attacker> for AttackerSnapshot {
    fn from(attacker: &Attacker) -> Self {
        Self {
            id: attacker.id,
            archetype: attacker.archetype.clone(),
            name: attacker.name.clone(),
            hp: num(attacker.health.display()),
            max_hp: num(attacker.health.max),
            x: num(attacker.position.x),
            y: num(attacker.position.y),
            speed: num(attacker.speed),
        }
    }
}

/// The wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSnapshot {
    /// Hit points, never negative.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
}

impl From<&Wall> for WallSnapshot {
    fn from(wall: &Wall) -> Self {
        Self {
            hp: num(wall.health.display()),
            max_hp: num(wall.health.max),
            x: num(wall.position.x),
            y: num(wall.position.y),
        }
    }
}

/// A live field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// Casting unit id.
    pub caster: EntityId,
    /// Skill name.
    pub skill: String,
    /// Anchor x.
    pub x: f64,
    /// Anchor y.
    pub y: f64,
    /// Geometry.
    pub shape: Shape,
    /// Ticks left.
    pub remaining: u32,
}

impl From<&FieldEffect> for FieldSnapshot {
    fn from(field: &FieldEffect) -> Self {
        Self {
            caster: field.caster,
            skill: field.skill_name.clone(),
            x: num(field.anchor.x),
            y: num(field.anchor.y),
            shape: field.shape,
            remaining: field.remaining,
        }
    }
}

/// A floating damage number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatingTextSnapshot {
    /// Damage value.
    pub value: f64,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Ticks left.
    pub life: u32,
}

impl From<&FloatingText> for FloatingTextSnapshot {
    fn from(text: &FloatingText) -> Self {
        Self {
            value: num(text.value),
            x: num(text.position.x),
            y: num(text.position.y),
            life: text.life,
        }
    }
}

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Battle ticks elapsed.
    pub tick: u64,
    /// Current phase.
    pub phase: MatchPhase,
    /// Zero-based wave index.
    pub wave_index: usize,
    /// Number of waves.
    pub wave_count: usize,
    /// Points earned.
    pub points: u32,
    /// Chosen passive id.
    pub passive: Option<String>,
    /// Selected archetypes.
    pub roster: Vec<String>,
    /// The wall.
    pub wall: WallSnapshot,
    /// Units on the field.
    pub units: Vec<UnitSnapshot>,
    /// Attackers on the field.
    pub attackers: Vec<AttackerSnapshot>,
    /// Live fields.
    pub fields: Vec<FieldSnapshot>,
    /// Floating damage numbers.
    pub floating_texts: Vec<FloatingTextSnapshot>,
}

/// Recent log lines, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageLog {
    /// Retained lines.
    pub lines: Vec<LogMessage>,
}
