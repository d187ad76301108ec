//! Events emitted by the simulation.
//!
//! Every state change worth showing to a player is recorded as a
//! [`MatchEvent`]. Presentation layers turn events into log lines with
//! [`MatchEvent::message`] and [`MatchEvent::severity`]; the match keeps a
//! bounded history of those lines.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, FloatingText};
use crate::math::{Fixed, Vec2Fixed};
use crate::phase::MatchPhase;

/// Importance of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine combat and progress.
    Info,
    /// Rejected commands and other player-facing problems.
    Warning,
    /// Data faults.
    Error,
}

/// One line of the match log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Human-readable text.
    pub text: String,
    /// Importance.
    pub severity: Severity,
}

/// Something that happened during a tick or in response to a command.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// A unit's passive attack landed.
    PassiveHit {
        /// Unit name.
        unit: String,
        /// Attacker name.
        target: String,
        /// Damage dealt.
        damage: Fixed,
    },
    /// A damaging skill landed on one target.
    SkillHit {
        /// Unit name.
        caster: String,
        /// Skill name.
        skill: String,
        /// Attacker name.
        target: String,
        /// Damage dealt.
        damage: Fixed,
    },
    /// A support skill granted a shield.
    ShieldGranted {
        /// Unit name.
        caster: String,
        /// Skill name.
        skill: String,
        /// Shielded unit name.
        target: String,
    },
    /// A shield soaked part of a hit.
    ShieldAbsorbed {
        /// Shielded entity name.
        target: String,
        /// Amount absorbed.
        absorbed: Fixed,
    },
    /// A shield ran out of time.
    ShieldExpired {
        /// Unit name.
        target: String,
    },
    /// An area-denial skill created a field.
    FieldSpawned {
        /// Unit name.
        caster: String,
        /// Skill name.
        skill: String,
        /// Field anchor.
        anchor: Vec2Fixed,
    },
    /// A field's once-per-second damage landed.
    FieldDamage {
        /// Name of the unit that created the field.
        caster: String,
        /// Attacker name.
        target: String,
        /// Damage dealt.
        damage: Fixed,
    },
    /// An attacker hit a unit.
    AttackerHit {
        /// Attacker name.
        attacker: String,
        /// Unit name.
        target: String,
        /// Damage dealt.
        damage: Fixed,
    },
    /// An attacker hit the wall.
    WallHit {
        /// Attacker name.
        attacker: String,
        /// Damage dealt.
        damage: Fixed,
    },
    /// A unit fell.
    UnitFell {
        /// Unit id.
        id: EntityId,
        /// Unit name.
        name: String,
    },
    /// An attacker appeared at the field edge.
    AttackerSpawned {
        /// Attacker id.
        id: EntityId,
        /// Attacker name.
        name: String,
    },
    /// An attacker was defeated and its reward paid.
    AttackerDefeated {
        /// Attacker id.
        id: EntityId,
        /// Attacker name.
        name: String,
        /// Points awarded.
        reward: u32,
    },
    /// The chosen passive modified the party.
    PassiveApplied {
        /// Passive display name.
        passive: String,
    },
    /// A wave began.
    WaveStarted {
        /// Zero-based wave index.
        wave: usize,
    },
    /// A wave was cleared.
    WaveCleared {
        /// Zero-based wave index.
        wave: usize,
    },
    /// The phase machine moved.
    PhaseChanged {
        /// Previous phase.
        from: MatchPhase,
        /// New phase.
        to: MatchPhase,
    },
    /// A player command was rejected.
    CommandRejected {
        /// Reason shown to the player.
        reason: String,
    },
    /// Game data referenced something unknown; the affected entity was skipped.
    ConfigFault {
        /// Description of the fault.
        detail: String,
    },
}

impl MatchEvent {
    /// Severity of the log line for this event.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::CommandRejected { .. } => Severity::Warning,
            Self::ConfigFault { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }

    /// Human-readable log text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::PassiveHit {
                unit,
                target,
                damage,
            } => format!("{unit} hits {target} for {damage:.1} damage"),
            Self::SkillHit {
                caster,
                skill,
                target,
                damage,
            } => format!("{caster} uses {skill} on {target} for {damage:.1} damage"),
            Self::ShieldGranted {
                caster,
                skill,
                target,
            } => format!("{caster} shields {target} with {skill}"),
            Self::ShieldAbsorbed { target, absorbed } => {
                format!("{target}'s shield absorbs {absorbed:.1} damage")
            }
            Self::ShieldExpired { target } => format!("{target}'s shield fades"),
            Self::FieldSpawned {
                caster,
                skill,
                anchor,
            } => format!(
                "{caster} casts {skill} at ({:.0}, {:.0})",
                anchor.x, anchor.y
            ),
            Self::FieldDamage {
                caster,
                target,
                damage,
            } => format!("{caster}'s field deals {damage:.1} damage to {target}"),
            Self::AttackerHit {
                attacker,
                target,
                damage,
            } => format!("{attacker} hits {target} for {damage:.1} damage"),
            Self::WallHit { attacker, damage } => {
                format!("{attacker} hits the wall for {damage:.1} damage")
            }
            Self::UnitFell { name, .. } => format!("{name} has fallen"),
            Self::AttackerSpawned { name, .. } => format!("{name} appears"),
            Self::AttackerDefeated { name, reward, .. } => {
                format!("{name} defeated, {reward} points earned")
            }
            Self::PassiveApplied { passive } => format!("Passive {passive} takes effect"),
            Self::WaveStarted { wave } => format!("Wave {} begins", wave + 1),
            Self::WaveCleared { wave } => format!("Wave {} cleared", wave + 1),
            Self::PhaseChanged { to, .. } => match to {
                MatchPhase::Victory => "Victory!".to_string(),
                MatchPhase::Defeat => "Game over: the wall has fallen".to_string(),
                other => format!("Entering {other}"),
            },
            Self::CommandRejected { reason } => reason.clone(),
            Self::ConfigFault { detail } => detail.clone(),
        }
    }

    /// Convert to a log line.
    #[must_use]
    pub fn to_log(&self) -> LogMessage {
        LogMessage {
            text: self.message(),
            severity: self.severity(),
        }
    }
}

/// Collects side effects produced while systems run.
///
/// Systems never touch the match's collections for output; they push into
/// an outbox which the match drains after the tick.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    /// Events in emission order.
    pub events: Vec<MatchEvent>,
    /// Floating texts created this tick.
    pub floating_texts: Vec<FloatingText>,
}

impl Outbox {
    /// Record an event.
    pub fn push(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    /// Record a floating damage number.
    pub fn float(&mut self, value: Fixed, position: Vec2Fixed) {
        self.floating_texts.push(FloatingText::new(value, position));
    }
}

/// Everything produced by one call to [`crate::simulation::Match::tick`].
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Events in emission order.
    pub events: Vec<MatchEvent>,
    /// Ids of attackers spawned this tick.
    pub spawned: Vec<EntityId>,
    /// Ids of attackers and units removed this tick.
    pub deaths: Vec<EntityId>,
}
