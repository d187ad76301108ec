//! Persistent area-denial zones.
//!
//! A field damages every attacker inside it once per second and slows them
//! while they stay inside. Fields only track who is inside; the resulting
//! speed is settled across all fields by [`active_slow`], so an attacker that
//! leaves one of two overlapping fields stays slowed by the other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::combat::{apply_damage, mitigate};
use crate::components::{Attacker, EntityId, Facing};
use crate::events::{MatchEvent, Outbox};
use crate::math::{fixed_serde, Fixed, Vec2Fixed, TICK_RATE};

/// Geometry of a field or line skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Disc around the anchor.
    Circle {
        /// Inclusive radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
    /// Rectangle extending from the anchor along the facing direction.
    Rectangle {
        /// Extent along the facing axis.
        #[serde(with = "fixed_serde")]
        length: Fixed,
        /// Total extent across the facing axis, centred on the anchor.
        #[serde(with = "fixed_serde")]
        width: Fixed,
    },
}

impl Shape {
    /// Whether `point` lies inside the shape placed at `anchor` (inclusive).
    #[must_use]
    pub fn contains(&self, anchor: Vec2Fixed, facing: Facing, point: Vec2Fixed) -> bool {
        match *self {
            Shape::Circle { radius } => anchor.within(point, radius),
            Shape::Rectangle { length, width } => {
                let forward = (point.x - anchor.x) * facing.sign();
                let lateral = (point.y - anchor.y).abs();
                let half_width = width / Fixed::from_num(2);
                forward >= Fixed::ZERO && forward <= length && lateral <= half_width
            }
        }
    }
}

/// A live area-denial zone.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEffect {
    /// Unit that cast the field. The unit may be gone.
    pub caster: EntityId,
    /// Caster name for log attribution.
    pub caster_name: String,
    /// Name of the skill that created it.
    pub skill_name: String,
    /// Anchor point.
    pub anchor: Vec2Fixed,
    /// Direction rectangles extend toward.
    pub facing: Facing,
    /// Geometry.
    pub shape: Shape,
    /// Ticks left.
    pub remaining: u32,
    /// Damage dealt each second to every attacker inside.
    pub damage_per_second: Fixed,
    /// Speed multiplier applied inside.
    pub slow: Fixed,
    /// Counts up to one second between damage pulses.
    pub damage_timer: u32,
    /// Attackers inside after the last update; empty once expired.
    pub affected: BTreeSet<EntityId>,
}

impl FieldEffect {
    /// Whether the field should be removed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Whether `point` is inside this field.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        self.shape.contains(self.anchor, self.facing, point)
    }

    /// Advance one tick: refresh membership, pulse damage, expire.
    pub fn update(&mut self, attackers: &mut [Attacker], outbox: &mut Outbox) {
        self.remaining = self.remaining.saturating_sub(1);

        let inside: BTreeSet<EntityId> = attackers
            .iter()
            .filter(|a| a.is_alive() && self.contains(a.position))
            .map(|a| a.id)
            .collect();

        self.damage_timer += 1;
        if self.damage_timer >= TICK_RATE {
            self.damage_timer = 0;
            for attacker in attackers.iter_mut().filter(|a| inside.contains(&a.id)) {
                let damage = mitigate(self.damage_per_second, attacker.defenses.magic);
                apply_damage(attacker, damage, outbox);
                outbox.push(MatchEvent::FieldDamage {
                    caster: self.caster_name.clone(),
                    target: attacker.name.clone(),
                    damage,
                });
            }
        }

        self.affected = if self.is_expired() {
            BTreeSet::new()
        } else {
            inside
        };
    }
}

/// Strongest slow any live field holds on `id`, if any.
#[must_use]
pub fn active_slow(fields: &[FieldEffect], id: EntityId) -> Option<Fixed> {
    fields
        .iter()
        .filter(|f| !f.is_expired() && f.affected.contains(&id))
        .map(|f| f.slow)
        .min()
}
