//! Flat-defense damage formulas and the shield-aware damage pipeline.
//!
//! Every hit follows the same formula:
//! ```text
//! Raw Damage   = Stat × Power        (passive attacks use Power = 1)
//! Final Damage = max(1, Raw Damage − Matching Defense)
//! ```
//!
//! Final damage then goes through [`apply_damage`], which drains a shield
//! before hit points and records the resulting events.

use crate::components::{Health, Shield};
use crate::events::{MatchEvent, Outbox};
use crate::math::{Fixed, Vec2Fixed};

/// Minimum damage of any completed hit.
pub const MIN_DAMAGE: Fixed = Fixed::ONE;

/// Subtract `defense` from `raw`, flooring at [`MIN_DAMAGE`].
#[must_use]
pub fn mitigate(raw: Fixed, defense: Fixed) -> Fixed {
    raw.saturating_sub(defense).max(MIN_DAMAGE)
}

/// Damage of a skill hit: `max(1, stat × power − defense)`.
#[must_use]
pub fn skill_damage(stat: Fixed, power: Fixed, defense: Fixed) -> Fixed {
    mitigate(stat.saturating_mul(power), defense)
}

/// Something that can take damage.
pub trait Damageable {
    /// Hit points to reduce.
    fn health_mut(&mut self) -> &mut Health;

    /// Absorption buffer drained before hit points, if this entity can carry one.
    fn shield_mut(&mut self) -> Option<&mut Shield> {
        None
    }

    /// Where floating damage numbers appear.
    fn anchor(&self) -> Vec2Fixed;

    /// Name used in log lines.
    fn label(&self) -> &str;

    /// Called once when hit points first drop to zero or below.
    fn on_depleted(&mut self) {}
}

/// Outcome of a single [`apply_damage`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageReport {
    /// Damage soaked by the shield.
    pub absorbed: Fixed,
    /// Hit points removed.
    pub hp_lost: Fixed,
    /// Whether this hit took the target from positive to depleted hit points.
    pub lethal: bool,
}

/// Apply `amount` to `target`: shield first, remainder to hit points.
///
/// Absorption is exact: with shield `S` and damage `D`, the shield ends at
/// `max(0, S − D)` and hit points drop by `max(0, D − S)`. Any hit point loss
/// creates a floating text at the target.
pub fn apply_damage<T: Damageable + ?Sized>(
    target: &mut T,
    amount: Fixed,
    outbox: &mut Outbox,
) -> DamageReport {
    let mut report = DamageReport::default();
    if amount <= Fixed::ZERO {
        return report;
    }

    let mut remaining = amount;
    if let Some(shield) = target.shield_mut() {
        if shield.is_up() {
            let absorbed = remaining.min(shield.hp);
            shield.hp -= absorbed;
            remaining -= absorbed;
            report.absorbed = absorbed;
        }
    }
    if report.absorbed > Fixed::ZERO {
        outbox.push(MatchEvent::ShieldAbsorbed {
            target: target.label().to_string(),
            absorbed: report.absorbed,
        });
    }

    if remaining > Fixed::ZERO {
        let health = target.health_mut();
        let was_standing = !health.is_depleted();
        health.current -= remaining;
        report.hp_lost = remaining;
        report.lethal = was_standing && health.is_depleted();

        let anchor = target.anchor();
        outbox.float(remaining, anchor);
        if report.lethal {
            target.on_depleted();
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Wall;

    struct Dummy {
        health: Health,
        shield: Shield,
        depleted_calls: u32,
    }

    impl Dummy {
        fn new(hp: i32, shield: i32) -> Self {
            Self {
                health: Health::new(Fixed::from_num(hp)),
                shield: Shield {
                    hp: Fixed::from_num(shield),
                    remaining: 180,
                },
                depleted_calls: 0,
            }
        }
    }

    impl Damageable for Dummy {
        fn health_mut(&mut self) -> &mut Health {
            &mut self.health
        }

        fn shield_mut(&mut self) -> Option<&mut Shield> {
            Some(&mut self.shield)
        }

        fn anchor(&self) -> Vec2Fixed {
            Vec2Fixed::from_ints(10, 10)
        }

        fn label(&self) -> &str {
            "Dummy"
        }

        fn on_depleted(&mut self) {
            self.depleted_calls += 1;
        }
    }

    #[test]
    fn test_mitigate_physical_hit() {
        // attack 20 vs defense 5
        assert_eq!(
            mitigate(Fixed::from_num(20), Fixed::from_num(5)),
            Fixed::from_num(15)
        );
    }

    #[test]
    fn test_skill_damage_magic() {
        // 1.5 × 20 − 10
        let damage = skill_damage(
            Fixed::from_num(20),
            Fixed::from_num(1.5),
            Fixed::from_num(10),
        );
        assert_eq!(damage, Fixed::from_num(20));
    }

    #[test]
    fn test_mitigate_floors_at_one() {
        assert_eq!(mitigate(Fixed::from_num(3), Fixed::from_num(50)), MIN_DAMAGE);
        assert_eq!(mitigate(Fixed::ZERO, Fixed::ZERO), MIN_DAMAGE);
    }

    #[test]
    fn test_shield_absorbs_before_hp() {
        let mut dummy = Dummy::new(100, 30);
        let mut outbox = Outbox::default();

        let report = apply_damage(&mut dummy, Fixed::from_num(50), &mut outbox);

        assert_eq!(report.absorbed, Fixed::from_num(30));
        assert_eq!(report.hp_lost, Fixed::from_num(20));
        assert_eq!(dummy.shield.hp, Fixed::ZERO);
        assert_eq!(dummy.health.current, Fixed::from_num(80));
        assert!(matches!(
            outbox.events[0],
            MatchEvent::ShieldAbsorbed { .. }
        ));
        assert_eq!(outbox.floating_texts.len(), 1);
        assert_eq!(outbox.floating_texts[0].value, Fixed::from_num(20));
    }

    #[test]
    fn test_fully_absorbed_hit_has_no_floating_text() {
        let mut dummy = Dummy::new(100, 30);
        let mut outbox = Outbox::default();

        let report = apply_damage(&mut dummy, Fixed::from_num(12), &mut outbox);

        assert_eq!(report.hp_lost, Fixed::ZERO);
        assert_eq!(dummy.shield.hp, Fixed::from_num(18));
        assert!(outbox.floating_texts.is_empty());
    }

    #[test]
    fn test_lethal_hit_calls_on_depleted_once() {
        let mut dummy = Dummy::new(10, 0);
        let mut outbox = Outbox::default();

        let first = apply_damage(&mut dummy, Fixed::from_num(15), &mut outbox);
        let second = apply_damage(&mut dummy, Fixed::from_num(5), &mut outbox);

        assert!(first.lethal);
        assert!(!second.lethal);
        assert_eq!(dummy.depleted_calls, 1);
        assert_eq!(dummy.health.current, Fixed::from_num(-10));
    }

    #[test]
    fn test_wall_has_no_shield() {
        let mut wall = Wall::new(Fixed::from_num(2000), Vec2Fixed::from_ints(780, 300));
        let mut outbox = Outbox::default();

        apply_damage(&mut wall, Fixed::from_num(15), &mut outbox);

        assert_eq!(wall.health.current, Fixed::from_num(1985));
        assert!(outbox.events.is_empty());
    }
}
