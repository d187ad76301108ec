//! Property tests for damage, shields, cooldowns, fields and spawning.

use lane_core::combat::{apply_damage, mitigate};
use lane_core::components::{Facing, Health, Shield};
use lane_core::data::MatchConfig;
use lane_core::data::WaveDefinition;
use lane_core::events::Outbox;
use lane_core::fields::Shape;
use lane_core::math::{Fixed, Vec2Fixed};
use lane_core::scheduler::WaveScheduler;
use lane_test_utils::fixtures::unit;
use lane_test_utils::proptest::prelude::*;
use lane_test_utils::determinism::strategies::{
    arb_cooldown_secs, arb_damage, arb_field_position, arb_radius, arb_shield, arb_stat, arb_wave,
};

proptest! {
    /// Every mitigated hit deals at least one point.
    #[test]
    fn prop_mitigated_damage_is_at_least_one(raw in arb_stat(), defense in arb_stat()) {
        let damage = mitigate(raw, defense);
        prop_assert!(damage >= Fixed::ONE);
        prop_assert!(damage >= raw - defense);
    }

    /// Shield absorption is exact.
    #[test]
    fn prop_shield_absorption_is_exact(shield in arb_shield(), damage in arb_damage()) {
        let mut target = unit("CLERIC", 1, 400, 300);
        target.health = Health::new(Fixed::from_num(10_000));
        target.shield = Shield { hp: shield, remaining: 180 };
        let mut outbox = Outbox::default();

        let report = apply_damage(&mut target, damage, &mut outbox);

        let expected_shield = (shield - damage).max(Fixed::ZERO);
        let expected_loss = (damage - shield).max(Fixed::ZERO);
        prop_assert_eq!(target.shield.hp, expected_shield);
        prop_assert_eq!(report.hp_lost, expected_loss);
        prop_assert_eq!(target.health.current, Fixed::from_num(10_000) - expected_loss);
        prop_assert_eq!(outbox.floating_texts.len(), usize::from(expected_loss > Fixed::ZERO));
    }

    /// Cooldowns only ever count down between casts.
    #[test]
    fn prop_cooldowns_never_increase(secs in arb_cooldown_secs(), ticks in 0u32..2_000) {
        let mut mage = unit("MAGE", 1, 400, 300);
        let skill = &mut mage.skills[0];
        skill.cooldown_secs = secs;
        skill.start_cooldown();

        let mut previous = skill.remaining;
        for _ in 0..ticks {
            skill.tick();
            prop_assert!(skill.remaining <= previous);
            previous = skill.remaining;
        }
        prop_assert_eq!(
            skill.remaining,
            skill.cooldown_ticks().saturating_sub(ticks)
        );
    }

    /// A circle of radius R contains a point iff its distance is at most R.
    #[test]
    fn prop_circle_contains_iff_within_radius(
        anchor in arb_field_position(),
        point in arb_field_position(),
        radius in arb_radius(),
    ) {
        let circle = Shape::Circle { radius };
        let dx = (point.x - anchor.x).to_num::<i64>();
        let dy = (point.y - anchor.y).to_num::<i64>();
        let r = radius.to_num::<i64>();
        let expected = dx * dx + dy * dy <= r * r;
        prop_assert_eq!(circle.contains(anchor, Facing::Right, point), expected);
    }

    /// A wave emits exactly its total count, then reports exhaustion.
    #[test]
    fn prop_scheduler_emits_total_count(segments in arb_wave(5), seed in any::<u64>()) {
        let wave = WaveDefinition { name: "Prop".to_string(), segments };
        let area = MatchConfig::default().spawn_area();
        let mut scheduler = WaveScheduler::new(&wave, seed);

        let limit = wave.segments.iter().map(|s| (s.count + 1) * (s.interval + 1)).sum::<u32>() + 10;
        let mut emitted = 0;
        for _ in 0..limit {
            if let Some(request) = scheduler.tick(&area) {
                prop_assert_eq!(request.position.x, area.x);
                prop_assert!(request.position.y >= area.min_y && request.position.y <= area.max_y);
                emitted += 1;
            }
        }
        prop_assert_eq!(emitted, wave.total_count());
        prop_assert!(scheduler.is_exhausted());
    }
}

#[test]
fn test_rectangle_extends_along_facing() {
    let rect = Shape::Rectangle {
        length: Fixed::from_num(200),
        width: Fixed::from_num(80),
    };
    let anchor = Vec2Fixed::from_ints(600, 300);

    assert!(rect.contains(anchor, Facing::Left, Vec2Fixed::from_ints(450, 330)));
    assert!(!rect.contains(anchor, Facing::Right, Vec2Fixed::from_ints(450, 330)));
    assert!(!rect.contains(anchor, Facing::Left, Vec2Fixed::from_ints(450, 341)));
    assert!(rect.contains(anchor, Facing::Left, Vec2Fixed::from_ints(400, 260)));
}
