//! Simulation systems.
//!
//! Each system is a plain function over the match's collections. They run
//! in a fixed order every battle tick (units, attackers, fields) and write
//! side effects into an [`Outbox`]. Nothing is removed here; reaping happens
//! after all systems have run.

use crate::combat::{apply_damage, mitigate};
use crate::components::{Attacker, Unit, Wall};
use crate::events::{MatchEvent, Outbox};
use crate::fields::{active_slow, FieldEffect};
use crate::math::Fixed;
use crate::skills::{CasterView, GLOBAL_SKILL_COOLDOWN_TICKS};

/// Reach of an attacker's hit against a unit.
pub const MELEE_RANGE: i32 = 25;

/// Reach of an attacker's hit against the wall, measured along x only.
pub const WALL_ATTACK_RANGE: i32 = 30;

/// Update every active unit in list order.
///
/// Per unit: cooldowns, shield expiry, passive attack, then at most one skill
/// chosen by the unit's behavior policy. Returns fields spawned by skills.
pub fn unit_system(
    units: &mut [Unit],
    attackers: &mut [Attacker],
    outbox: &mut Outbox,
) -> Vec<FieldEffect> {
    let mut spawned = Vec::new();

    for index in 0..units.len() {
        if !units[index].is_active() {
            continue;
        }

        tick_cooldowns(&mut units[index]);
        tick_shield(&mut units[index], outbox);
        passive_attack(&mut units[index], attackers, outbox);

        if let Some(field) = resolve_skill(index, units, attackers, outbox) {
            spawned.push(field);
        }
    }

    spawned
}

fn tick_cooldowns(unit: &mut Unit) {
    unit.attack_cooldown = unit.attack_cooldown.saturating_sub(1);
    unit.skill_cooldown = unit.skill_cooldown.saturating_sub(1);
    for skill in &mut unit.skills {
        skill.tick();
    }
}

fn tick_shield(unit: &mut Unit, outbox: &mut Outbox) {
    if unit.shield.remaining == 0 {
        return;
    }
    unit.shield.remaining -= 1;
    if unit.shield.remaining == 0 {
        unit.shield.hp = Fixed::ZERO;
        outbox.push(MatchEvent::ShieldExpired {
            target: unit.name.clone(),
        });
    }
}

/// Index of the nearest living attacker within `range` of `unit`.
///
/// Ties go to the attacker that appears first in the list.
#[must_use]
pub fn nearest_attacker_in_range(
    unit: &Unit,
    attackers: &[Attacker],
    range: Fixed,
) -> Option<usize> {
    let mut best: Option<(usize, Fixed)> = None;
    for (index, attacker) in attackers.iter().enumerate() {
        if !attacker.is_alive() || !unit.position.within(attacker.position, range) {
            continue;
        }
        let distance = unit.position.distance_squared(attacker.position);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

fn passive_attack(unit: &mut Unit, attackers: &mut [Attacker], outbox: &mut Outbox) {
    if unit.attack_cooldown > 0 {
        return;
    }
    let Some(index) = nearest_attacker_in_range(unit, attackers, unit.attack_range) else {
        return;
    };

    let (stat, damage_type) = unit.dominant_attack();
    let target = &mut attackers[index];
    let damage = mitigate(stat, target.defenses.against(damage_type));

    outbox.push(MatchEvent::PassiveHit {
        unit: unit.name.clone(),
        target: target.name.clone(),
        damage,
    });
    apply_damage(target, damage, outbox);

    unit.attack_cooldown = unit.passive_cooldown_ticks();
    unit.policy.on_passive_hit();
}

fn resolve_skill(
    index: usize,
    units: &mut [Unit],
    attackers: &mut [Attacker],
    outbox: &mut Outbox,
) -> Option<FieldEffect> {
    let caster = CasterView::of(&units[index]);
    let choice = units[index]
        .policy
        .choose(&units[index].skills, &caster, attackers)?;
    let skill = units[index].skills.get(choice.skill)?.clone();

    let targets = skill.resolve_targets(&caster, attackers, units);
    let outcome = skill.execute(
        &caster,
        &targets,
        attackers,
        units,
        choice.stack_multiplier,
        outbox,
    )?;

    let unit = &mut units[index];
    if let Some(owned) = unit.skills.get_mut(choice.skill) {
        owned.start_cooldown();
    }
    unit.skill_cooldown = GLOBAL_SKILL_COOLDOWN_TICKS;
    if choice.stack_multiplier.is_some() {
        unit.policy.reset_stacks();
    }

    outcome.field
}

/// Index of the nearest active unit. Ties go to the earlier unit.
#[must_use]
pub fn nearest_unit(attacker: &Attacker, units: &[Unit]) -> Option<usize> {
    let mut best: Option<(usize, Fixed)> = None;
    for (index, unit) in units.iter().enumerate() {
        if !unit.is_active() {
            continue;
        }
        let distance = attacker.position.distance_squared(unit.position);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Update every living attacker: pursue and hit the nearest unit, or march
/// on the wall when no unit is left.
pub fn attacker_system(
    attackers: &mut [Attacker],
    units: &mut [Unit],
    wall: &mut Wall,
    outbox: &mut Outbox,
) {
    let melee = Fixed::from_num(MELEE_RANGE);
    let wall_reach = Fixed::from_num(WALL_ATTACK_RANGE);

    for attacker in attackers.iter_mut() {
        if !attacker.is_alive() {
            continue;
        }
        attacker.attack_cooldown = attacker.attack_cooldown.saturating_sub(1);

        if let Some(index) = nearest_unit(attacker, units) {
            let target = &mut units[index];
            if attacker.position.within(target.position, melee) {
                if attacker.attack_cooldown == 0 {
                    let defense = target.defenses.against(attacker.attack_type);
                    let damage = mitigate(attacker.attack, defense);
                    outbox.push(MatchEvent::AttackerHit {
                        attacker: attacker.name.clone(),
                        target: target.name.clone(),
                        damage,
                    });
                    if apply_damage(target, damage, outbox).lethal {
                        outbox.push(MatchEvent::UnitFell {
                            id: target.id,
                            name: target.name.clone(),
                        });
                    }
                    restart_cooldown(attacker);
                }
            } else {
                attacker.position = attacker
                    .position
                    .step_toward(target.position, attacker.speed);
            }
        } else if (wall.position.x - attacker.position.x).abs() > wall_reach {
            attacker.position.x += attacker.speed;
        } else if attacker.attack_cooldown == 0 {
            outbox.push(MatchEvent::WallHit {
                attacker: attacker.name.clone(),
                damage: attacker.attack,
            });
            apply_damage(wall, attacker.attack, outbox);
            restart_cooldown(attacker);
        }
    }
}

fn restart_cooldown(attacker: &mut Attacker) {
    attacker.attack_cooldown = attacker.attack_interval;
}

/// Update every field in creation order, then settle attacker speeds.
///
/// An attacker inside any live field moves at the strongest slow among them;
/// one inside none moves at its original speed.
pub fn field_system(fields: &mut [FieldEffect], attackers: &mut [Attacker], outbox: &mut Outbox) {
    for field in fields.iter_mut() {
        field.update(attackers, outbox);
    }

    for attacker in attackers.iter_mut() {
        match active_slow(fields, attacker.id) {
            Some(multiplier) => attacker.apply_slow(multiplier),
            None => attacker.restore_speed(),
        }
    }
}
