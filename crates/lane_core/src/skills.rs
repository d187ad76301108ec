//! Skill engine: cooldowns, eligibility, target selection and resolution.
//!
//! A skill goes through three steps each time a unit considers it:
//!
//! 1. [`Skill::can_use`] checks both cooldowns and the skill's condition.
//! 2. [`Skill::resolve_targets`] picks targets by the skill's target mode.
//! 3. [`Skill::execute`] applies the effect to each target.
//!
//! Zero resolved targets means the skill does not fire and its cooldown is
//! left alone.

use serde::{Deserialize, Serialize};

use crate::combat::{apply_damage, skill_damage};
use crate::components::{Attacker, EntityId, Facing, Shield, Unit};
use crate::events::{MatchEvent, Outbox};
use crate::fields::{FieldEffect, Shape};
use crate::math::{fixed_serde, option_fixed_serde, seconds_to_ticks, Fixed, Vec2Fixed};

/// Total width of the line used by line-contact skills and line targeting.
pub const LINE_WIDTH: i32 = 80;

/// Ticks a support shield lasts.
pub const SHIELD_DURATION_TICKS: u32 = 180;

/// Ticks after any successful cast before the same unit may cast again.
pub const GLOBAL_SKILL_COOLDOWN_TICKS: u32 = 30;

/// Attackers needed in range for [`SkillCondition::GroupOfThreePlus`].
pub const GROUP_SIZE: usize = 3;

/// Damage family of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillType {
    /// Scales with attack, mitigated by physical defense.
    Physical,
    /// Scales with magic attack, mitigated by magic defense.
    Magic,
    /// Helps allies instead of dealing damage.
    Support,
}

/// How a skill picks its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetMode {
    /// Nearest attackers in range first.
    Closest,
    /// Farthest attackers in range first.
    Furthest,
    /// Attackers in range with the most hit points first.
    HighestHealth,
    /// Every attacker in range.
    AllInRange,
    /// Living units on the caster's side.
    Allies,
    /// Every attacker inside the line in front of the caster.
    RectangleLine,
}

/// Extra requirement for a skill to be usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SkillCondition {
    /// At least one attacker in range.
    #[default]
    Default,
    /// At least three attackers in range.
    GroupOfThreePlus,
    /// At least one attacker inside the line in front of the caster.
    LineContact,
    /// At least one attacker in range, and only fired by a behavior policy.
    ManualTrigger,
}

/// What a skill does to its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Direct damage, optionally pushing targets away from the caster.
    Strike {
        /// Push distance along caster → target.
        #[serde(default, with = "option_fixed_serde")]
        knockback: Option<Fixed>,
    },
    /// Grant each target a shield worth `power` hit points.
    Shield,
    /// Create a field instead of dealing direct damage.
    AreaDenial {
        /// Field geometry.
        shape: Shape,
        /// Field lifetime in seconds.
        #[serde(with = "fixed_serde")]
        duration: Fixed,
        /// Damage per second to attackers inside.
        #[serde(with = "fixed_serde")]
        damage_per_second: Fixed,
        /// Speed multiplier inside.
        #[serde(with = "fixed_serde")]
        slow: Fixed,
    },
    /// Magic damage scaled by the caster's accumulated stacks.
    StackingBurst,
}

/// A resolved skill target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillTarget {
    /// Index into the attacker list.
    Attacker(usize),
    /// Index into the unit list.
    Ally(usize),
}

/// The parts of a casting unit a skill needs to read.
///
/// Copied out of the unit so that the skill can mutate the unit list
/// (shields on allies) while it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct CasterView {
    /// Unit id.
    pub id: EntityId,
    /// Unit name.
    pub name: String,
    /// Position.
    pub position: Vec2Fixed,
    /// Facing.
    pub facing: Facing,
    /// Physical attack.
    pub attack: Fixed,
    /// Magic attack.
    pub magic_attack: Fixed,
    /// Remaining skill-global cooldown.
    pub global_cooldown: u32,
}

impl CasterView {
    /// Snapshot the casting-relevant parts of `unit`.
    #[must_use]
    pub fn of(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
            position: unit.position,
            facing: unit.facing,
            attack: unit.attack,
            magic_attack: unit.magic_attack,
            global_cooldown: unit.skill_cooldown,
        }
    }
}

/// Result of a skill that fired.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillOutcome {
    /// Targets affected.
    pub hits: usize,
    /// Field created by an area-denial skill.
    pub field: Option<FieldEffect>,
}

/// A skill owned by a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    /// Data id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Damage multiplier, or shield hit points for shield skills.
    pub power: Fixed,
    /// Damage family.
    pub kind: SkillType,
    /// Cooldown in seconds.
    pub cooldown_secs: Fixed,
    /// Targeting and eligibility range.
    pub range: Fixed,
    /// Target selection.
    pub target_mode: TargetMode,
    /// Cap on sorted target lists.
    pub max_targets: usize,
    /// Eligibility condition.
    pub condition: SkillCondition,
    /// Effect on targets.
    pub effect: SkillEffect,
    /// Ticks until the skill is ready.
    pub remaining: u32,
}

impl Skill {
    /// Count down one tick.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Whether the skill's own cooldown has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    /// Full cooldown in ticks.
    #[must_use]
    pub fn cooldown_ticks(&self) -> u32 {
        seconds_to_ticks(self.cooldown_secs)
    }

    /// Put the skill on cooldown after a successful cast.
    pub fn start_cooldown(&mut self) {
        self.remaining = self.cooldown_ticks();
    }

    /// Scale the cooldown. A skill that is already cooling restarts at the
    /// new full duration.
    pub fn scale_cooldown(&mut self, factor: Fixed) {
        self.cooldown_secs = self.cooldown_secs.saturating_mul(factor);
        if self.remaining > 0 {
            self.start_cooldown();
        }
    }

    /// The line in front of the caster used by line skills.
    #[must_use]
    pub fn line(&self) -> Shape {
        Shape::Rectangle {
            length: self.range,
            width: Fixed::from_num(LINE_WIDTH),
        }
    }

    fn in_range<'a>(
        &'a self,
        caster: &'a CasterView,
        attackers: &'a [Attacker],
    ) -> impl Iterator<Item = (usize, &'a Attacker)> + 'a {
        attackers
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.is_alive() && caster.position.within(a.position, self.range))
    }

    fn in_line<'a>(
        &'a self,
        caster: &'a CasterView,
        attackers: &'a [Attacker],
    ) -> impl Iterator<Item = (usize, &'a Attacker)> + 'a {
        let line = self.line();
        attackers.iter().enumerate().filter(move |(_, a)| {
            a.is_alive() && line.contains(caster.position, caster.facing, a.position)
        })
    }

    /// Whether the skill may fire now.
    #[must_use]
    pub fn can_use(&self, caster: &CasterView, attackers: &[Attacker]) -> bool {
        if !self.is_ready() || caster.global_cooldown > 0 {
            return false;
        }

        match self.condition {
            SkillCondition::Default | SkillCondition::ManualTrigger => {
                self.in_range(caster, attackers).next().is_some()
            }
            SkillCondition::GroupOfThreePlus => {
                self.in_range(caster, attackers).count() >= GROUP_SIZE
            }
            SkillCondition::LineContact => self.in_line(caster, attackers).next().is_some(),
        }
    }

    /// Pick targets according to the target mode. Ties keep list order.
    #[must_use]
    pub fn resolve_targets(
        &self,
        caster: &CasterView,
        attackers: &[Attacker],
        units: &[Unit],
    ) -> Vec<SkillTarget> {
        let cap = self.max_targets.max(1);

        let indices: Vec<usize> = match self.target_mode {
            TargetMode::Closest => {
                let mut found: Vec<_> = self.in_range(caster, attackers).collect();
                found.sort_by_key(|(_, a)| caster.position.distance_squared(a.position));
                found.into_iter().take(cap).map(|(i, _)| i).collect()
            }
            TargetMode::Furthest => {
                let mut found: Vec<_> = self.in_range(caster, attackers).collect();
                found.sort_by(|(_, a), (_, b)| {
                    let da = caster.position.distance_squared(a.position);
                    let db = caster.position.distance_squared(b.position);
                    db.cmp(&da)
                });
                found.into_iter().take(cap).map(|(i, _)| i).collect()
            }
            TargetMode::HighestHealth => {
                let mut found: Vec<_> = self.in_range(caster, attackers).collect();
                found.sort_by(|(_, a), (_, b)| b.health.current.cmp(&a.health.current));
                found.into_iter().take(cap).map(|(i, _)| i).collect()
            }
            TargetMode::AllInRange => self.in_range(caster, attackers).map(|(i, _)| i).collect(),
            TargetMode::RectangleLine => self.in_line(caster, attackers).map(|(i, _)| i).collect(),
            TargetMode::Allies => {
                return units
                    .iter()
                    .enumerate()
                    .filter(|(_, u)| u.is_active())
                    .take(cap)
                    .map(|(i, _)| SkillTarget::Ally(i))
                    .collect();
            }
        };

        indices.into_iter().map(SkillTarget::Attacker).collect()
    }

    /// Apply the effect to `targets`.
    ///
    /// `stack_multiplier` scales stacking-burst damage; other effects ignore
    /// it. Returns `None` when there is nothing to apply.
    pub fn execute(
        &self,
        caster: &CasterView,
        targets: &[SkillTarget],
        attackers: &mut [Attacker],
        units: &mut [Unit],
        stack_multiplier: Option<Fixed>,
        outbox: &mut Outbox,
    ) -> Option<SkillOutcome> {
        if targets.is_empty() {
            return None;
        }

        if let SkillEffect::AreaDenial {
            shape,
            duration,
            damage_per_second,
            slow,
        } = self.effect
        {
            let anchor = match shape {
                Shape::Circle { .. } => targets
                    .iter()
                    .find_map(|t| match *t {
                        SkillTarget::Attacker(i) => attackers.get(i).map(|a| a.position),
                        SkillTarget::Ally(i) => units.get(i).map(|u| u.position),
                    })
                    .unwrap_or(caster.position),
                Shape::Rectangle { .. } => caster.position,
            };
            outbox.push(MatchEvent::FieldSpawned {
                caster: caster.name.clone(),
                skill: self.name.clone(),
                anchor,
            });
            let field = FieldEffect {
                caster: caster.id,
                caster_name: caster.name.clone(),
                skill_name: self.name.clone(),
                anchor,
                facing: caster.facing,
                shape,
                remaining: seconds_to_ticks(duration),
                damage_per_second,
                slow,
                damage_timer: 0,
                affected: std::collections::BTreeSet::new(),
            };
            return Some(SkillOutcome {
                hits: targets.len(),
                field: Some(field),
            });
        }

        let mut hits = 0;
        for target in targets {
            match *target {
                SkillTarget::Ally(index) => {
                    if let Some(ally) = units.get_mut(index) {
                        self.grant_shield(caster, ally, outbox);
                        hits += 1;
                    }
                }
                SkillTarget::Attacker(index) => {
                    if let Some(attacker) = attackers.get_mut(index) {
                        self.strike(caster, attacker, stack_multiplier, outbox);
                        hits += 1;
                    }
                }
            }
        }

        (hits > 0).then(|| SkillOutcome { hits, field: None })
    }

    fn grant_shield(&self, caster: &CasterView, ally: &mut Unit, outbox: &mut Outbox) {
        ally.shield = Shield {
            hp: self.power,
            remaining: SHIELD_DURATION_TICKS,
        };
        outbox.push(MatchEvent::ShieldGranted {
            caster: caster.name.clone(),
            skill: self.name.clone(),
            target: ally.name.clone(),
        });
    }

    fn strike(
        &self,
        caster: &CasterView,
        target: &mut Attacker,
        stack_multiplier: Option<Fixed>,
        outbox: &mut Outbox,
    ) {
        let damage = match (self.effect, self.kind) {
            (SkillEffect::StackingBurst, _) => {
                let multiplier = stack_multiplier.unwrap_or(Fixed::ONE);
                skill_damage(
                    caster.magic_attack,
                    self.power.saturating_mul(multiplier),
                    target.defenses.magic,
                )
            }
            (_, SkillType::Magic) => {
                skill_damage(caster.magic_attack, self.power, target.defenses.magic)
            }
            _ => skill_damage(caster.attack, self.power, target.defenses.physical),
        };

        outbox.push(MatchEvent::SkillHit {
            caster: caster.name.clone(),
            skill: self.name.clone(),
            target: target.name.clone(),
            damage,
        });
        apply_damage(target, damage, outbox);

        if let SkillEffect::Strike {
            knockback: Some(distance),
        } = self.effect
        {
            let direction = (target.position - caster.position).normalize();
            target.position += direction.scale(distance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorPolicy;
    use crate::components::{DamageType, Defenses, Health};

    fn skill(kind: SkillType, mode: TargetMode, condition: SkillCondition) -> Skill {
        Skill {
            id: "test".to_string(),
            name: "Test".to_string(),
            power: Fixed::from_num(1.5),
            kind,
            cooldown_secs: Fixed::from_num(2),
            range: Fixed::from_num(200),
            target_mode: mode,
            max_targets: 1,
            condition,
            effect: SkillEffect::Strike { knockback: None },
            remaining: 0,
        }
    }

    fn caster() -> CasterView {
        CasterView {
            id: 1,
            name: "Mage".to_string(),
            position: Vec2Fixed::from_ints(400, 300),
            facing: Facing::Left,
            attack: Fixed::from_num(5),
            magic_attack: Fixed::from_num(20),
            global_cooldown: 0,
        }
    }

    fn attacker(id: EntityId, x: i32, y: i32, hp: i32) -> Attacker {
        Attacker {
            id,
            archetype: "BASIC".to_string(),
            name: format!("Basic#{id}"),
            health: Health::new(Fixed::from_num(hp)),
            attack: Fixed::from_num(10),
            speed: Fixed::from_num(0.5),
            original_speed: Fixed::from_num(0.5),
            position: Vec2Fixed::from_ints(x, y),
            defenses: Defenses {
                physical: Fixed::from_num(5),
                magic: Fixed::from_num(10),
            },
            attack_type: DamageType::Physical,
            attack_cooldown: 0,
            attack_interval: 60,
            reward: 10,
        }
    }

    fn ally(id: EntityId) -> Unit {
        Unit {
            id,
            archetype: "CLERIC".to_string(),
            name: "Cleric".to_string(),
            health: Health::new(Fixed::from_num(70)),
            attack: Fixed::from_num(5),
            magic_attack: Fixed::from_num(15),
            defenses: Defenses::default(),
            attack_range: Fixed::from_num(150),
            attack_speed: Fixed::from_num(60),
            position: Vec2Fixed::from_ints(420, 300),
            facing: Facing::Left,
            alive: true,
            shield: Shield::default(),
            attack_cooldown: 0,
            skill_cooldown: 0,
            skills: Vec::new(),
            policy: BehaviorPolicy::Standard,
        }
    }

    #[test]
    fn test_can_use_blocked_by_either_cooldown() {
        let attackers = vec![attacker(2, 300, 300, 50)];
        let mut s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        let mut view = caster();
        assert!(s.can_use(&view, &attackers));

        view.global_cooldown = 1;
        assert!(!s.can_use(&view, &attackers));

        view.global_cooldown = 0;
        s.remaining = 5;
        assert!(!s.can_use(&view, &attackers));
    }

    #[test]
    fn test_can_use_range_is_inclusive() {
        let s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        assert!(s.can_use(&caster(), &[attacker(2, 200, 300, 50)]));
        assert!(!s.can_use(&caster(), &[attacker(2, 199, 300, 50)]));
    }

    #[test]
    fn test_group_condition_needs_three() {
        let s = skill(
            SkillType::Magic,
            TargetMode::AllInRange,
            SkillCondition::GroupOfThreePlus,
        );
        let mut attackers = vec![attacker(2, 300, 300, 50), attacker(3, 320, 300, 50)];
        assert!(!s.can_use(&caster(), &attackers));
        attackers.push(attacker(4, 340, 300, 50));
        assert!(s.can_use(&caster(), &attackers));
    }

    #[test]
    fn test_line_contact_uses_line_not_radius() {
        let s = skill(
            SkillType::Physical,
            TargetMode::RectangleLine,
            SkillCondition::LineContact,
        );
        // Within radius but behind the caster
        assert!(!s.can_use(&caster(), &[attacker(2, 450, 300, 50)]));
        // In front but too far off the line
        assert!(!s.can_use(&caster(), &[attacker(2, 350, 341, 50)]));
        assert!(s.can_use(&caster(), &[attacker(2, 350, 340, 50)]));
    }

    #[test]
    fn test_dead_attackers_are_ignored() {
        let s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        let mut dead = attacker(2, 300, 300, 50);
        dead.health.current = Fixed::ZERO;
        assert!(!s.can_use(&caster(), &[dead]));
    }

    #[test]
    fn test_closest_and_furthest_ordering() {
        let attackers = vec![
            attacker(2, 250, 300, 50),
            attacker(3, 350, 300, 50),
            attacker(4, 300, 300, 50),
        ];
        let mut s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        s.max_targets = 2;
        assert_eq!(
            s.resolve_targets(&caster(), &attackers, &[]),
            vec![SkillTarget::Attacker(1), SkillTarget::Attacker(2)]
        );

        s.target_mode = TargetMode::Furthest;
        assert_eq!(
            s.resolve_targets(&caster(), &attackers, &[]),
            vec![SkillTarget::Attacker(0), SkillTarget::Attacker(2)]
        );
    }

    #[test]
    fn test_ties_keep_spawn_order() {
        let attackers = vec![attacker(2, 300, 250, 50), attacker(3, 300, 350, 50)];
        let s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        assert_eq!(
            s.resolve_targets(&caster(), &attackers, &[]),
            vec![SkillTarget::Attacker(0)]
        );
    }

    #[test]
    fn test_highest_health_targeting() {
        let attackers = vec![
            attacker(2, 300, 300, 50),
            attacker(3, 310, 300, 200),
            attacker(4, 320, 300, 200),
        ];
        let s = skill(
            SkillType::Physical,
            TargetMode::HighestHealth,
            SkillCondition::Default,
        );
        assert_eq!(
            s.resolve_targets(&caster(), &attackers, &[]),
            vec![SkillTarget::Attacker(1)]
        );
    }

    #[test]
    fn test_magic_strike_damage() {
        let mut attackers = vec![attacker(2, 300, 300, 50)];
        let s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        let view = caster();
        let targets = s.resolve_targets(&view, &attackers, &[]);
        let mut outbox = Outbox::default();

        let outcome = s.execute(&view, &targets, &mut attackers, &mut [], None, &mut outbox);

        assert_eq!(outcome.map(|o| o.hits), Some(1));
        // 20 × 1.5 − 10
        assert_eq!(attackers[0].health.current, Fixed::from_num(30));
    }

    #[test]
    fn test_knockback_pushes_away_from_caster() {
        let mut attackers = vec![attacker(2, 300, 300, 500)];
        let mut s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        s.effect = SkillEffect::Strike {
            knockback: Some(Fixed::from_num(50)),
        };
        let view = caster();
        let targets = s.resolve_targets(&view, &attackers, &[]);
        let mut outbox = Outbox::default();

        s.execute(&view, &targets, &mut attackers, &mut [], None, &mut outbox);

        let epsilon = Fixed::ONE / Fixed::from_num(1000);
        assert!((attackers[0].position.x - Fixed::from_num(250)).abs() < epsilon);
        assert_eq!(attackers[0].position.y, Fixed::from_num(300));
    }

    #[test]
    fn test_support_shield_on_allies() {
        let mut s = skill(SkillType::Support, TargetMode::Allies, SkillCondition::Default);
        s.effect = SkillEffect::Shield;
        s.power = Fixed::from_num(30);
        s.max_targets = 4;
        let mut units = vec![ally(1), ally(2)];
        units[1].alive = false;
        let view = caster();
        let targets = s.resolve_targets(&view, &[], &units);
        assert_eq!(targets, vec![SkillTarget::Ally(0)]);

        let mut outbox = Outbox::default();
        s.execute(&view, &targets, &mut [], &mut units, None, &mut outbox);
        assert_eq!(units[0].shield.hp, Fixed::from_num(30));
        assert_eq!(units[0].shield.remaining, SHIELD_DURATION_TICKS);
    }

    #[test]
    fn test_stacking_burst_scales_with_multiplier() {
        let mut attackers = vec![attacker(2, 300, 300, 500)];
        let mut s = skill(
            SkillType::Magic,
            TargetMode::Closest,
            SkillCondition::ManualTrigger,
        );
        s.effect = SkillEffect::StackingBurst;
        s.power = Fixed::ONE;
        let view = caster();
        let targets = s.resolve_targets(&view, &attackers, &[]);
        let mut outbox = Outbox::default();

        s.execute(
            &view,
            &targets,
            &mut attackers,
            &mut [],
            Some(Fixed::from_num(5)),
            &mut outbox,
        );
        // 20 × 1 × 5 − 10
        assert_eq!(attackers[0].health.current, Fixed::from_num(410));
    }

    #[test]
    fn test_area_denial_spawns_field_on_first_target() {
        let mut attackers = vec![attacker(2, 300, 310, 50)];
        let mut s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        s.effect = SkillEffect::AreaDenial {
            shape: Shape::Circle {
                radius: Fixed::from_num(60),
            },
            duration: Fixed::from_num(5),
            damage_per_second: Fixed::from_num(8),
            slow: Fixed::from_num(0.5),
        };
        let view = caster();
        let targets = s.resolve_targets(&view, &attackers, &[]);
        let mut outbox = Outbox::default();

        let outcome = s.execute(&view, &targets, &mut attackers, &mut [], None, &mut outbox);
        let field = outcome.and_then(|o| o.field).expect("field spawned");

        assert_eq!(field.anchor, Vec2Fixed::from_ints(300, 310));
        assert_eq!(field.remaining, 300);
        assert_eq!(attackers[0].health.current, Fixed::from_num(50));
    }

    #[test]
    fn test_empty_targets_do_not_fire() {
        let s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        let mut outbox = Outbox::default();
        assert!(s
            .execute(&caster(), &[], &mut [], &mut [], None, &mut outbox)
            .is_none());
    }

    #[test]
    fn test_scale_cooldown_restarts_running_cooldown() {
        let mut s = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        s.remaining = 17;
        s.scale_cooldown(Fixed::from_num(0.8));
        assert_eq!(s.remaining, 96);

        let mut idle = skill(SkillType::Magic, TargetMode::Closest, SkillCondition::Default);
        idle.scale_cooldown(Fixed::from_num(0.8));
        assert_eq!(idle.remaining, 0);
        assert_eq!(idle.cooldown_ticks(), 96);
    }
}
