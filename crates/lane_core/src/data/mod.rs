//! Data structures for match content.
//!
//! Skills, unit archetypes, attacker archetypes, passives and waves are plain
//! serde types deserialized from RON. [`GameData::builtin`] parses the content
//! bundled with the crate; callers may load their own with
//! [`GameData::from_ron_str`].
//!
//! **Note:** This module performs no IO. Reading files is the caller's job.

mod attacker_data;
mod config;
mod passive_data;
mod skill_data;
mod unit_data;
mod wave_data;

pub use attacker_data::AttackerData;
pub use config::MatchConfig;
pub use passive_data::{PassiveData, PassiveEffect};
pub use skill_data::SkillData;
pub use unit_data::{PolicyData, UnitData};
pub use wave_data::{SpawnSegment, WaveDefinition};

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorPolicy;
use crate::components::{Attacker, Defenses, EntityId, Health, Shield, Unit};
use crate::error::ConfigError;
use crate::math::{Fixed, Vec2Fixed};
use crate::skills::{Skill, SkillEffect};

const BUILTIN_RON: &str = include_str!("builtin.ron");

/// All content a match draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameData {
    /// Skill definitions.
    #[serde(default)]
    pub skills: Vec<SkillData>,

    /// Unit archetypes, in menu order.
    #[serde(default)]
    pub units: Vec<UnitData>,

    /// Attacker archetypes.
    #[serde(default)]
    pub attackers: Vec<AttackerData>,

    /// Selectable passives.
    #[serde(default)]
    pub passives: Vec<PassiveData>,

    /// Waves in the order they are fought.
    #[serde(default)]
    pub waves: Vec<WaveDefinition>,
}

impl GameData {
    /// Content bundled with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_ron_str(BUILTIN_RON)
    }

    /// Parse content from a RON string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(ron_str)?)
    }

    /// Look up a skill by id.
    #[must_use]
    pub fn get_skill(&self, id: &str) -> Option<&SkillData> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Look up a unit archetype by id.
    #[must_use]
    pub fn get_unit(&self, id: &str) -> Option<&UnitData> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Look up an attacker archetype by id.
    #[must_use]
    pub fn get_attacker(&self, id: &str) -> Option<&AttackerData> {
        self.attackers.iter().find(|a| a.id == id)
    }

    /// Look up a passive by id.
    #[must_use]
    pub fn get_passive(&self, id: &str) -> Option<&PassiveData> {
        self.passives.iter().find(|p| p.id == id)
    }

    /// Check every cross reference.
    ///
    /// Faults are not fatal: at runtime the affected skill attachment or
    /// spawn is skipped. This reports them all up front.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut faults = Vec::new();

        for skill in &self.skills {
            if let SkillEffect::AreaDenial { slow, .. } = skill.effect {
                if slow <= Fixed::ZERO || slow > Fixed::ONE {
                    faults.push(ConfigError::InvalidSlow {
                        skill: skill.id.clone(),
                        slow: slow.to_num(),
                    });
                }
            }
        }

        for unit in &self.units {
            for skill_id in &unit.skills {
                if self.get_skill(skill_id).is_none() {
                    faults.push(ConfigError::UnknownSkill {
                        owner: unit.id.clone(),
                        skill: skill_id.clone(),
                    });
                }
            }

            if let PolicyData::ConditionalFallback { primaries, fallback } = &unit.policy {
                for skill_id in primaries.iter().chain(std::iter::once(fallback)) {
                    if !unit.skills.contains(skill_id) {
                        faults.push(ConfigError::PolicySkillMissing {
                            owner: unit.id.clone(),
                            skill: skill_id.clone(),
                        });
                    }
                }
            }
        }

        for wave in &self.waves {
            for segment in &wave.segments {
                for attacker_id in &segment.attackers {
                    if self.get_attacker(attacker_id).is_none() {
                        faults.push(ConfigError::UnknownAttacker(attacker_id.clone()));
                    }
                }
            }
        }

        faults
    }

    /// Build a unit template for `archetype` with id 0 at the origin.
    ///
    /// Unknown skill ids are pushed to `faults` and left out of the unit's
    /// skill list. A policy that names a missing skill degrades to
    /// [`BehaviorPolicy::Standard`].
    pub fn build_unit(
        &self,
        archetype: &str,
        faults: &mut Vec<ConfigError>,
    ) -> Result<Unit, ConfigError> {
        let data = self
            .get_unit(archetype)
            .ok_or_else(|| ConfigError::UnknownUnit(archetype.to_string()))?;

        let mut skills = Vec::with_capacity(data.skills.len());
        for skill_id in &data.skills {
            match self.get_skill(skill_id) {
                Some(skill) => skills.push(skill.instantiate()),
                None => faults.push(ConfigError::UnknownSkill {
                    owner: data.id.clone(),
                    skill: skill_id.clone(),
                }),
            }
        }

        let policy = resolve_policy(data, &skills, faults);

        Ok(Unit {
            id: 0,
            archetype: data.id.clone(),
            name: data.name.clone(),
            health: Health::new(data.hp),
            attack: data.attack,
            magic_attack: data.magic_attack,
            defenses: Defenses {
                physical: data.physical_defense,
                magic: data.magic_defense,
            },
            attack_range: data.attack_range,
            attack_speed: data.attack_speed,
            position: Vec2Fixed::ZERO,
            facing: data.facing,
            alive: true,
            shield: Shield::default(),
            attack_cooldown: 0,
            skill_cooldown: 0,
            skills,
            policy,
        })
    }

    /// Spawn an attacker of `archetype`.
    pub fn build_attacker(
        &self,
        archetype: &str,
        id: EntityId,
        position: Vec2Fixed,
    ) -> Result<Attacker, ConfigError> {
        self.get_attacker(archetype)
            .map(|data| data.spawn(id, position))
            .ok_or_else(|| ConfigError::UnknownAttacker(archetype.to_string()))
    }
}

fn resolve_policy(
    data: &UnitData,
    skills: &[Skill],
    faults: &mut Vec<ConfigError>,
) -> BehaviorPolicy {
    let index_of = |skill_id: &str| skills.iter().position(|s| s.id == skill_id);

    match &data.policy {
        PolicyData::Standard => BehaviorPolicy::Standard,
        PolicyData::StackingBurst { threshold, cap } => BehaviorPolicy::StackingBurst {
            stacks: 0,
            threshold: *threshold,
            cap: (*cap).max(*threshold),
        },
        PolicyData::ConditionalFallback { primaries, fallback } => {
            let mut resolved = Vec::with_capacity(primaries.len());
            for skill_id in primaries {
                match index_of(skill_id) {
                    Some(index) => resolved.push(index),
                    None => faults.push(ConfigError::PolicySkillMissing {
                        owner: data.id.clone(),
                        skill: skill_id.clone(),
                    }),
                }
            }
            match index_of(fallback) {
                Some(index) => BehaviorPolicy::ConditionalFallback {
                    primaries: resolved,
                    fallback: index,
                },
                None => {
                    faults.push(ConfigError::PolicySkillMissing {
                        owner: data.id.clone(),
                        skill: fallback.clone(),
                    });
                    BehaviorPolicy::Standard
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::skills::SkillCondition;

    fn builtin() -> GameData {
        GameData::builtin().expect("bundled content parses")
    }

    #[test]
    fn test_builtin_content_is_consistent() {
        let data = builtin();
        assert!(data.validate().is_empty(), "{:?}", data.validate());
        assert!(data.units.len() >= 8);
        assert_eq!(data.attackers.len(), 4);
        assert_eq!(data.passives.len(), 3);
        assert!(!data.waves.is_empty());
    }

    #[test]
    fn test_builtin_mage_stats() {
        let data = builtin();
        let mut faults = Vec::new();
        let mage = data.build_unit("MAGE", &mut faults).expect("mage exists");

        assert!(faults.is_empty());
        assert_eq!(mage.health.max, Fixed::from_num(80));
        assert_eq!(mage.magic_attack, Fixed::from_num(25));
        assert_eq!(mage.skills.len(), 1);
        assert_eq!(mage.skills[0].name, "Fireball");
        assert_eq!(mage.skills[0].cooldown_ticks(), 120);
    }

    #[test]
    fn test_builtin_policies_resolve() {
        let data = builtin();
        let mut faults = Vec::new();

        let geomancer = data.build_unit("GEOMANCER", &mut faults).expect("exists");
        assert!(matches!(
            geomancer.policy,
            BehaviorPolicy::ConditionalFallback { ref primaries, fallback: 2 } if primaries == &[0, 1]
        ));

        let berserker = data.build_unit("BERSERKER", &mut faults).expect("exists");
        assert!(matches!(
            berserker.policy,
            BehaviorPolicy::StackingBurst { stacks: 0, .. }
        ));
        assert!(berserker
            .skills
            .iter()
            .any(|s| s.condition == SkillCondition::ManualTrigger));
        assert!(faults.is_empty());
    }

    #[test]
    fn test_unknown_skill_is_skipped() {
        let mut data = builtin();
        if let Some(mage) = data.units.iter_mut().find(|u| u.id == "MAGE") {
            mage.skills.push("meteor".to_string());
        }
        let mut faults = Vec::new();
        let mage = data.build_unit("MAGE", &mut faults).expect("mage exists");

        assert_eq!(mage.skills.len(), 1);
        assert_eq!(faults.len(), 1);
        assert!(matches!(faults[0], ConfigError::UnknownSkill { .. }));
    }

    #[test]
    fn test_missing_fallback_degrades_to_standard() {
        let mut data = builtin();
        if let Some(geo) = data.units.iter_mut().find(|u| u.id == "GEOMANCER") {
            geo.policy = PolicyData::ConditionalFallback {
                primaries: vec!["stone_spike".to_string()],
                fallback: "earthquake".to_string(),
            };
        }
        let mut faults = Vec::new();
        let geo = data.build_unit("GEOMANCER", &mut faults).expect("exists");

        assert_eq!(geo.policy, BehaviorPolicy::Standard);
        assert_eq!(faults.len(), 1);
        assert!(!data.validate().is_empty());
    }

    #[test]
    fn test_slow_outside_unit_range_is_reported() {
        let mut data = builtin();
        let quagmire = data
            .skills
            .iter_mut()
            .find(|s| s.id == "quagmire")
            .expect("quagmire exists");
        if let SkillEffect::AreaDenial { ref mut slow, .. } = quagmire.effect {
            *slow = Fixed::from_num(1.5);
        }

        let faults = data.validate();
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            &faults[0],
            ConfigError::InvalidSlow { skill, .. } if skill == "quagmire"
        ));
    }

    #[test]
    fn test_unknown_archetypes() {
        let data = builtin();
        let mut faults = Vec::new();
        assert!(matches!(
            data.build_unit("PALADIN", &mut faults),
            Err(ConfigError::UnknownUnit(_))
        ));
        assert!(matches!(
            data.build_attacker("GHOST", 1, Vec2Fixed::ZERO),
            Err(ConfigError::UnknownAttacker(_))
        ));
    }

    #[test]
    fn test_build_attacker_from_builtin() {
        let data = builtin();
        let tank = data
            .build_attacker("TANK", 5, Vec2Fixed::from_ints(-40, 100))
            .expect("tank exists");
        assert_eq!(tank.id, 5);
        assert_eq!(tank.health.max, Fixed::from_num(200));
        assert_eq!(tank.speed, Fixed::from_num(0.3));
        assert_eq!(tank.original_speed, tank.speed);
        assert_eq!(tank.reward, 30);
        assert_eq!(tank.attack_interval, 60);
    }
}
