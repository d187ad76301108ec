//! Skill definitions.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};
use crate::skills::{Skill, SkillCondition, SkillEffect, SkillType, TargetMode};

/// Data-driven skill definition.
///
/// # Example RON
///
/// ```ron
/// SkillData(
///     id: "fireball",
///     name: "Fireball",
///     power: 1.5,
///     kind: Magic,
///     cooldown: 2.0,
///     range: 200.0,
///     target_mode: Closest,
///     effect: Strike(knockback: None),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillData {
    /// Unique identifier referenced by unit archetypes.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Damage multiplier, or shield hit points for shield skills.
    #[serde(with = "fixed_serde")]
    pub power: Fixed,

    /// Damage family.
    pub kind: SkillType,

    /// Cooldown in seconds.
    #[serde(with = "fixed_serde")]
    pub cooldown: Fixed,

    /// Eligibility and targeting range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,

    /// Target selection.
    pub target_mode: TargetMode,

    /// Cap on sorted target lists.
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,

    /// Eligibility condition.
    #[serde(default)]
    pub condition: SkillCondition,

    /// Effect on targets.
    pub effect: SkillEffect,
}

const fn default_max_targets() -> usize {
    1
}

impl SkillData {
    /// Fresh, ready-to-fire runtime skill.
    #[must_use]
    pub fn instantiate(&self) -> Skill {
        Skill {
            id: self.id.clone(),
            name: self.name.clone(),
            power: self.power,
            kind: self.kind,
            cooldown_secs: self.cooldown,
            range: self.range,
            target_mode: self.target_mode,
            max_targets: self.max_targets,
            condition: self.condition,
            effect: self.effect,
            remaining: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Shape;

    #[test]
    fn test_parse_with_defaults() {
        let ron_str = r#"SkillData(
            id: "fireball",
            name: "Fireball",
            power: 1.5,
            kind: Magic,
            cooldown: 2.0,
            range: 200.0,
            target_mode: Closest,
            effect: Strike(knockback: None),
        )"#;
        let data: SkillData = ron::from_str(ron_str).expect("valid skill");

        assert_eq!(data.max_targets, 1);
        assert_eq!(data.condition, SkillCondition::Default);
        let skill = data.instantiate();
        assert_eq!(skill.cooldown_ticks(), 120);
        assert!(skill.is_ready());
    }

    #[test]
    fn test_parse_area_denial() {
        let ron_str = r#"SkillData(
            id: "quagmire",
            name: "Quagmire",
            power: 1.0,
            kind: Magic,
            cooldown: 10.0,
            range: 300.0,
            target_mode: Closest,
            effect: AreaDenial(
                shape: Circle(radius: 60.0),
                duration: 5.0,
                damage_per_second: 8.0,
                slow: 0.5,
            ),
        )"#;
        let data: SkillData = ron::from_str(ron_str).expect("valid skill");

        match data.effect {
            SkillEffect::AreaDenial { shape, slow, .. } => {
                assert_eq!(
                    shape,
                    Shape::Circle {
                        radius: Fixed::from_num(60)
                    }
                );
                assert_eq!(slow, Fixed::from_num(0.5));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }
}
