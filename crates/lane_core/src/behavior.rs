//! Per-unit skill selection policies.
//!
//! Units do not branch on their own names to decide what to cast; each
//! archetype carries a [`BehaviorPolicy`] that picks at most one skill per
//! tick.

use crate::components::Attacker;
use crate::math::Fixed;
use crate::skills::{CasterView, Skill, SkillCondition};

/// The skill a policy picked for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillChoice {
    /// Index into the unit's skill list.
    pub skill: usize,
    /// Multiplier for stacking-burst damage, when the choice is a burst.
    pub stack_multiplier: Option<Fixed>,
}

/// How a unit chooses between its skills.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BehaviorPolicy {
    /// First usable skill in list order. Manual-trigger skills never fire.
    #[default]
    Standard,
    /// Accumulates a stack per passive hit and fires its manual-trigger
    /// skill once `threshold` stacks are stored.
    StackingBurst {
        /// Stored stacks.
        stacks: u32,
        /// Stacks needed before the burst may fire.
        threshold: u32,
        /// Upper bound on stored stacks.
        cap: u32,
    },
    /// Tries `primaries` in order and only considers `fallback` when none of
    /// them can be used. Skills named by neither are tried last, in list
    /// order, as under [`Self::Standard`].
    ConditionalFallback {
        /// Skill indices tried first.
        primaries: Vec<usize>,
        /// Skill index used when every primary is unavailable.
        fallback: usize,
    },
}

impl BehaviorPolicy {
    /// Pick the skill to cast this tick, if any.
    #[must_use]
    pub fn choose(
        &self,
        skills: &[Skill],
        caster: &CasterView,
        attackers: &[Attacker],
    ) -> Option<SkillChoice> {
        let usable = |index: usize| {
            skills
                .get(index)
                .is_some_and(|skill| skill.can_use(caster, attackers))
        };
        let plain = |index: usize| SkillChoice {
            skill: index,
            stack_multiplier: None,
        };

        match self {
            Self::Standard => first_automatic(skills, caster, attackers).map(plain),
            Self::StackingBurst {
                stacks, threshold, ..
            } => {
                if *stacks >= *threshold {
                    let burst = skills.iter().enumerate().find(|(i, skill)| {
                        skill.condition == SkillCondition::ManualTrigger && usable(*i)
                    });
                    if let Some((index, _)) = burst {
                        return Some(SkillChoice {
                            skill: index,
                            stack_multiplier: Some(Fixed::from_num(*stacks)),
                        });
                    }
                }
                first_automatic(skills, caster, attackers).map(plain)
            }
            Self::ConditionalFallback { primaries, fallback } => primaries
                .iter()
                .copied()
                .find(|&i| usable(i))
                .or_else(|| usable(*fallback).then_some(*fallback))
                .or_else(|| {
                    (0..skills.len()).find(|&i| {
                        i != *fallback
                            && !primaries.contains(&i)
                            && skills[i].condition != SkillCondition::ManualTrigger
                            && usable(i)
                    })
                })
                .map(plain),
        }
    }

    /// Record a completed passive attack.
    pub fn on_passive_hit(&mut self) {
        if let Self::StackingBurst { stacks, cap, .. } = self {
            *stacks = (*stacks + 1).min(*cap);
        }
    }

    /// Clear stored stacks after a burst.
    pub fn reset_stacks(&mut self) {
        if let Self::StackingBurst { stacks, .. } = self {
            *stacks = 0;
        }
    }

    /// Stored stacks, zero for policies that do not stack.
    #[must_use]
    pub fn stacks(&self) -> u32 {
        match self {
            Self::StackingBurst { stacks, .. } => *stacks,
            _ => 0,
        }
    }
}

fn first_automatic(skills: &[Skill], caster: &CasterView, attackers: &[Attacker]) -> Option<usize> {
    skills.iter().position(|skill| {
        skill.condition != SkillCondition::ManualTrigger && skill.can_use(caster, attackers)
    })
}
