//! Match configuration.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::scheduler::SpawnArea;

/// Field geometry, wall, limits and seed for one match.
///
/// Every field has a default, so a RON file only needs to list overrides:
///
/// ```ron
/// MatchConfig(seed: 7, wall_hp: 500.0)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Field width.
    #[serde(with = "fixed_serde")]
    pub field_width: Fixed,

    /// Field height.
    #[serde(with = "fixed_serde")]
    pub field_height: Fixed,

    /// Wall hit points.
    #[serde(with = "fixed_serde")]
    pub wall_hp: Fixed,

    /// Distance of the wall from the right edge.
    #[serde(with = "fixed_serde")]
    pub wall_offset: Fixed,

    /// X coordinate where attackers appear.
    #[serde(with = "fixed_serde")]
    pub spawn_x: Fixed,

    /// Keep-out margin at the top and bottom edges for spawns.
    #[serde(with = "fixed_serde")]
    pub spawn_margin: Fixed,

    /// Maximum roster size.
    pub roster_cap: usize,

    /// Log lines retained.
    pub message_log_capacity: usize,

    /// Points at match start.
    pub starting_points: u32,

    /// Seed for spawn randomness.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            field_width: Fixed::from_num(800),
            field_height: Fixed::from_num(600),
            wall_hp: Fixed::from_num(2000),
            wall_offset: Fixed::from_num(20),
            spawn_x: Fixed::from_num(-40),
            spawn_margin: Fixed::from_num(20),
            roster_cap: 4,
            message_log_capacity: 100,
            starting_points: 100,
            seed: 0x1A4E_DEF5,
        }
    }
}

impl MatchConfig {
    /// Wall position: offset from the right edge, vertically centred.
    #[must_use]
    pub fn wall_position(&self) -> Vec2Fixed {
        Vec2Fixed::new(
            self.field_width - self.wall_offset,
            self.field_height / Fixed::from_num(2),
        )
    }

    /// Where the scheduler may place new attackers.
    #[must_use]
    pub fn spawn_area(&self) -> SpawnArea {
        SpawnArea {
            x: self.spawn_x,
            min_y: self.spawn_margin,
            max_y: self.field_height - self.spawn_margin,
        }
    }

    /// Whether `position` lies on the field (inclusive).
    #[must_use]
    pub fn in_bounds(&self, position: Vec2Fixed) -> bool {
        position.x >= Fixed::ZERO
            && position.x <= self.field_width
            && position.y >= Fixed::ZERO
            && position.y <= self.field_height
    }
}
