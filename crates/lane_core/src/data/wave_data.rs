//! Wave definitions.

use serde::{Deserialize, Serialize};

/// One batch of spawns within a wave.
///
/// # Example RON
///
/// ```ron
/// SpawnSegment(attackers: ["BASIC"], count: 5, interval: 50)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnSegment {
    /// Archetype ids; each spawn picks one at random when more than one is listed.
    pub attackers: Vec<String>,

    /// Attackers to emit.
    pub count: u32,

    /// Ticks between spawns.
    pub interval: u32,
}

/// An ordered list of spawn segments fought in one battle phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Display name.
    pub name: String,

    /// Segments in playback order.
    pub segments: Vec<SpawnSegment>,
}

impl WaveDefinition {
    /// Total attackers the wave emits.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.segments.iter().map(|s| s.count).sum()
    }
}
