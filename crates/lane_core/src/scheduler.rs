//! Wave spawn timing.
//!
//! A wave is a list of segments played back in order. Each segment emits
//! `count` attackers, one every `interval` ticks, picked from its archetype
//! set. Spawn positions and random archetype picks come from a seeded
//! `ChaCha8Rng`, so the same seed always yields the same wave.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::data::{SpawnSegment, WaveDefinition};
use crate::math::{Fixed, Vec2Fixed};

/// Where new attackers may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnArea {
    /// Spawn x (left of the visible field).
    pub x: Fixed,
    /// Lowest spawn y.
    pub min_y: Fixed,
    /// Highest spawn y.
    pub max_y: Fixed,
}

/// An attacker the match should create this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Attacker archetype id.
    pub archetype: String,
    /// Spawn position.
    pub position: Vec2Fixed,
}

/// Plays back one wave.
#[derive(Debug, Clone)]
pub struct WaveScheduler {
    segments: Vec<SpawnSegment>,
    segment_index: usize,
    emitted: u32,
    timer: u32,
    rng: ChaCha8Rng,
}

impl WaveScheduler {
    /// Scheduler for `wave` seeded with `seed`.
    #[must_use]
    pub fn new(wave: &WaveDefinition, seed: u64) -> Self {
        Self {
            segments: wave.segments.clone(),
            segment_index: 0,
            emitted: 0,
            timer: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Whether every segment has emitted all of its attackers.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.segment_index >= self.segments.len()
    }

    /// Index of the segment currently emitting.
    #[must_use]
    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// Attackers emitted by the current segment so far.
    #[must_use]
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Advance one tick, returning an attacker to spawn if one is due.
    pub fn tick(&mut self, area: &SpawnArea) -> Option<SpawnRequest> {
        self.skip_exhausted();
        let segment = self.segments.get(self.segment_index)?;

        self.timer += 1;
        if self.timer < segment.interval {
            return None;
        }
        self.timer = 0;

        let archetype = segment.attackers.choose(&mut self.rng)?.clone();
        let y = if area.max_y > area.min_y {
            let bits = self
                .rng
                .gen_range(area.min_y.to_bits()..=area.max_y.to_bits());
            Fixed::from_bits(bits)
        } else {
            area.min_y
        };

        self.emitted += 1;
        debug!(
            segment = self.segment_index,
            emitted = self.emitted,
            archetype = %archetype,
            "Scheduled spawn"
        );
        if self.emitted >= segment.count {
            self.advance();
        }

        Some(SpawnRequest {
            archetype,
            position: Vec2Fixed::new(area.x, y),
        })
    }

    fn skip_exhausted(&mut self) {
        while let Some(segment) = self.segments.get(self.segment_index) {
            if self.emitted < segment.count && !segment.attackers.is_empty() {
                break;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.segment_index += 1;
        self.emitted = 0;
        self.timer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> SpawnArea {
        SpawnArea {
            x: Fixed::from_num(-40),
            min_y: Fixed::from_num(20),
            max_y: Fixed::from_num(580),
        }
    }

    fn wave(segments: Vec<SpawnSegment>) -> WaveDefinition {
        WaveDefinition {
            name: "test".to_string(),
            segments,
        }
    }

    fn segment(attackers: &[&str], count: u32, interval: u32) -> SpawnSegment {
        SpawnSegment {
            attackers: attackers.iter().map(|s| (*s).to_string()).collect(),
            count,
            interval,
        }
    }

    #[test]
    fn test_segment_spawns_on_interval() {
        let mut scheduler = WaveScheduler::new(&wave(vec![segment(&["BASIC"], 5, 50)]), 1);
        let mut spawn_ticks = Vec::new();

        for tick in 1..=400u32 {
            if let Some(request) = scheduler.tick(&area()) {
                assert_eq!(request.archetype, "BASIC");
                assert_eq!(request.position.x, Fixed::from_num(-40));
                assert!(request.position.y >= Fixed::from_num(20));
                assert!(request.position.y <= Fixed::from_num(580));
                spawn_ticks.push(tick);
            }
        }

        assert_eq!(spawn_ticks, vec![50, 100, 150, 200, 250]);
        assert!(scheduler.is_exhausted());
    }

    #[test]
    fn test_segments_play_in_order_with_fresh_timer() {
        let mut scheduler = WaveScheduler::new(
            &wave(vec![segment(&["FAST"], 2, 10), segment(&["TANK"], 1, 30)]),
            7,
        );
        let mut spawns = Vec::new();
        for tick in 1..=100u32 {
            if let Some(request) = scheduler.tick(&area()) {
                spawns.push((tick, request.archetype));
            }
        }
        assert_eq!(
            spawns,
            vec![
                (10, "FAST".to_string()),
                (20, "FAST".to_string()),
                (50, "TANK".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let mut scheduler = WaveScheduler::new(
            &wave(vec![segment(&["BASIC"], 0, 10), segment(&[], 3, 10)]),
            1,
        );
        assert_eq!(scheduler.tick(&area()), None);
        assert!(scheduler.is_exhausted());
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let def = wave(vec![segment(&["BASIC", "FAST", "TANK"], 20, 3)]);
        let run = |seed| {
            let mut scheduler = WaveScheduler::new(&def, seed);
            (0..100)
                .filter_map(|_| scheduler.tick(&area()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
        assert_eq!(run(42).len(), 20);
    }
}
