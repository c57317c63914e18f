//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    /// Per-tick slerp factor for smoothed rotation.
    pub rotate_blend: f32,
    /// Half-width of the forward box probe, world units.
    pub probe_half_width: f32,
    /// Delay between projectiles of one cannon burst, seconds.
    pub burst_shot_interval: f32,
    /// Number of slice buckets the enemy think registry is spread over.
    pub enemy_slice_count: usize,
    /// Where a carried collectable sits relative to the collector.
    pub carry_offset: Vec2,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            rotate_blend: 0.15,
            probe_half_width: 24.0,
            burst_shot_interval: 0.125,
            enemy_slice_count: 4,
            carry_offset: Vec2::new(0.0, 22.0),
        }
    }
}
