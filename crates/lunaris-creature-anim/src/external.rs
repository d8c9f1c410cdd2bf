//! Collaborator interfaces consumed by the core but implemented elsewhere
//! (terrain, behavior/AI, physics/locomotion, timing). The core only ever
//! reads through these traits; it never owns or drives them.

use glam::Vec3;

use crate::activity::ActivityTriggers;

/// Result of a terrain height query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainSample {
    /// Ground height and surface normal at the queried point.
    Known { height: f32, normal: Vec3 },
    /// The terrain collaborator has no data yet (e.g. an async streaming
    /// chunk hasn't loaded). The core falls back to the last known height
    /// and marks the foot target as approximate
    /// ([`crate::error::AnimError::StaleTerrain`]).
    Unknown,
}

/// Foot/ground placement queries, implemented by the world/terrain system.
/// Must be non-blocking: `Unknown` is a legitimate, expected answer, not an
/// error.
pub trait TerrainSampler {
    /// Samples ground height and normal at a world-space `(x, z)`.
    fn height_at(&self, world_x: f32, world_z: f32) -> TerrainSample;
}

/// A `TerrainSampler` that always reports flat ground at `y = 0`, used by
/// tests and headless simulation when no real terrain system is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain;

impl TerrainSampler for FlatTerrain {
    fn height_at(&self, _world_x: f32, _world_z: f32) -> TerrainSample {
        TerrainSample::Known {
            height: 0.0,
            normal: Vec3::Y,
        }
    }
}

/// Per-creature drive outputs, refreshed each tick by the behavior/AI
/// collaborator. The core reads only `ActivityTriggers` from it; it never
/// evaluates goals, needs decay, or steering itself.
pub trait BrainOutputs {
    /// Returns this tick's triggers for a creature, or `None` if the
    /// collaborator has nothing new (the core keeps using the last value).
    fn triggers_for(&self, creature_id: u64) -> Option<ActivityTriggers>;
}

/// Per-creature kinematic state from the locomotion/physics collaborator:
/// used both to size the procedural step cycle and to drive secondary
/// motion's root-acceleration coupling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Forward-facing unit vector in world space.
    pub heading: Vec3,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            heading: Vec3::Z,
        }
    }
}

impl MotionState {
    /// Normalized locomotion speed in `[0, 1]`, relative to `max_speed`
    /// (body-units/second), used to pick a gait bracket.
    #[must_use]
    pub fn normalized_speed(&self, max_speed: f32) -> f32 {
        if max_speed <= 0.0 {
            return 0.0;
        }
        (self.velocity.length() / max_speed).clamp(0.0, 1.0)
    }
}

/// Monotonic per-tick timing source; the core never reads the wall clock
/// directly so that replays depend only on the `dt` stream supplied here.
pub trait Clock {
    /// Seconds elapsed since the previous tick.
    fn dt(&self) -> f32;
}

/// A `Clock` that always returns a fixed step, used by tests and the
/// demonstration binary.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub dt: f32,
}

impl Clock for FixedClock {
    fn dt(&self) -> f32 {
        self.dt
    }
}
