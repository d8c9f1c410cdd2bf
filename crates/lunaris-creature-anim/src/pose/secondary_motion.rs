//! C8 — Secondary Motion: damped-spring dynamics for passive bones (tail
//! segments, ears, wing tips, antennae).
//!
//! Persists across ticks (unlike [`super::SkeletonPose`]) and is reset on
//! teleport / large pose discontinuities per the entity lifecycle in §3.

use glam::Vec3;

use crate::rig::{LimbKind, RigDefinition};

/// Largest `dt` a single semi-implicit Euler step is considered stable for;
/// larger steps are sub-divided.
pub const MAX_STABLE_DT: f32 = 1.0 / 30.0;

const BASE_STIFNESS: f32 = 140.0;
const BASE_DAMPING_RATIO: f32 = 0.65;

/// Per-tick scale applied to every spring's stiffness/damping, written by
/// the Animation Driver's overlay (`secondaryMotionGains`) — e.g. Sleeping
/// loosens the tail, Threat Display stiffens it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryMotionGains {
    /// Multiplier on every spring's stiffness.
    pub stiffness_scale: f32,
    /// Multiplier on every spring's damping.
    pub damping_scale: f32,
}

impl Default for SecondaryMotionGains {
    fn default() -> Self {
        Self {
            stiffness_scale: 1.0,
            damping_scale: 1.0,
        }
    }
}

/// What kind of passive bone a spring entry animates; only `Tail` entries
/// respond to the overlay's wag amplitude/rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpringKind {
    Tail,
    Ear,
    WingTip,
    Antenna,
}

#[derive(Debug, Clone, PartialEq)]
struct SpringEntry {
    bone_idx: usize,
    kind: SpringKind,
    /// Fraction along its chain, 0 = root, 1 = tip; scales both inertial
    /// coupling and wag amplitude, since tip bones swing further than root
    /// bones for the same root acceleration.
    chain_fraction: f32,
    position: Vec3,
    velocity: Vec3,
    rest_offset: Vec3,
    stiffness: f32,
    damping: f32,
}

impl SpringEntry {
    fn new(rig: &RigDefinition, bone_idx: usize, kind: SpringKind, chain_fraction: f32) -> Self {
        let mass = rig.bones[bone_idx].mass.max(1e-3);
        let stiffness = BASE_STIFNESS / mass;
        let damping = 2.0 * stiffness.sqrt() * BASE_DAMPING_RATIO;
        Self {
            bone_idx,
            kind,
            chain_fraction,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rest_offset: Vec3::ZERO,
            stiffness,
            damping,
        }
    }
}

/// Per-creature, persistent spring state for every passive bone in its rig.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryMotionState {
    entries: Vec<SpringEntry>,
    last_root_velocity: Vec3,
    has_last_velocity: bool,
}

impl SecondaryMotionState {
    /// Builds one spring per tail segment, ear, wing tip, and antenna
    /// segment in `rig`.
    #[must_use]
    pub fn new(rig: &RigDefinition) -> Self {
        let mut entries = Vec::new();

        if let Some(tail) = &rig.tail_chain {
            let len = tail.len().max(1);
            for (i, &idx) in tail.iter().enumerate() {
                let fraction = (i + 1) as f32 / len as f32;
                entries.push(SpringEntry::new(rig, idx, SpringKind::Tail, fraction));
            }
        }
        for &idx in &rig.feature_bones.ear_roots {
            entries.push(SpringEntry::new(rig, idx, SpringKind::Ear, 1.0));
        }
        for chain in &rig.feature_bones.antennae_chains {
            let len = chain.len().max(1);
            for (i, &idx) in chain.iter().enumerate() {
                let fraction = (i + 1) as f32 / len as f32;
                entries.push(SpringEntry::new(rig, idx, SpringKind::Antenna, fraction));
            }
        }
        for limb in &rig.limbs {
            if limb.kind == LimbKind::Wing {
                if let Some(&tip) = limb.segment_idxs.last() {
                    entries.push(SpringEntry::new(rig, tip, SpringKind::WingTip, 1.0));
                }
            }
        }

        Self {
            entries,
            last_root_velocity: Vec3::ZERO,
            has_last_velocity: false,
        }
    }

    /// Number of passive bones tracked (for tests and debug tooling).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this rig has no passive bones at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears every spring to rest and forgets the last root velocity, as
    /// required after a teleport or other large pose discontinuity — without
    /// this, the next tick's acceleration estimate would spike from the
    /// position jump rather than genuine motion.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.position = Vec3::ZERO;
            entry.velocity = Vec3::ZERO;
        }
        self.has_last_velocity = false;
    }

    /// Integrates every spring forward by `dt`, sub-dividing into
    /// [`MAX_STABLE_DT`]-sized steps when `dt` exceeds it.
    ///
    /// `root_velocity` drives the inertial impulse via its frame-over-frame
    /// delta (acceleration), per the spec's resolution of the root-motion
    /// open question. `tail_wag` is `(amplitude, rate_hz)` from the
    /// overlay, or `None` when no activity is driving tail motion.
    /// `elapsed` is the creature's running clock, used for the wag's phase.
    pub fn integrate(
        &mut self,
        dt: f32,
        root_velocity: Vec3,
        gains: SecondaryMotionGains,
        tail_wag: Option<(f32, f32)>,
        elapsed: f32,
    ) {
        if dt <= 0.0 {
            return;
        }
        let root_accel = if self.has_last_velocity {
            (root_velocity - self.last_root_velocity) / dt
        } else {
            Vec3::ZERO
        };
        self.last_root_velocity = root_velocity;
        self.has_last_velocity = true;

        let steps = (dt / MAX_STABLE_DT).ceil().max(1.0) as u32;
        let sub_dt = dt / steps as f32;

        for step in 0..steps {
            let step_time = elapsed + sub_dt * step as f32;
            for entry in &mut self.entries {
                let inertial_force = -root_accel * entry.chain_fraction * 0.2;
                let wag_force = match (entry.kind, tail_wag) {
                    (SpringKind::Tail, Some((amplitude, rate))) => {
                        let phase = std::f32::consts::TAU * rate * step_time;
                        Vec3::new(phase.sin() * amplitude * entry.chain_fraction, 0.0, 0.0)
                    }
                    _ => Vec3::ZERO,
                };
                let driver_force = inertial_force + wag_force;

                let stiffness = entry.stiffness * gains.stiffness_scale;
                let damping = entry.damping * gains.damping_scale;
                let accel = stiffness * (entry.rest_offset - entry.position) - damping * entry.velocity + driver_force;
                entry.velocity += accel * sub_dt;
                entry.position += entry.velocity * sub_dt;
            }
        }
    }

    /// The current spring offset for `bone_idx`, in parent-local space, or
    /// `None` if that bone has no passive spring.
    #[must_use]
    pub fn offset_for_bone(&self, bone_idx: usize) -> Option<Vec3> {
        self.entries.iter().find(|e| e.bone_idx == bone_idx).map(|e| e.position)
    }

    /// Every bone index carrying a passive spring, for callers that need to
    /// apply offsets back onto a pose.
    pub fn bone_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.bone_idx)
    }
}
