//! C5 — Animation Driver.
//!
//! Turns `(ActivityState, creature kinematic data, environment hints)` into
//! a structured [`PoseOverlay`] the Pose Compositor (C7) blends onto the
//! locomotion base pose, plus the locomotion base pose itself (procedural
//! step cycle / spine undulation / wing flap, sized by body length and
//! speed and keyed by [`GaitTable`]).

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::activity::{ActivityState, ActivityType};
use crate::debug::DebugCounters;
use crate::external::{MotionState, TerrainSample, TerrainSampler};
use crate::genes::MorphologyGenes;
use crate::pose::{SecondaryMotionGains, SkeletonPose};
use crate::rig::{LimbKind, RigCategory, RigDefinition};
use crate::rig::GaitTable;

/// A single limb's IK target, keyed by its index into [`RigDefinition::limbs`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbTarget {
    pub world_pos: Vec3,
    pub blend_weight: f32,
}

/// The structured pose overlay the driver emits each tick, consumed by
/// [`crate::pose::compose`].
#[derive(Debug, Clone, PartialEq)]
pub struct PoseOverlay {
    pub body_offset: Vec3,
    pub body_rotation: Quat,
    /// World-space head aim target, fed to the neck-head FABRIK chain.
    pub head_target: Option<Vec3>,
    /// Sparse per-limb IK targets, keyed by the limb's index in `rig.limbs`.
    pub limb_targets: HashMap<usize, LimbTarget>,
    /// Spine coiling/arching bias, applied uniformly across the spine chain.
    pub spine_curve_bias: f32,
    pub tail_wag_amplitude: f32,
    pub tail_wag_rate: f32,
    pub ear_perk: f32,
    pub mouth_open: f32,
    pub secondary_motion_gains: SecondaryMotionGains,
    /// Equal to `ActivityState::blend_weight` at the tick this overlay was
    /// built; carried alongside rather than re-read, since the compositor
    /// shouldn't need the full `ActivityState` just to scale fields.
    pub overlay_blend_weight: f32,
}

impl PoseOverlay {
    /// A neutral overlay: no offsets, no targets, zero blend.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            body_offset: Vec3::ZERO,
            body_rotation: Quat::IDENTITY,
            head_target: None,
            limb_targets: HashMap::new(),
            spine_curve_bias: 0.0,
            tail_wag_amplitude: 0.0,
            tail_wag_rate: 0.0,
            ear_perk: 0.0,
            mouth_open: 0.0,
            secondary_motion_gains: SecondaryMotionGains::default(),
            overlay_blend_weight: 0.0,
        }
    }
}

const MOUTH_OPEN_RATE_HZ: f32 = 3.0;
const VOCALIZE_RATE_HZ: f32 = 5.0;
const MATING_RATE_HZ: f32 = 1.0;

/// Builds this tick's overlay for `activity`, given the creature's current
/// blend weight, morphology, and rig category (used to pick mammal-vs-reptile
/// variants of otherwise-identical activities, e.g. `Sleeping`'s spine curl).
#[must_use]
pub fn build_overlay(activity: ActivityType, state: &ActivityState, genes: &MorphologyGenes, rig: &RigDefinition, elapsed: f32) -> PoseOverlay {
    let mut overlay = PoseOverlay::neutral();
    overlay.overlay_blend_weight = state.blend_weight;

    match activity {
        ActivityType::Eating => {
            if let Some(target) = state.target {
                overlay.head_target = Some(target - Vec3::Y * genes.head_size * 0.2);
            }
            overlay.mouth_open = (elapsed * MOUTH_OPEN_RATE_HZ * TAU).sin().abs();
            overlay.body_offset = Vec3::Z * genes.body_length * 0.05;
        }
        ActivityType::Drinking => {
            if let Some(target) = state.target {
                overlay.head_target = Some(target);
            }
            overlay.body_offset = -Vec3::Y * genes.body_height * 0.1;
        }
        ActivityType::Sleeping => {
            overlay.body_offset = -Vec3::Y * genes.body_height * 0.4;
            overlay.body_rotation = Quat::from_rotation_x(-0.2);
            overlay.spine_curve_bias = if matches!(rig.category, RigCategory::Serpentine | RigCategory::Fish) {
                0.3
            } else {
                -0.6
            };
            overlay.secondary_motion_gains = SecondaryMotionGains {
                stiffness_scale: 0.5,
                damping_scale: 1.5,
            };
        }
        ActivityType::ThreatDisplay => {
            overlay.spine_curve_bias = 0.5;
            overlay.body_offset = Vec3::Y * genes.body_height * 0.2;
            overlay.ear_perk = 1.0;
            overlay.mouth_open = 0.6;
            overlay.secondary_motion_gains = SecondaryMotionGains {
                stiffness_scale: 1.8,
                damping_scale: 0.7,
            };
        }
        ActivityType::Mating => {
            if let Some(target) = state.target {
                overlay.head_target = Some(target);
            }
            let phase = (elapsed * MATING_RATE_HZ * TAU).sin();
            overlay.body_offset = Vec3::Z * genes.body_length * 0.08 * phase;
        }
        ActivityType::Excretion => {
            overlay.body_offset = -Vec3::Y * genes.body_height * 0.15;
            overlay.spine_curve_bias = -0.2;
        }
        ActivityType::Grooming => {
            overlay.ear_perk = 0.3;
            overlay.spine_curve_bias = -0.3;
        }
        ActivityType::Vocalizing => {
            overlay.mouth_open = (elapsed * VOCALIZE_RATE_HZ * TAU).sin().abs();
            overlay.ear_perk = 0.5;
        }
        ActivityType::Alert => {
            overlay.ear_perk = 1.0;
            overlay.body_rotation = Quat::from_rotation_x(0.05);
        }
        ActivityType::Resting => {
            overlay.body_offset = -Vec3::Y * genes.body_height * 0.2;
            overlay.spine_curve_bias = -0.2;
            overlay.secondary_motion_gains = SecondaryMotionGains {
                stiffness_scale: 0.7,
                damping_scale: 1.2,
            };
        }
        ActivityType::Idle | ActivityType::Locomotion => {
            overlay.tail_wag_amplitude = 0.1;
            overlay.tail_wag_rate = 1.0;
        }
    }

    overlay
}

const UNDULATION_FREQ_HZ: f32 = 1.5;
const UNDULATION_PHASE_STEP: f32 = 0.6;
const UNDULATION_AMPLITUDE: f32 = 0.35;
const FLAP_FREQ_HZ: f32 = 4.0;
const FLAP_AMPLITUDE: f32 = 0.5;
const STRIDE_FREQ_HZ: f32 = 1.0;
const SWING_LIFT_FRACTION: f32 = 0.15;

/// Builds the locomotion sub-mode's base pose: the bind pose for a
/// stationary/legged rig, or a traveling spine/wing wave for undulating and
/// flapping gaits. Foot planting for legged rigs is NOT applied here — it's
/// expressed as limb IK targets (see [`locomotion_limb_targets`]) that the
/// compositor solves on top of this base.
#[must_use]
pub fn base_locomotion_pose(rig: &RigDefinition, gait_table: &GaitTable, motion: &MotionState, elapsed: f32, max_speed: f32) -> SkeletonPose {
    let mut pose = SkeletonPose::bind_pose(rig);
    let speed = motion.normalized_speed(max_speed);
    let Some(gait) = gait_table.select_gait(rig.category, speed) else {
        return pose;
    };

    if gait.name == "swim-undulation" {
        apply_spine_undulation(&mut pose, rig, elapsed, speed);
    } else if gait.name == "flap" {
        apply_wing_flap(&mut pose, rig, elapsed, speed);
    }
    pose.mark_dirty();
    pose
}

fn apply_spine_undulation(pose: &mut SkeletonPose, rig: &RigDefinition, elapsed: f32, speed: f32) {
    let drive = speed.max(0.15);
    for (i, &bone_idx) in rig.spine_chain.iter().enumerate() {
        let phase = elapsed * UNDULATION_FREQ_HZ * drive * TAU + i as f32 * UNDULATION_PHASE_STEP;
        let angle = UNDULATION_AMPLITUDE * drive * phase.sin();
        pose.locals[bone_idx].rotation *= Quat::from_axis_angle(Vec3::Y, angle);
    }
}

fn apply_wing_flap(pose: &mut SkeletonPose, rig: &RigDefinition, elapsed: f32, speed: f32) {
    let drive = 0.3 + 0.7 * speed;
    let phase = elapsed * FLAP_FREQ_HZ * drive * TAU;
    let angle = FLAP_AMPLITUDE * phase.sin();
    for limb in &rig.limbs {
        if limb.kind != LimbKind::Wing {
            continue;
        }
        for &bone_idx in &limb.segment_idxs {
            pose.locals[bone_idx].rotation *= Quat::from_axis_angle(Vec3::Z, angle);
        }
    }
}

/// Computes this tick's foot-placement IK targets for every leg limb, via
/// gait phase and the `TerrainSampler` collaborator (§6). Returns an empty
/// map for rigs with no gait entry (serpentine/fish undulate instead; their
/// base pose already carries the motion).
#[must_use]
pub fn locomotion_limb_targets(
    rig: &RigDefinition,
    gait_table: &GaitTable,
    motion: &MotionState,
    terrain: &dyn TerrainSampler,
    elapsed: f32,
    body_length: f32,
    max_speed: f32,
    debug: &mut DebugCounters,
) -> HashMap<usize, LimbTarget> {
    let mut targets = HashMap::new();
    let speed = motion.normalized_speed(max_speed);
    let Some(gait) = gait_table.select_gait(rig.category, speed) else {
        return targets;
    };
    if gait.limb_phase_offsets.is_empty() {
        return targets;
    }

    let forward = if motion.heading.length_squared() > 1e-8 {
        motion.heading.normalize()
    } else {
        Vec3::Z
    };
    let world_rotation = Quat::from_rotation_arc(Vec3::Z, forward);
    let stride_len = gait.stride_scale * body_length * 0.3;
    let lift_height = body_length * SWING_LIFT_FRACTION;

    let mut leg_idx = 0usize;
    for (limb_idx, limb) in rig.limbs.iter().enumerate() {
        if !matches!(limb.kind, LimbKind::FrontLeg | LimbKind::BackLeg) {
            continue;
        }
        let Some(&phase_offset) = gait.limb_phase_offsets.get(leg_idx) else {
            leg_idx += 1;
            continue;
        };
        leg_idx += 1;

        let foot_rest_local = rig.bones[limb.end_effector_idx].inverse_bind.inverse().translation;
        let foot_rest_world = motion.position + world_rotation * foot_rest_local;

        let cycle = elapsed * speed.max(0.05) * STRIDE_FREQ_HZ + phase_offset;
        let frac = cycle.rem_euclid(1.0);
        let duty = gait.duty_factor.clamp(0.05, 0.95);

        let (forward_offset, lift) = if frac < duty {
            let stance_t = frac / duty;
            (stride_len * (0.5 - stance_t), 0.0)
        } else {
            let swing_t = (frac - duty) / (1.0 - duty);
            (stride_len * (-0.5 + swing_t), lift_height * (swing_t * std::f32::consts::PI).sin())
        };

        let planar = foot_rest_world + forward * forward_offset;
        let ground_y = match terrain.height_at(planar.x, planar.z) {
            TerrainSample::Known { height, .. } => height,
            TerrainSample::Unknown => {
                debug.record_stale_terrain();
                foot_rest_world.y
            }
        };

        targets.insert(
            limb_idx,
            LimbTarget {
                world_pos: Vec3::new(planar.x, ground_y + lift, planar.z),
                blend_weight: 1.0,
            },
        );
    }

    targets
}
