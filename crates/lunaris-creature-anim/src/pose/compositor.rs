//! C7 — Pose Compositor: blends the locomotion base pose, the driver's
//! overlay, and the IK solvers (C6) into a final [`SkeletonPose`], then
//! hands the result through secondary motion (C8).

use std::collections::HashMap;
use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::debug::DebugCounters;
use crate::driver::PoseOverlay;
use crate::ik::{solve_fabrik, solve_two_bone, SolverKind, IK_EPSILON, MAX_IK_ITERATIONS};
use crate::rig::{BoneKind, RigDefinition};
use crate::transform::Transform;

use super::secondary_motion::SecondaryMotionState;
use super::skeleton_pose::SkeletonPose;

/// Per-limb pole vectors and the head chain's pole vector, supplied by the
/// caller (typically derived from the creature's forward/up vectors) to
/// disambiguate which way a two-bone or FABRIK chain bends.
#[derive(Debug, Clone, Default)]
pub struct IkTargets {
    pub pole_vectors: HashMap<usize, Vec3>,
}

/// Composes a final [`SkeletonPose`] from a locomotion base pose, this
/// tick's overlay, and this tick's IK/pole inputs, then integrates secondary
/// motion and normalizes rotations — the seven ordered steps of §4.7.
///
/// `root_velocity` and `elapsed` feed C8's inertial coupling and tail-wag
/// phase; `dt` is the tick's step, sub-divided internally if it exceeds
/// [`super::secondary_motion::MAX_STABLE_DT`].
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn compose(
    rig: &RigDefinition,
    base_pose: &SkeletonPose,
    overlay: &PoseOverlay,
    ik_targets: &IkTargets,
    secondary_motion: &mut SecondaryMotionState,
    root_velocity: Vec3,
    dt: f32,
    elapsed: f32,
    debug: &mut DebugCounters,
) -> SkeletonPose {
    let mut pose = base_pose.clone();
    let blend = overlay.overlay_blend_weight.clamp(0.0, 1.0);

    apply_body_offset(&mut pose, overlay, blend);
    apply_spine_curve_bias(&mut pose, rig, overlay.spine_curve_bias);
    pose.mark_dirty();

    apply_limb_ik(&mut pose, rig, overlay, ik_targets, debug);
    apply_head_ik(&mut pose, rig, overlay, ik_targets, debug);
    pose.mark_dirty();

    apply_secondary_motion(&mut pose, overlay, secondary_motion, root_velocity, dt, elapsed);

    pose.renormalize_rotations();
    pose
}

fn apply_body_offset(pose: &mut SkeletonPose, overlay: &PoseOverlay, blend: f32) {
    pose.locals[0].translation += overlay.body_offset * blend;
    pose.locals[0].rotation = Quat::IDENTITY.slerp(overlay.body_rotation, blend) * pose.locals[0].rotation;
}

fn apply_spine_curve_bias(pose: &mut SkeletonPose, rig: &RigDefinition, bias: f32) {
    if bias == 0.0 || rig.spine_chain.is_empty() {
        return;
    }
    let per_bone = bias / rig.spine_chain.len() as f32;
    for &bone_idx in &rig.spine_chain {
        pose.locals[bone_idx].rotation *= Quat::from_axis_angle(Vec3::X, per_bone);
    }
}

/// Rotates `aiming_bone_idx`'s local orientation so that its bind-pose child
/// offset (`bind_child_translation`, in the aiming bone's local frame)
/// points toward `new_world_dir` given the aiming bone's `parent_world_rot`.
/// The bone's twist around that direction is left at whatever the arc
/// rotation produces — under-determined for a single aim, same as any
/// other aim-only IK step.
fn aim_local_rotation(parent_world_rot: Quat, bind_child_translation: Vec3, new_world_dir: Vec3) -> Quat {
    if bind_child_translation.length_squared() < 1e-12 || new_world_dir.length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    let bind_dir = bind_child_translation.normalize();
    let local_target_dir = (parent_world_rot.inverse() * new_world_dir).normalize();
    Quat::from_rotation_arc(bind_dir, local_target_dir)
}

/// Applies solved world positions for `segment_idxs[1..]` by rotating every
/// bone in `segment_idxs[..len-1]` to aim at its child's solved position.
/// `solved_positions` must have exactly `segment_idxs.len() - 1` entries.
fn apply_chain_rotations(pose: &mut SkeletonPose, rig: &RigDefinition, globals: &[Transform], segment_idxs: &[usize], solved_positions: &[Vec3]) {
    let anchor_idx = segment_idxs[0];
    let mut parent_rotation = match rig.bones[anchor_idx].parent {
        Some(p) => globals[p].rotation,
        None => Quat::IDENTITY,
    };
    let mut prev_world_pos = globals[anchor_idx].translation;

    for (i, &bone_idx) in segment_idxs.iter().enumerate().skip(1) {
        let target_pos = solved_positions[i - 1];
        let aiming_bone_idx = segment_idxs[i - 1];
        let bind_dir = rig.bones[bone_idx].local_bind.translation;
        let local_rot = aim_local_rotation(parent_rotation, bind_dir, target_pos - prev_world_pos);
        pose.locals[aiming_bone_idx].rotation = local_rot;
        parent_rotation *= local_rot;
        prev_world_pos = target_pos;
    }
}

fn segment_lengths(rig: &RigDefinition, segment_idxs: &[usize]) -> Vec<f32> {
    segment_idxs.iter().map(|&idx| rig.bones[idx].local_bind.translation.length()).collect()
}

fn apply_limb_ik(pose: &mut SkeletonPose, rig: &RigDefinition, overlay: &PoseOverlay, ik_targets: &IkTargets, debug: &mut DebugCounters) {
    let mut limb_idxs: Vec<usize> = overlay.limb_targets.keys().copied().collect();
    limb_idxs.sort_unstable();

    for limb_idx in limb_idxs {
        let Some(limb) = rig.limbs.get(limb_idx) else { continue };
        let Some(target) = overlay.limb_targets.get(&limb_idx) else { continue };
        let globals = pose.global_transforms(rig).to_vec();
        let anchor_idx = limb.segment_idxs[0];
        let anchor = globals[anchor_idx].translation;
        let pole = ik_targets.pole_vectors.get(&limb_idx).copied().unwrap_or(Vec3::Z);
        let lengths = segment_lengths(rig, &limb.segment_idxs[1..]);
        let base_positions: Vec<Vec3> = limb.segment_idxs[1..].iter().map(|&idx| globals[idx].translation).collect();

        let chain_name = format!("limb_{limb_idx}");
        let blended = match SolverKind::for_chain_len(limb.segment_idxs.len()) {
            SolverKind::Aim => {
                let dir = (target.world_pos - anchor).normalize_or_zero();
                if dir == Vec3::ZERO {
                    debug.record_ik_degenerate(&chain_name);
                    continue;
                }
                let solved = anchor + dir * lengths[0];
                vec![base_positions[0].lerp(solved, target.blend_weight)]
            }
            SolverKind::TwoBone => {
                let max_flex = rig.bones[limb.segment_idxs[1]].joint_limits.max_angle[0];
                match solve_two_bone(anchor, lengths[0], lengths[1], target.world_pos, pole, max_flex) {
                    Some(outcome) => {
                        debug.record_ik_residual(limb_idx, outcome.residual);
                        vec![
                            base_positions[0].lerp(outcome.mid, target.blend_weight),
                            base_positions[1].lerp(outcome.end, target.blend_weight),
                        ]
                    }
                    None => {
                        debug.record_ik_degenerate(&chain_name);
                        continue;
                    }
                }
            }
            SolverKind::Fabrik => {
                let bend_limits: Vec<f32> = limb.segment_idxs[1..].iter().map(|&idx| rig.bones[idx].joint_limits.max_angle[0]).collect();
                match solve_fabrik(anchor, &base_positions, &lengths, &bend_limits, target.world_pos, IK_EPSILON, MAX_IK_ITERATIONS) {
                    Some(outcome) => {
                        debug.record_ik_residual(limb_idx, outcome.residual);
                        base_positions
                            .iter()
                            .zip(outcome.positions.iter())
                            .map(|(base, solved)| base.lerp(*solved, target.blend_weight))
                            .collect()
                    }
                    None => {
                        debug.record_ik_degenerate(&chain_name);
                        continue;
                    }
                }
            }
        };

        apply_chain_rotations(pose, rig, &globals, &limb.segment_idxs, &blended);
    }
}

/// Finds the root-to-head bone chain, excluding the first spine bone before
/// the neck (used as the FABRIK anchor) — i.e. the anchor plus every
/// contiguous `Neck`/`Head` bone at the head end of `spine_chain`.
fn head_chain(rig: &RigDefinition) -> Option<Vec<usize>> {
    let pelvis_to_head: Vec<usize> = rig.spine_chain.iter().rev().copied().collect();
    let first_head_pos = pelvis_to_head.iter().position(|&idx| matches!(rig.bones[idx].kind, BoneKind::Neck | BoneKind::Head))?;
    let anchor_pos = first_head_pos.checked_sub(1)?;
    Some(pelvis_to_head[anchor_pos..].to_vec())
}

fn apply_head_ik(pose: &mut SkeletonPose, rig: &RigDefinition, overlay: &PoseOverlay, _ik_targets: &IkTargets, debug: &mut DebugCounters) {
    let Some(target) = overlay.head_target else { return };
    let Some(chain) = head_chain(rig) else { return };
    if chain.len() < 2 {
        return;
    }

    let globals = pose.global_transforms(rig).to_vec();
    let anchor = globals[chain[0]].translation;
    let lengths = segment_lengths(rig, &chain[1..]);
    let base_positions: Vec<Vec3> = chain[1..].iter().map(|&idx| globals[idx].translation).collect();
    let bend_limits: Vec<f32> = chain[1..].iter().map(|&idx| rig.bones[idx].joint_limits.max_angle[0].max(PI * 0.5)).collect();

    match solve_fabrik(anchor, &base_positions, &lengths, &bend_limits, target, IK_EPSILON, MAX_IK_ITERATIONS) {
        Some(outcome) => {
            debug.record_ik_residual(usize::MAX, outcome.residual);
            apply_chain_rotations(pose, rig, &globals, &chain, &outcome.positions);
        }
        None => debug.record_ik_degenerate("head"),
    }
}

fn apply_secondary_motion(
    pose: &mut SkeletonPose,
    overlay: &PoseOverlay,
    secondary_motion: &mut SecondaryMotionState,
    root_velocity: Vec3,
    dt: f32,
    elapsed: f32,
) {
    let tail_wag = if overlay.tail_wag_amplitude > 0.0 {
        Some((overlay.tail_wag_amplitude, overlay.tail_wag_rate))
    } else {
        None
    };
    secondary_motion.integrate(dt, root_velocity, overlay.secondary_motion_gains, tail_wag, elapsed);

    let bone_idxs: Vec<usize> = secondary_motion.bone_indices().collect();
    for bone_idx in bone_idxs {
        if let Some(offset) = secondary_motion.offset_for_bone(bone_idx) {
            if bone_idx < pose.locals.len() {
                pose.locals[bone_idx].translation += offset;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{build_overlay, LimbTarget};
    use crate::activity::ActivityState;
    use crate::genes::MorphologyGenes;
    use crate::rig::{build, JointLimitTable, RigBuildOptions};

    fn quadruped_rig() -> RigDefinition {
        let mut genes = MorphologyGenes::default();
        genes.leg_pairs = 2;
        build(&genes, &JointLimitTable::default(), RigBuildOptions::NONE).unwrap()
    }

    #[test]
    fn compose_with_no_targets_stays_at_bind_pose_plus_offset() {
        let rig = quadruped_rig();
        let base = SkeletonPose::bind_pose(&rig);
        let state = ActivityState::default();
        let genes = MorphologyGenes::default();
        let overlay = build_overlay(crate::activity::ActivityType::Idle, &state, &genes, &rig, 0.0);
        let ik = IkTargets::default();
        let mut springs = SecondaryMotionState::new(&rig);
        let mut debug = DebugCounters::default();
        let result = compose(&rig, &base, &overlay, &ik, &mut springs, Vec3::ZERO, 1.0 / 60.0, 0.0, &mut debug);
        assert!(result.locals.iter().all(|t| t.rotation.is_finite() && t.translation.is_finite()));
    }

    #[test]
    fn limb_ik_target_moves_end_effector_toward_target() {
        let rig = quadruped_rig();
        let base = SkeletonPose::bind_pose(&rig);
        let state = ActivityState::default();
        let genes = MorphologyGenes::default();
        let mut overlay = build_overlay(crate::activity::ActivityType::Locomotion, &state, &genes, &rig, 0.0);
        let limb_idx = 0;
        let limb = &rig.limbs[limb_idx];
        let mut base_pose = SkeletonPose::bind_pose(&rig);
        let base_end = base_pose.global_transforms(&rig)[limb.end_effector_idx];
        let target_pos = base_end.translation + Vec3::new(0.05, -0.1, 0.05);
        overlay.limb_targets.insert(limb_idx, LimbTarget { world_pos: target_pos, blend_weight: 1.0 });

        let ik = IkTargets::default();
        let mut springs = SecondaryMotionState::new(&rig);
        let mut debug = DebugCounters::default();
        let mut result = compose(&rig, &base, &overlay, &ik, &mut springs, Vec3::ZERO, 1.0 / 60.0, 0.0, &mut debug);
        let solved_end = result.global_transforms(&rig)[limb.end_effector_idx].translation;
        assert!((solved_end - target_pos).length() < 0.05);
    }

    #[test]
    fn unreachable_limb_target_does_not_panic_and_stays_finite() {
        let rig = quadruped_rig();
        let base = SkeletonPose::bind_pose(&rig);
        let state = ActivityState::default();
        let genes = MorphologyGenes::default();
        let mut overlay = build_overlay(crate::activity::ActivityType::Locomotion, &state, &genes, &rig, 0.0);
        overlay.limb_targets.insert(0, LimbTarget { world_pos: Vec3::new(0.0, -1000.0, 0.0), blend_weight: 1.0 });

        let ik = IkTargets::default();
        let mut springs = SecondaryMotionState::new(&rig);
        let mut debug = DebugCounters::default();
        let mut result = compose(&rig, &base, &overlay, &ik, &mut springs, Vec3::ZERO, 1.0 / 60.0, 0.0, &mut debug);
        let globals = result.global_transforms(&rig);
        assert!(globals.iter().all(|t| t.translation.is_finite()));
    }

    #[test]
    fn rotations_stay_normalized_after_composition() {
        let rig = quadruped_rig();
        let base = SkeletonPose::bind_pose(&rig);
        let state = ActivityState::default();
        let genes = MorphologyGenes::default();
        let overlay = build_overlay(crate::activity::ActivityType::ThreatDisplay, &state, &genes, &rig, 0.3);
        let ik = IkTargets::default();
        let mut springs = SecondaryMotionState::new(&rig);
        let mut debug = DebugCounters::default();
        let result = compose(&rig, &base, &overlay, &ik, &mut springs, Vec3::ZERO, 1.0 / 60.0, 0.3, &mut debug);
        assert!(result.rotations_are_normalized(1e-4));
    }
}
