//! The finalized per-creature pose: one local transform per bone, plus a
//! derived global-transform cache recomputed lazily when marked dirty.

use crate::rig::RigDefinition;
use crate::transform::Transform;

/// An ordered sequence of local bone transforms, parallel to
/// [`RigDefinition::bones`], plus the derived world-space transforms a
/// skinning collaborator actually consumes.
///
/// Recreated (or reset to bind) every tick per the entity lifecycle in §3 —
/// the only state carried across ticks belongs to [`super::SecondaryMotionState`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonPose {
    /// Local (parent-relative) transform per bone.
    pub locals: Vec<Transform>,
    globals: Vec<Transform>,
    dirty: bool,
}

impl SkeletonPose {
    /// Creates a pose at the rig's bind pose (every local equal to
    /// `bones[i].local_bind`).
    #[must_use]
    pub fn bind_pose(rig: &RigDefinition) -> Self {
        let locals: Vec<Transform> = rig.bones.iter().map(|b| b.local_bind).collect();
        let globals = vec![Transform::IDENTITY; locals.len()];
        Self {
            locals,
            globals,
            dirty: true,
        }
    }

    /// Marks the global-transform cache stale; called after any mutation to
    /// `locals`.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns the world-space transform of every bone, recomputing the
    /// cache first if dirty. Bones are root-first with every parent index
    /// preceding its children, so a single forward pass suffices.
    pub fn global_transforms(&mut self, rig: &RigDefinition) -> &[Transform] {
        if self.dirty || self.globals.len() != self.locals.len() {
            self.globals.resize(self.locals.len(), Transform::IDENTITY);
            for (idx, bone) in rig.bones.iter().enumerate() {
                self.globals[idx] = match bone.parent {
                    Some(parent) => self.globals[parent].mul_transform(&self.locals[idx]),
                    None => self.locals[idx],
                };
            }
            self.dirty = false;
        }
        &self.globals
    }

    /// Renormalizes every local rotation quaternion, guarding against drift
    /// after repeated composition (the per-tick `|q| ∈ [1-ε, 1+ε]`
    /// invariant in §8).
    pub fn renormalize_rotations(&mut self) {
        for local in &mut self.locals {
            local.renormalize();
        }
        self.mark_dirty();
    }

    /// Whether every local rotation's norm is within `epsilon` of unity.
    #[must_use]
    pub fn rotations_are_normalized(&self, epsilon: f32) -> bool {
        self.locals.iter().all(|t| t.rotation_is_normalized(epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genes::MorphologyGenes;
    use crate::rig::{build, JointLimitTable, RigBuildOptions};

    fn quadruped_rig() -> RigDefinition {
        let mut genes = MorphologyGenes::default();
        genes.leg_pairs = 2;
        let table = JointLimitTable::default();
        build(&genes, &table, RigBuildOptions::NONE).unwrap()
    }

    #[test]
    fn bind_pose_globals_match_precomputed_inverse_bind() {
        let rig = quadruped_rig();
        let mut pose = SkeletonPose::bind_pose(&rig);
        let globals = pose.global_transforms(&rig).to_vec();
        for (bone, global) in rig.bones.iter().zip(globals.iter()) {
            let round_trip = global.mul_transform(&bone.inverse_bind);
            assert!(round_trip.translation.length() < 1e-3);
        }
    }

    #[test]
    fn dirty_cache_recomputes_after_mutation() {
        let rig = quadruped_rig();
        let mut pose = SkeletonPose::bind_pose(&rig);
        let before = pose.global_transforms(&rig)[1];
        pose.locals[0].translation.y += 5.0;
        pose.mark_dirty();
        let after = pose.global_transforms(&rig)[1];
        assert!((after.translation - before.translation).length() > 1.0);
    }

    #[test]
    fn renormalize_keeps_rotations_unit_length() {
        let rig = quadruped_rig();
        let mut pose = SkeletonPose::bind_pose(&rig);
        for local in &mut pose.locals {
            local.rotation = local.rotation * 1.01;
        }
        pose.renormalize_rotations();
        assert!(pose.rotations_are_normalized(1e-4));
    }
}
