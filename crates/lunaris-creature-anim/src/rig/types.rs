//! Rig data types: categories, bone specs, limb specs, and the assembled
//! [`RigDefinition`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Hard cap on bones per rig (including all LOD variants). Exceeding this
/// during construction is [`crate::error::AnimError::RigTooLarge`].
pub const MAX_BONES: usize = 256;

/// The classified rig category for a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RigCategory {
    /// Two legs, upright posture (humanoid-like).
    Biped,
    /// Four legs.
    Quadruped,
    /// Six legs.
    Hexapod,
    /// No limbs, long spine, undulating locomotion (snakes, eels).
    Serpentine,
    /// Aquatic, fin-driven locomotion.
    Fish,
    /// Winged, single leg pair.
    Avian,
    /// Tentacled.
    Cephalopod,
    /// Did not match any cascade rule; built from genes directly with no
    /// category-specific assumptions.
    Custom,
}

/// The kind of bone, used to key the joint limit table and to drive
/// category-specific builder decisions (e.g. cervical splitting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoneKind {
    /// The single root bone, always index 0.
    Root,
    /// Pelvis / hip girdle, the spine chain's base.
    Pelvis,
    /// A torso spine segment.
    Spine,
    /// A cervical (neck) segment, split off the spine for long necks.
    Neck,
    /// The head.
    Head,
    /// Hip joint (limb root).
    Hip,
    /// Knee / elbow joint (limb middle segment).
    Knee,
    /// Ankle / wrist joint (limb distal segment).
    Ankle,
    /// Foot / hand / paw (limb end effector).
    Foot,
    /// Shoulder girdle (wing/arm root).
    Shoulder,
    /// Wing membrane segment.
    WingBone,
    /// Fin bone (fish locomotion).
    Fin,
    /// Tentacle segment.
    Tentacle,
    /// Tail segment.
    TailSegment,
    /// Ear (secondary-motion feature bone).
    Ear,
    /// Antenna (secondary-motion feature bone).
    Antenna,
}

/// Per-axis joint limits, in radians, for a single bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Minimum angle per rotational axis (x, y, z).
    pub min_angle: [f32; 3],
    /// Maximum angle per rotational axis (x, y, z).
    pub max_angle: [f32; 3],
}

impl JointLimits {
    /// No limits at all (full freedom), used for the root bone.
    pub const UNLIMITED: Self = Self {
        min_angle: [-std::f32::consts::PI; 3],
        max_angle: [std::f32::consts::PI; 3],
    };

    /// Clamps a per-axis euler rotation (radians) into these limits.
    #[must_use]
    pub fn clamp_euler(&self, euler: [f32; 3]) -> [f32; 3] {
        [
            euler[0].clamp(self.min_angle[0], self.max_angle[0]),
            euler[1].clamp(self.min_angle[1], self.max_angle[1]),
            euler[2].clamp(self.min_angle[2], self.max_angle[2]),
        ]
    }
}

/// A single bone in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneSpec {
    /// Index of the parent bone, or `None` for the root. Every non-root
    /// bone's parent index is strictly less than its own index.
    pub parent: Option<usize>,
    /// The bind-pose transform relative to the parent.
    pub local_bind: Transform,
    /// The inverse of the bind-pose transform in world space, precomputed
    /// by the builder for the skinning collaborator.
    pub inverse_bind: Transform,
    /// Joint rotation limits.
    pub joint_limits: JointLimits,
    /// Mass, used by the secondary-motion spring integrator.
    pub mass: f32,
    /// What kind of bone this is.
    pub kind: BoneKind,
    /// Human-readable name (e.g. `"upper_leg_l"`).
    pub name: String,
}

impl BoneSpec {
    /// Returns the parent index as the `-1`-sentinel convention some
    /// external tooling (e.g. a GLB exporter) expects, for collaborators
    /// that aren't idiomatic Rust.
    #[must_use]
    pub fn parent_index_or_sentinel(&self) -> i32 {
        self.parent.map_or(-1, |p| p as i32)
    }
}

/// What kind of limb a [`LimbSpec`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimbKind {
    /// Front leg of a quadruped/hexapod.
    FrontLeg,
    /// Back leg of a quadruped/hexapod.
    BackLeg,
    /// Wing.
    Wing,
    /// Arm (biped).
    Arm,
    /// Tentacle.
    Tentacle,
    /// Fin.
    Fin,
}

/// A limb: a chain of bones from a root to an end effector, used by the IK
/// solvers and the locomotion sub-mode of the Animation Driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbSpec {
    /// Index of the bone the limb attaches to the spine/shoulder at.
    pub root_bone_idx: usize,
    /// Indices of every bone in the chain, root to end effector inclusive.
    pub segment_idxs: Vec<usize>,
    /// Index of the chain's end effector (always `segment_idxs.last()`).
    pub end_effector_idx: usize,
    /// What kind of limb this is.
    pub kind: LimbKind,
}

impl LimbSpec {
    /// Number of segments, including the end effector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segment_idxs.len()
    }

    /// Whether this chain has no bones at all (never valid, but useful for
    /// defensive checks).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segment_idxs.is_empty()
    }
}

/// Feature bones that aren't limbs or spine: wings, ears, tentacles,
/// antennae. These feed secondary motion and the Animation Driver's
/// per-activity overlay writers (e.g. ear perk during Threat Display).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureBones {
    /// Root bone index of each wing.
    pub wing_roots: Vec<usize>,
    /// Root bone index of each ear.
    pub ear_roots: Vec<usize>,
    /// Bone-index chains for each tentacle (also present in `limbs` for
    /// IK purposes; duplicated here for secondary-motion bookkeeping).
    pub tentacle_chains: Vec<Vec<usize>>,
    /// Bone-index chains for each antenna.
    pub antennae_chains: Vec<Vec<usize>>,
}

/// A fully built rig: bone hierarchy, bind pose, and derived indices.
///
/// Root-first, every bone's parent index strictly precedes it. Immutable
/// for the life of the creature once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigDefinition {
    /// The classified category.
    pub category: RigCategory,
    /// Ordered bone list, root first.
    pub bones: Vec<BoneSpec>,
    /// Spine chain, head-to-pelvis index order.
    pub spine_chain: Vec<usize>,
    /// Limb chains.
    pub limbs: Vec<LimbSpec>,
    /// Tail chain, root-to-tip index order, if this rig has a tail.
    pub tail_chain: Option<Vec<usize>>,
    /// Non-limb feature bones.
    pub feature_bones: FeatureBones,
    /// Simplified rigs keyed by LOD level (1 = first simplification, 2 =
    /// most aggressive). LOD 0 is `self` and is not stored in this map.
    pub lod_skeletons: BTreeMap<u8, RigDefinition>,
}

impl RigDefinition {
    /// Total bone count at LOD 0 (this rig, not counting `lod_skeletons`).
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Validates the hierarchy invariants: root has no parent, every other
    /// bone's parent index precedes it, and every limb chain has at least
    /// two bones whose end effector is the chain's last bone.
    #[must_use]
    pub fn validate_hierarchy(&self) -> bool {
        if self.bones.is_empty() {
            return false;
        }
        if self.bones[0].parent.is_some() {
            return false;
        }
        for (idx, bone) in self.bones.iter().enumerate().skip(1) {
            match bone.parent {
                Some(parent_idx) if parent_idx < idx => {}
                _ => return false,
            }
        }
        for limb in &self.limbs {
            if limb.segment_idxs.len() < 2 {
                return false;
            }
            if limb.segment_idxs.last().copied() != Some(limb.end_effector_idx) {
                return false;
            }
        }
        true
    }

    /// Returns the rig at the given LOD level, or `self` for LOD 0 / an
    /// unrecognized level higher than what was generated.
    #[must_use]
    pub fn at_lod(&self, level: u8) -> &RigDefinition {
        if level == 0 {
            return self;
        }
        self.lod_skeletons.get(&level).unwrap_or(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_bone(parent: Option<usize>, name: &str) -> BoneSpec {
        BoneSpec {
            parent,
            local_bind: Transform::IDENTITY,
            inverse_bind: Transform::IDENTITY,
            joint_limits: JointLimits::UNLIMITED,
            mass: 1.0,
            kind: BoneKind::Spine,
            name: name.to_string(),
        }
    }

    #[test]
    fn hierarchy_validation_rejects_forward_parent() {
        let rig = RigDefinition {
            category: RigCategory::Custom,
            bones: vec![
                trivial_bone(None, "root"),
                trivial_bone(Some(1), "bad"), // parent == self, invalid
            ],
            spine_chain: vec![],
            limbs: vec![],
            tail_chain: None,
            feature_bones: FeatureBones::default(),
            lod_skeletons: BTreeMap::new(),
        };
        assert!(!rig.validate_hierarchy());
    }

    #[test]
    fn hierarchy_validation_accepts_simple_chain() {
        let rig = RigDefinition {
            category: RigCategory::Custom,
            bones: vec![
                trivial_bone(None, "root"),
                trivial_bone(Some(0), "child"),
            ],
            spine_chain: vec![0, 1],
            limbs: vec![],
            tail_chain: None,
            feature_bones: FeatureBones::default(),
            lod_skeletons: BTreeMap::new(),
        };
        assert!(rig.validate_hierarchy());
    }

    #[test]
    fn limb_with_single_bone_is_invalid() {
        let rig = RigDefinition {
            category: RigCategory::Custom,
            bones: vec![trivial_bone(None, "root")],
            spine_chain: vec![0],
            limbs: vec![LimbSpec {
                root_bone_idx: 0,
                segment_idxs: vec![0],
                end_effector_idx: 0,
                kind: LimbKind::Arm,
            }],
            tail_chain: None,
            feature_bones: FeatureBones::default(),
            lod_skeletons: BTreeMap::new(),
        };
        assert!(!rig.validate_hierarchy());
    }
}
