//! C2 — Rig Builder.
//!
//! Turns a classified `(RigCategory, RigConfig)` plus the original genes
//! into a fully hierarchical [`RigDefinition`]: bones in parent-first
//! order, bind transforms, inverse-bind transforms, joint limits, and the
//! derived spine/limb/tail/feature indices. Deterministic: identical genes
//! (and identical [`RigBuildOptions`]) produce byte-identical bind poses.

use glam::{Quat, Vec3};

use crate::error::AnimError;
use crate::genes::MorphologyGenes;
use crate::transform::Transform;

use super::category::{classify, HeadStyle, RigConfig};
use super::tables::JointLimitTable;
use super::types::{
    BoneKind, BoneSpec, FeatureBones, JointLimits, LimbKind, LimbSpec, MAX_BONES, RigCategory,
    RigDefinition,
};

/// Options controlling optional, non-load-bearing feature bones.
///
/// Ears and antennae are not implied by any single gene threshold in the
/// morphology gene set, so generating them is an explicit opt-in rather
/// than an automatic consequence of category — this keeps the base bone
/// count for a given category a simple, predictable function of the spine,
/// limb, and tail gene values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RigBuildOptions {
    /// Attach two ear bones to the head.
    pub include_ears: bool,
    /// Attach two antenna chains to the head (cephalopod/insect flavor).
    pub include_antennae: bool,
    /// Segments per antenna chain when `include_antennae` is set.
    pub antenna_segments: u8,
}

impl RigBuildOptions {
    /// No optional feature bones.
    pub const NONE: Self = Self {
        include_ears: false,
        include_antennae: false,
        antenna_segments: 2,
    };
}

const TENTACLE_SEGMENTS: usize = 4;
const FIN_SEGMENTS: usize = 2;

/// Builds a [`RigDefinition`] at LOD 0 plus its LOD1/LOD2 simplifications,
/// from the given genes.
///
/// # Errors
///
/// Returns [`AnimError::InvalidMorphology`] if `genes.validate()` fails, or
/// [`AnimError::RigTooLarge`] if the LOD0 bone count would exceed
/// [`MAX_BONES`].
pub fn build(
    genes: &MorphologyGenes,
    joint_limits: &JointLimitTable,
    options: RigBuildOptions,
) -> Result<RigDefinition, AnimError> {
    genes.validate()?;

    let (category, config) = classify(genes);
    let mut rig = build_at_lod(genes, category, &config, joint_limits, options, 0)?;

    let lod1 = build_at_lod(genes, category, &config, joint_limits, RigBuildOptions::NONE, 1)?;
    let lod2 = build_at_lod(genes, category, &config, joint_limits, RigBuildOptions::NONE, 2)?;
    rig.lod_skeletons.insert(1, lod1);
    rig.lod_skeletons.insert(2, lod2);

    Ok(rig)
}

/// Builds a single LOD level's skeleton, with no nested `lod_skeletons` of
/// its own (the caller assembles those).
fn build_at_lod(
    genes: &MorphologyGenes,
    category: RigCategory,
    config: &RigConfig,
    joint_limits: &JointLimitTable,
    options: RigBuildOptions,
    lod: u8,
) -> Result<RigDefinition, AnimError> {
    let mut b = Builder::new(joint_limits);

    let spine_segment_count = spine_segments_for_lod(genes.spine_segments, config, lod);
    let tail_segment_count = tail_segments_for_lod(config.tail_segments, lod);
    let drop_features = lod > 0;

    let root_idx = b.push(BoneSpec {
        parent: None,
        local_bind: Transform::IDENTITY,
        inverse_bind: Transform::IDENTITY,
        joint_limits: JointLimits::UNLIMITED,
        mass: 0.0,
        kind: BoneKind::Root,
        name: "root".to_string(),
    });

    let spine_axis = if matches!(category, RigCategory::Biped) {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let body_extent = if matches!(category, RigCategory::Biped) {
        genes.body_height
    } else {
        genes.body_length
    };
    let spine_segment_len = body_extent / spine_segment_count.max(1) as f32;

    let pelvis_idx = b.push_child(
        root_idx,
        Transform::from_translation(Vec3::Y * genes.body_height.min(genes.body_height)),
        JointLimits::UNLIMITED,
        genes.body_length * 0.5,
        BoneKind::Pelvis,
        "pelvis",
    );

    let cervical_count = if config.split_cervical {
        (spine_segment_count / 3).max(1).min(spine_segment_count - 1)
    } else {
        0
    };
    let body_spine_count = spine_segment_count - cervical_count;

    let mut spine_chain_root_to_head = vec![pelvis_idx];
    let mut last = pelvis_idx;
    for i in 0..body_spine_count.saturating_sub(1) {
        let kind = BoneKind::Spine;
        let idx = b.push_child(
            last,
            Transform::from_translation(spine_axis * spine_segment_len),
            joint_limits.limits_for(kind),
            genes.body_length * 0.1,
            kind,
            &format!("spine_{i}"),
        );
        spine_chain_root_to_head.push(idx);
        last = idx;
    }
    for i in 0..cervical_count {
        let idx = b.push_child(
            last,
            Transform::from_translation(spine_axis * spine_segment_len),
            joint_limits.limits_for(BoneKind::Neck),
            genes.body_length * 0.05,
            BoneKind::Neck,
            &format!("neck_{i}"),
        );
        spine_chain_root_to_head.push(idx);
        last = idx;
    }

    let head_style = config.head_style;
    let head_offset = spine_axis * (genes.neck_length.max(0.0) + genes.head_size);
    let head_rotation = match head_style {
        HeadStyle::Elongated => Quat::from_rotation_x(-0.1),
        HeadStyle::Beaked => Quat::from_rotation_x(0.05),
        HeadStyle::Standard => Quat::IDENTITY,
    };
    let head_idx = b.push_child(
        last,
        Transform::from_translation_rotation(head_offset, head_rotation),
        joint_limits.limits_for(BoneKind::Head),
        genes.head_size,
        BoneKind::Head,
        "head",
    );
    spine_chain_root_to_head.push(head_idx);

    // Spec stores the spine chain head-to-pelvis.
    let mut spine_chain = spine_chain_root_to_head.clone();
    spine_chain.reverse();

    let mut limbs = Vec::new();
    let mut feature_bones = FeatureBones::default();

    match category {
        RigCategory::Biped => {
            push_leg_pair(
                &mut b,
                joint_limits,
                pelvis_idx,
                genes,
                config.leg_segment_count,
                LimbKind::BackLeg,
                &mut limbs,
            );
        }
        RigCategory::Quadruped => {
            let shoulder_attach = spine_chain_root_to_head
                .get(spine_chain_root_to_head.len().saturating_sub(2))
                .copied()
                .unwrap_or(pelvis_idx);
            push_leg_pair(
                &mut b,
                joint_limits,
                shoulder_attach,
                genes,
                config.leg_segment_count,
                LimbKind::FrontLeg,
                &mut limbs,
            );
            push_leg_pair(
                &mut b,
                joint_limits,
                pelvis_idx,
                genes,
                config.leg_segment_count,
                LimbKind::BackLeg,
                &mut limbs,
            );
        }
        RigCategory::Hexapod => {
            let mid_idx = spine_chain_root_to_head
                .get(spine_chain_root_to_head.len() / 2)
                .copied()
                .unwrap_or(pelvis_idx);
            let front_idx = spine_chain_root_to_head
                .get(spine_chain_root_to_head.len().saturating_sub(2))
                .copied()
                .unwrap_or(pelvis_idx);
            push_leg_pair(
                &mut b,
                joint_limits,
                front_idx,
                genes,
                config.leg_segment_count,
                LimbKind::FrontLeg,
                &mut limbs,
            );
            push_leg_pair(
                &mut b,
                joint_limits,
                mid_idx,
                genes,
                config.leg_segment_count,
                LimbKind::FrontLeg,
                &mut limbs,
            );
            push_leg_pair(
                &mut b,
                joint_limits,
                pelvis_idx,
                genes,
                config.leg_segment_count,
                LimbKind::BackLeg,
                &mut limbs,
            );
        }
        RigCategory::Avian => {
            push_leg_pair(
                &mut b,
                joint_limits,
                pelvis_idx,
                genes,
                config.leg_segment_count,
                LimbKind::BackLeg,
                &mut limbs,
            );
            let shoulder_attach = spine_chain_root_to_head
                .get(spine_chain_root_to_head.len().saturating_sub(2))
                .copied()
                .unwrap_or(pelvis_idx);
            for side in [-1.0_f32, 1.0] {
                let wing = push_wing(
                    &mut b,
                    joint_limits,
                    shoulder_attach,
                    genes,
                    config.wing_segment_count,
                    side,
                );
                feature_bones.wing_roots.push(wing.segment_idxs[0]);
                limbs.push(wing);
            }
        }
        RigCategory::Cephalopod => {
            for i in 0..genes.tentacle_count {
                let chain = push_chain(
                    &mut b,
                    joint_limits,
                    pelvis_idx,
                    TENTACLE_SEGMENTS,
                    BoneKind::Tentacle,
                    Vec3::new((i as f32 - genes.tentacle_count as f32 / 2.0) * 0.1, 0.0, -0.1),
                    &format!("tentacle_{i}"),
                );
                feature_bones.tentacle_chains.push(chain.clone());
                limbs.push(LimbSpec {
                    root_bone_idx: chain[0],
                    end_effector_idx: *chain.last().unwrap(),
                    segment_idxs: chain,
                    kind: LimbKind::Tentacle,
                });
            }
        }
        RigCategory::Fish => {
            for i in 0..genes.fin_count {
                let side = if i % 2 == 0 { -1.0 } else { 1.0 };
                let chain = push_chain(
                    &mut b,
                    joint_limits,
                    pelvis_idx,
                    FIN_SEGMENTS,
                    BoneKind::Fin,
                    Vec3::new(side * genes.body_height * 0.3, 0.0, 0.0),
                    &format!("fin_{i}"),
                );
                limbs.push(LimbSpec {
                    root_bone_idx: chain[0],
                    end_effector_idx: *chain.last().unwrap(),
                    segment_idxs: chain,
                    kind: LimbKind::Fin,
                });
            }
        }
        RigCategory::Serpentine | RigCategory::Custom => {
            // No limbs: locomotion is pure spine undulation for serpentine;
            // Custom rigs with leg_pairs == 0 behave the same way.
        }
    }

    let tail_chain = if tail_segment_count > 0 {
        let chain = push_chain(
            &mut b,
            joint_limits,
            pelvis_idx,
            tail_segment_count as usize,
            BoneKind::TailSegment,
            -spine_axis * (genes.tail_length.max(0.01) / tail_segment_count.max(1) as f32),
            "tail",
        );
        Some(chain)
    } else {
        None
    };

    if options.include_ears && !drop_features {
        for (i, side) in [-1.0_f32, 1.0].into_iter().enumerate() {
            let ear = b.push_child(
                head_idx,
                Transform::from_translation(Vec3::new(side * genes.head_size * 0.4, genes.head_size * 0.4, 0.0)),
                joint_limits.limits_for(BoneKind::Ear),
                0.01,
                BoneKind::Ear,
                &format!("ear_{i}"),
            );
            feature_bones.ear_roots.push(ear);
        }
    }

    if options.include_antennae && !drop_features {
        for i in 0..2 {
            let chain = push_chain(
                &mut b,
                joint_limits,
                head_idx,
                options.antenna_segments.max(1) as usize,
                BoneKind::Antenna,
                Vec3::new(if i == 0 { -0.05 } else { 0.05 }, genes.head_size * 0.5, 0.0),
                &format!("antenna_{i}"),
            );
            feature_bones.antennae_chains.push(chain);
        }
    }

    if b.bones.len() > MAX_BONES {
        return Err(AnimError::RigTooLarge {
            bone_count: b.bones.len(),
            max: MAX_BONES,
        });
    }

    Ok(RigDefinition {
        category,
        bones: b.bones,
        spine_chain,
        limbs,
        tail_chain,
        feature_bones,
        lod_skeletons: std::collections::BTreeMap::new(),
    })
}

fn spine_segments_for_lod(base: u8, config: &RigConfig, lod: u8) -> u8 {
    let cap = match lod {
        1 => config.lod1_spine_cap,
        2 => config.lod2_spine_cap,
        _ => u8::MAX,
    };
    base.min(cap).max(1)
}

fn tail_segments_for_lod(base: u8, lod: u8) -> u8 {
    match lod {
        0 => base,
        1 => {
            if base == 0 {
                0
            } else {
                (base / 2).max(1)
            }
        }
        _ => 0,
    }
}

fn push_leg_pair(
    b: &mut Builder,
    joint_limits: &JointLimitTable,
    attach: usize,
    genes: &MorphologyGenes,
    segment_count: u8,
    kind: LimbKind,
    limbs: &mut Vec<LimbSpec>,
) {
    for side in [-1.0_f32, 1.0] {
        let hip_offset = Vec3::new(side * genes.body_height * 0.3, 0.0, 0.0);
        let hip = b.push_child(
            attach,
            Transform::from_translation(hip_offset),
            joint_limits.limits_for(BoneKind::Hip),
            genes.body_height * 0.15,
            BoneKind::Hip,
            "hip",
        );
        let segment_len = genes.body_height / segment_count.max(1) as f32;
        let mut chain = vec![hip];
        let mut last = hip;
        for seg in 1..segment_count {
            let kind_b = if seg == segment_count - 1 {
                BoneKind::Ankle
            } else {
                BoneKind::Knee
            };
            let idx = b.push_child(
                last,
                Transform::from_translation(-Vec3::Y * segment_len),
                joint_limits.limits_for(kind_b),
                genes.body_height * 0.1,
                kind_b,
                "leg_segment",
            );
            chain.push(idx);
            last = idx;
        }
        limbs.push(LimbSpec {
            root_bone_idx: hip,
            end_effector_idx: *chain.last().unwrap(),
            segment_idxs: chain,
            kind,
        });
    }
}

fn push_wing(
    b: &mut Builder,
    joint_limits: &JointLimitTable,
    attach: usize,
    genes: &MorphologyGenes,
    segment_count: u8,
    side: f32,
) -> LimbSpec {
    let shoulder = b.push_child(
        attach,
        Transform::from_translation(Vec3::new(side * genes.body_height * 0.2, genes.body_height * 0.1, 0.0)),
        joint_limits.limits_for(BoneKind::Shoulder),
        genes.body_height * 0.1,
        BoneKind::Shoulder,
        "wing_shoulder",
    );
    let segment_len = genes.body_length * 0.4 / segment_count.max(1) as f32;
    let mut chain = vec![shoulder];
    let mut last = shoulder;
    for _ in 1..segment_count {
        let idx = b.push_child(
            last,
            Transform::from_translation(Vec3::new(side * segment_len, 0.0, 0.0)),
            joint_limits.limits_for(BoneKind::WingBone),
            genes.body_length * 0.05,
            BoneKind::WingBone,
            "wing_segment",
        );
        chain.push(idx);
        last = idx;
    }
    LimbSpec {
        root_bone_idx: shoulder,
        end_effector_idx: *chain.last().unwrap(),
        segment_idxs: chain,
        kind: LimbKind::Wing,
    }
}

fn push_chain(
    b: &mut Builder,
    joint_limits: &JointLimitTable,
    attach: usize,
    segment_count: usize,
    kind: BoneKind,
    per_segment_offset: Vec3,
    name_prefix: &str,
) -> Vec<usize> {
    let mut chain = Vec::with_capacity(segment_count);
    let mut last = attach;
    for i in 0..segment_count {
        let idx = b.push_child(
            last,
            Transform::from_translation(per_segment_offset),
            joint_limits.limits_for(kind),
            0.05,
            kind,
            &format!("{name_prefix}_{i}"),
        );
        chain.push(idx);
        last = idx;
    }
    chain
}

/// Accumulates bones and computes inverse-bind transforms as it goes, so
/// that by the time [`build_at_lod`] finishes, every bone already carries
/// its world-space inverse bind transform.
struct Builder<'a> {
    bones: Vec<BoneSpec>,
    world_binds: Vec<Transform>,
    joint_limits: &'a JointLimitTable,
}

impl<'a> Builder<'a> {
    fn new(joint_limits: &'a JointLimitTable) -> Self {
        Self {
            bones: Vec::new(),
            world_binds: Vec::new(),
            joint_limits,
        }
    }

    fn push(&mut self, mut bone: BoneSpec) -> usize {
        let world = match bone.parent {
            Some(p) => self.world_binds[p].mul_transform(&bone.local_bind),
            None => bone.local_bind,
        };
        bone.inverse_bind = world.inverse();
        let idx = self.bones.len();
        self.world_binds.push(world);
        self.bones.push(bone);
        idx
    }

    #[allow(clippy::too_many_arguments)]
    fn push_child(
        &mut self,
        parent: usize,
        local_bind: Transform,
        joint_limits: JointLimits,
        mass: f32,
        kind: BoneKind,
        name: &str,
    ) -> usize {
        let _ = self.joint_limits; // table already consulted by caller via limits_for
        self.push(BoneSpec {
            parent: Some(parent),
            local_bind,
            inverse_bind: Transform::IDENTITY,
            joint_limits,
            mass,
            kind,
            name: name.to_string(),
        })
    }
}
