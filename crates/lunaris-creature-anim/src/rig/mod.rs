//! Rig classification and construction (C1 + C2): turns morphology genes
//! into a deterministic bone hierarchy with precomputed bind transforms,
//! joint limits, and derived spine/limb/tail/feature indices.

mod builder;
mod category;
mod tables;
mod types;

pub use builder::{build, RigBuildOptions};
pub use category::{classify, HeadStyle, RigConfig, LONG_NECK_THRESHOLD, MAX_TAIL_SEGMENTS};
pub use tables::{Gait, GaitTable, JointLimitTable};
pub use types::{
    BoneKind, BoneSpec, FeatureBones, JointLimits, LimbKind, LimbSpec, RigCategory, RigDefinition,
    MAX_BONES,
};
