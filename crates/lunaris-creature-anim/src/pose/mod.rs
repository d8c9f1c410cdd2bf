//! C7 + C8 — Pose Compositor and Secondary Motion.
//!
//! [`SkeletonPose`] is the finalized per-bone transform buffer a skinning
//! collaborator consumes; [`compose`] assembles one each tick from the
//! locomotion base pose, the Animation Driver's overlay, and the IK
//! solvers; [`SecondaryMotionState`] is the persistent damped-spring state
//! that survives across ticks for passive bones.

mod compositor;
mod secondary_motion;
mod skeleton_pose;

pub use compositor::{compose, IkTargets};
pub use secondary_motion::{SecondaryMotionGains, SecondaryMotionState, MAX_STABLE_DT};
pub use skeleton_pose::SkeletonPose;
