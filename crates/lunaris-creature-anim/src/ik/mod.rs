//! C6 — IK Solvers.
//!
//! Two-bone analytic IK for the common hip-knee-ankle / shoulder-elbow-wrist
//! two-segment chains, and FABRIK for anything longer (tentacles, wings,
//! spine/head re-targeting). Both are pure position-space solvers: the Pose
//! Compositor (C7) is responsible for turning the solved joint positions
//! back into bone-local rotations.

mod fabrik;
mod two_bone;

pub use fabrik::{solve as solve_fabrik, FabrikOutcome};
pub use two_bone::{solve as solve_two_bone, TwoBoneOutcome};

/// Target end-effector error, in body-units, below which FABRIK is
/// considered converged; scaled by body scale by the caller.
pub const IK_EPSILON: f32 = 1e-3;

/// Hard cap on FABRIK backward/forward passes per chain per tick.
pub const MAX_IK_ITERATIONS: u32 = 10;

/// A limb chain's solve strategy, picked from how many *solvable* joints it
/// has once its first bone (the anchor, already positioned by the base
/// pose/parent chain) is excluded.
///
/// `LimbSpec::segment_idxs` always includes the anchor bone as its first
/// entry (e.g. the hip for a leg), so a leg's 3-bone chain has 2 solvable
/// joints (knee, ankle) — exactly the "2 effective segments" the two-bone
/// solver is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// A single solvable joint: no bend to compute, just aim the one
    /// remaining segment at the target (e.g. a 2-bone fin chain).
    Aim,
    /// Exactly two solvable joints (e.g. a leg's hip-knee-ankle chain).
    TwoBone,
    /// Three or more solvable joints (wings, tentacles, spine re-targeting).
    Fabrik,
}

impl SolverKind {
    /// Picks the solver for a chain with `bone_count` bones in
    /// `segment_idxs` (anchor bone included).
    #[must_use]
    pub const fn for_chain_len(bone_count: usize) -> Self {
        match bone_count.saturating_sub(1) {
            0 | 1 => Self::Aim,
            2 => Self::TwoBone,
            _ => Self::Fabrik,
        }
    }
}
