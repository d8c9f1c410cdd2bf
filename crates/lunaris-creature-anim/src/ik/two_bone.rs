//! Closed-form two-bone IK: the law-of-cosines solve used for leg
//! (hip-knee-ankle) and arm (shoulder-elbow-wrist) chains.

use glam::{Quat, Vec3};

/// Result of a two-bone solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoBoneOutcome {
    /// Solved world position of the middle joint (knee/elbow).
    pub mid: Vec3,
    /// Solved world position of the end effector (ankle/wrist).
    pub end: Vec3,
    /// Whether the target was beyond `l1 + l2` and the limb was stretched
    /// fully toward it (the documented no-error "reachable boundary"
    /// behavior, not a failure).
    pub fully_extended: bool,
    /// Whether the middle joint's flexion angle had to be clamped to
    /// `max_flex`, producing an end effector short of `target`.
    pub limit_clamped: bool,
    /// Distance between `end` and the original (unclamped) target.
    pub residual: f32,
}

/// Solves a two-segment chain: `root` is fixed (already positioned by the
/// parent chain), `l1`/`l2` are the two segment lengths, `target` is the
/// desired end-effector position, and `pole` is a world-space hint vector
/// (typically the body's forward direction) used to disambiguate which way
/// the middle joint bends.
///
/// `max_flex` is the middle joint's maximum flexion angle in radians (from
/// [`crate::rig::JointLimits::max_angle`]`[0]`), applied after the analytic
/// solve per §4.6.
///
/// Returns `None` for a degenerate configuration: non-finite input,
/// zero-length segments, or a target coincident with `root`.
#[must_use]
pub fn solve(root: Vec3, l1: f32, l2: f32, target: Vec3, pole: Vec3, max_flex: f32) -> Option<TwoBoneOutcome> {
    if !root.is_finite() || !target.is_finite() || !pole.is_finite() {
        return None;
    }
    if !l1.is_finite() || !l2.is_finite() || l1 <= 0.0 || l2 <= 0.0 {
        return None;
    }

    let to_target = target - root;
    let dist = to_target.length();
    if dist < 1e-6 {
        return None;
    }
    let direction = to_target / dist;

    let reach = l1 + l2;
    let min_reach = (l1 - l2).abs();
    let fully_extended = dist >= reach;
    let mut solved_dist = dist.clamp(min_reach.max(1e-6), reach);

    // Internal angle at the knee via the law of cosines; flex is measured
    // as the deviation from a fully straight limb (0 = straight).
    let cos_knee_internal = ((l1 * l1 + l2 * l2 - solved_dist * solved_dist) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
    let knee_internal = cos_knee_internal.acos();
    let mut flex = std::f32::consts::PI - knee_internal;

    let mut limit_clamped = false;
    if flex > max_flex && max_flex.is_finite() && max_flex >= 0.0 {
        flex = max_flex;
        limit_clamped = true;
        let clamped_internal = std::f32::consts::PI - flex;
        let d2 = l1 * l1 + l2 * l2 - 2.0 * l1 * l2 * clamped_internal.cos();
        solved_dist = d2.max(0.0).sqrt().clamp(min_reach.max(1e-6), reach);
    }

    let cos_hip = ((l1 * l1 + solved_dist * solved_dist - l2 * l2) / (2.0 * l1 * solved_dist)).clamp(-1.0, 1.0);
    let hip_angle = cos_hip.acos();

    let mut bend_axis = direction.cross(pole);
    if bend_axis.length_squared() < 1e-8 {
        // Pole is parallel (or anti-parallel) to the reach direction; pick
        // any vector perpendicular to `direction` as a stable fallback.
        bend_axis = direction.cross(Vec3::Y);
        if bend_axis.length_squared() < 1e-8 {
            bend_axis = direction.cross(Vec3::X);
        }
    }
    let bend_axis = bend_axis.normalize();

    let knee_dir = Quat::from_axis_angle(bend_axis, hip_angle) * direction;
    let mid = root + knee_dir * l1;
    let end = root + direction * solved_dist;

    Some(TwoBoneOutcome {
        mid,
        end,
        fully_extended,
        limit_clamped,
        residual: (end - target).length(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachable_target_hits_exactly() {
        let root = Vec3::ZERO;
        let target = Vec3::new(0.0, -1.5, 0.3);
        let outcome = solve(root, 1.0, 1.0, target, Vec3::Z, std::f32::consts::PI).unwrap();
        assert!(!outcome.fully_extended);
        assert!((outcome.end - target).length() < 1e-4);
    }

    #[test]
    fn unreachable_target_stretches_to_boundary() {
        let root = Vec3::ZERO;
        let target = Vec3::new(0.0, -10.0, 0.0);
        let outcome = solve(root, 1.0, 1.0, target, Vec3::Z, std::f32::consts::PI).unwrap();
        assert!(outcome.fully_extended);
        assert!((outcome.end - root).length() <= 2.0 + 1e-4);
        assert!(outcome.residual > 0.0);
    }

    #[test]
    fn coincident_target_is_degenerate() {
        let root = Vec3::new(1.0, 1.0, 1.0);
        assert!(solve(root, 1.0, 1.0, root, Vec3::Z, std::f32::consts::PI).is_none());
    }

    #[test]
    fn zero_length_segment_is_degenerate() {
        let root = Vec3::ZERO;
        let target = Vec3::new(0.0, -1.0, 0.0);
        assert!(solve(root, 0.0, 1.0, target, Vec3::Z, std::f32::consts::PI).is_none());
    }

    #[test]
    fn nan_target_is_degenerate() {
        let root = Vec3::ZERO;
        let target = Vec3::new(f32::NAN, 0.0, 0.0);
        assert!(solve(root, 1.0, 1.0, target, Vec3::Z, std::f32::consts::PI).is_none());
    }

    #[test]
    fn tight_flex_limit_clamps_and_leaves_residual() {
        let root = Vec3::ZERO;
        // Target very close to root forces maximal knee flex.
        let target = Vec3::new(0.0, -0.1, 0.0);
        let outcome = solve(root, 1.0, 1.0, target, Vec3::Z, 0.1).unwrap();
        assert!(outcome.limit_clamped);
        assert!(outcome.residual > 0.0);
    }
}
