//! Iterative FABRIK (Forward-And-Backward Reaching IK) for chains with more
//! than two solvable joints: wings, tentacles, and spine/head re-targeting.

use glam::{Quat, Vec3};

/// Result of a FABRIK solve.
#[derive(Debug, Clone)]
pub struct FabrikOutcome {
    /// Solved world positions of every solvable joint, anchor excluded,
    /// parallel to the caller's `initial` slice.
    pub positions: Vec<Vec3>,
    /// Backward+forward passes actually run (≤ [`super::MAX_IK_ITERATIONS`]).
    pub iterations: u32,
    /// Distance between the end effector and `target` after the final pass.
    pub residual: f32,
}

/// Solves a chain of `initial.len()` joints hanging off a fixed `anchor`.
///
/// `lengths[0]` is the anchor-to-`initial[0]` segment length; `lengths[i]`
/// for `i > 0` is the length between `initial[i-1]` and `initial[i]`.
/// `bend_limits[i]` caps the angle (radians) the chain may bend at joint
/// `i`, measured as deviation from continuing straight through the joint;
/// joints with no practical limit should pass `f32::consts::PI`.
///
/// Returns `None` for a degenerate configuration: non-finite input,
/// mismatched slice lengths, a non-positive segment length, or a target
/// coincident with `anchor`.
#[must_use]
pub fn solve(
    anchor: Vec3,
    initial: &[Vec3],
    lengths: &[f32],
    bend_limits: &[f32],
    target: Vec3,
    epsilon: f32,
    max_iterations: u32,
) -> Option<FabrikOutcome> {
    if initial.is_empty() || initial.len() != lengths.len() {
        return None;
    }
    if !anchor.is_finite() || !target.is_finite() {
        return None;
    }
    if lengths.iter().any(|l| !l.is_finite() || *l <= 0.0) {
        return None;
    }
    if initial.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let n = initial.len();
    let to_target = target - anchor;
    let dist = to_target.length();
    if dist < 1e-6 {
        return None;
    }

    let total_reach: f32 = lengths.iter().sum();
    if dist >= total_reach {
        let dir = to_target / dist;
        let mut positions = Vec::with_capacity(n);
        let mut cursor = anchor;
        for &len in lengths {
            cursor += dir * len;
            positions.push(cursor);
        }
        let residual = (positions[n - 1] - target).length();
        return Some(FabrikOutcome {
            positions,
            iterations: 0,
            residual,
        });
    }

    let mut pts = initial.to_vec();
    let mut iterations = 0;
    let mut residual = (pts[n - 1] - target).length();

    for _ in 0..max_iterations {
        iterations += 1;

        pts[n - 1] = target;
        for i in (0..n - 1).rev() {
            let dir = safe_normalize(pts[i] - pts[i + 1], Vec3::Y);
            pts[i] = pts[i + 1] + dir * lengths[i + 1];
        }

        let root_dir = safe_normalize(pts[0] - anchor, Vec3::Y);
        pts[0] = anchor + root_dir * lengths[0];
        for i in 1..n {
            let dir = safe_normalize(pts[i] - pts[i - 1], Vec3::Y);
            pts[i] = pts[i - 1] + dir * lengths[i];
        }

        apply_bend_limits(&mut pts, anchor, lengths, bend_limits);

        residual = (pts[n - 1] - target).length();
        if residual < epsilon {
            break;
        }
    }

    Some(FabrikOutcome {
        positions: pts,
        iterations,
        residual,
    })
}

fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    if v.length_squared() < 1e-12 {
        fallback
    } else {
        v.normalize()
    }
}

/// Clamps the bend angle at each interior joint to `bend_limits[i]`,
/// rotating everything distal to that joint to open the angle back up. Per
/// §4.6, a clamp here reduces how far the next forward pass can reach —
/// that's the documented trade-off, not compensated for further.
fn apply_bend_limits(pts: &mut [Vec3], anchor: Vec3, lengths: &[f32], bend_limits: &[f32]) {
    let n = pts.len();
    for i in 0..n.saturating_sub(1) {
        let prev = if i == 0 { anchor } else { pts[i - 1] };
        let incoming = pts[i] - prev;
        let outgoing = pts[i + 1] - pts[i];
        if incoming.length_squared() < 1e-12 || outgoing.length_squared() < 1e-12 {
            continue;
        }
        let incoming_dir = incoming.normalize();
        let outgoing_dir = outgoing.normalize();
        let bend = incoming_dir.angle_between(outgoing_dir);
        let limit = bend_limits.get(i).copied().unwrap_or(std::f32::consts::PI);
        if bend <= limit {
            continue;
        }
        let axis = incoming_dir.cross(outgoing_dir);
        if axis.length_squared() < 1e-10 {
            continue;
        }
        let axis = axis.normalize();
        let correction = Quat::from_axis_angle(axis, limit - bend);
        let rotated = correction * outgoing_dir;
        pts[i + 1] = pts[i] + rotated * lengths[i + 1];
    }
}
