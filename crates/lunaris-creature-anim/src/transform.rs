//! The shared rigid transform type used by bind poses, skeleton poses, and
//! the IK solvers: a rotation quaternion, a translation, and a uniform
//! scale, matching the `SkeletonPose` entity definition.

use glam::{Mat4, Quat, Vec3};

/// A rigid (plus uniform scale) transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Rotation.
    pub rotation: Quat,
    /// Translation.
    pub translation: Vec3,
    /// Uniform scale.
    pub scale: f32,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        scale: 1.0,
    };

    /// Creates a transform from a translation alone.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Creates a transform from a rotation alone.
    #[must_use]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Creates a transform from translation and rotation.
    #[must_use]
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: 1.0,
        }
    }

    /// Composes `self` as the parent transform of `child`, i.e. returns the
    /// transform that takes a point from `child`'s local space into
    /// `self`'s parent space: `self * child`.
    #[must_use]
    pub fn mul_transform(&self, child: &Self) -> Self {
        Self {
            rotation: (self.rotation * child.rotation).normalize(),
            translation: self.translation + self.rotation * (child.translation * self.scale),
            scale: self.scale * child.scale,
        }
    }

    /// Transforms a point from local space into the space `self` maps into.
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (point * self.scale)
    }

    /// The inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.conjugate();
        let inv_scale = if self.scale.abs() > f32::EPSILON {
            1.0 / self.scale
        } else {
            0.0
        };
        let inv_translation = inv_rotation * (-self.translation) * inv_scale;
        Self {
            rotation: inv_rotation,
            translation: inv_translation,
            scale: inv_scale,
        }
    }

    /// Linearly interpolates translation and scale, spherically
    /// interpolates rotation.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            rotation: self.rotation.slerp(other.rotation, t),
            translation: self.translation.lerp(other.translation, t),
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }

    /// Converts to a 4x4 matrix, for collaborators (e.g. the skinning
    /// backend) that want a conventional matrix rather than a TRS triple.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.translation)
    }

    /// Returns true if the rotation quaternion's norm is within `epsilon` of
    /// unit length, per the per-tick pose invariant.
    #[must_use]
    pub fn rotation_is_normalized(&self, epsilon: f32) -> bool {
        (self.rotation.length() - 1.0).abs() <= epsilon
    }

    /// Renormalizes the rotation quaternion in place, guarding against
    /// numerical drift after repeated composition.
    pub fn renormalize(&mut self) {
        self.rotation = self.rotation.normalize();
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
