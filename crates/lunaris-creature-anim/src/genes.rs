//! Morphology genes: the immutable per-creature input to rig classification
//! and construction.

use serde::{Deserialize, Serialize};

use crate::error::AnimError;

/// Scalar and boolean morphology description for a single creature.
///
/// Produced by the genome/evolution collaborator (out of scope for this
/// core) and consumed exactly once, at spawn, by [`crate::rig::classify`]
/// and [`crate::rig::build`]. All fields are bounded reals or small
/// integers; [`MorphologyGenes::validate`] enforces those bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MorphologyGenes {
    /// Overall body length, in body-units (root-to-tail-base).
    pub body_length: f32,
    /// Overall body height/shoulder height, in body-units.
    pub body_height: f32,
    /// Body aspect ratio (length / width); purely cosmetic, not load-bearing
    /// for rig construction but carried through to the Animation Driver for
    /// locomotion sizing.
    pub body_aspect: f32,
    /// Number of spine segments, head to pelvis inclusive of both ends.
    pub spine_segments: u8,
    /// Number of paired limbs (0, 1, 2, or 3).
    pub leg_pairs: u8,
    /// Whether the creature has a pair of wings.
    pub has_wings: bool,
    /// Whether the creature stands upright (bipedal posture cue).
    pub upright_posture: bool,
    /// Tail length, in body-units. Zero means no tail.
    pub tail_length: f32,
    /// Number of tail segments; clamped to `MAX_TAIL_SEGMENTS` by the rig
    /// classifier's `RigConfig`.
    pub tail_segments: u8,
    /// Number of tentacles (cephalopod-style limbs that are not legs).
    pub tentacle_count: u8,
    /// Relative head size, in body-units.
    pub head_size: f32,
    /// Neck length, in body-units; long necks split cervical bones off the
    /// main spine chain (see [`crate::rig::builder`]).
    pub neck_length: f32,
    /// Spinal curvature bias baked into the bind pose, in radians.
    pub spinal_curvature: f32,
    /// Number of fins (fish-style locomotion organs).
    pub fin_count: u8,
    /// Whether the creature can walk on land at all (false for purely
    /// aquatic eels).
    pub can_walk: bool,

    // Habitat hints, read by the classifier and by the Animation Driver's
    // locomotion gait selection.
    /// Lives primarily in water.
    pub aquatic: bool,
    /// Capable of sustained flight.
    pub flying: bool,
    /// Digs and lives underground.
    pub burrowing: bool,
    /// Lives and moves in trees.
    pub arboreal: bool,
}

impl Default for MorphologyGenes {
    fn default() -> Self {
        Self {
            body_length: 1.0,
            body_height: 0.5,
            body_aspect: 1.0,
            spine_segments: 5,
            leg_pairs: 2,
            has_wings: false,
            upright_posture: false,
            tail_length: 0.3,
            tail_segments: 4,
            tentacle_count: 0,
            head_size: 0.2,
            neck_length: 0.15,
            spinal_curvature: 0.0,
            fin_count: 0,
            can_walk: true,
            aquatic: false,
            flying: false,
            burrowing: false,
            arboreal: false,
        }
    }
}

impl MorphologyGenes {
    /// Largest permitted `tail_segments` value; the rig classifier clamps
    /// to this, but genes whose source data exceeds it by a wide margin are
    /// rejected outright rather than silently clamped, since that usually
    /// signals an upstream genome bug rather than an intentional long tail.
    pub const MAX_TAIL_SEGMENTS_HARD_CAP: u8 = 64;

    /// Validates the gene set against the bounds and inter-field
    /// constraints the rig classifier and builder rely on.
    ///
    /// # Errors
    ///
    /// Returns [`AnimError::InvalidMorphology`] if any field is out of
    /// range or the fields contradict each other (e.g. `leg_pairs > 0` and
    /// `can_walk == false` for a non-aquatic creature).
    pub fn validate(&self) -> Result<(), AnimError> {
        let fail = |reason: &str| {
            Err(AnimError::InvalidMorphology {
                reason: reason.to_string(),
            })
        };

        if !self.body_length.is_finite() || self.body_length <= 0.0 {
            return fail("body_length must be finite and positive");
        }
        if !self.body_height.is_finite() || self.body_height <= 0.0 {
            return fail("body_height must be finite and positive");
        }
        if !self.body_aspect.is_finite() || self.body_aspect <= 0.0 {
            return fail("body_aspect must be finite and positive");
        }
        if self.spine_segments < 1 {
            return fail("spine_segments must be at least 1");
        }
        if self.leg_pairs > 3 {
            return fail("leg_pairs must be 0..=3");
        }
        if self.tail_length < 0.0 || !self.tail_length.is_finite() {
            return fail("tail_length must be finite and non-negative");
        }
        if self.tail_segments > Self::MAX_TAIL_SEGMENTS_HARD_CAP {
            return fail("tail_segments exceeds the hard cap");
        }
        if self.tail_length > 0.0 && self.tail_segments == 0 {
            return fail("tail_length is positive but tail_segments is zero");
        }
        if self.head_size <= 0.0 || !self.head_size.is_finite() {
            return fail("head_size must be finite and positive");
        }
        if self.neck_length < 0.0 || !self.neck_length.is_finite() {
            return fail("neck_length must be finite and non-negative");
        }
        if !self.spinal_curvature.is_finite() {
            return fail("spinal_curvature must be finite");
        }
        if self.leg_pairs > 0 && !self.can_walk && !self.aquatic {
            return fail("leg_pairs > 0 but can_walk is false for a non-aquatic creature");
        }
        if self.flying && !self.has_wings {
            return fail("flying is set but has_wings is false");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_genes_validate() {
        assert!(MorphologyGenes::default().validate().is_ok());
    }

    #[test]
    fn negative_body_length_rejected() {
        let mut genes = MorphologyGenes::default();
        genes.body_length = -1.0;
        assert!(matches!(
            genes.validate(),
            Err(AnimError::InvalidMorphology { .. })
        ));
    }

    #[test]
    fn tail_length_without_segments_rejected() {
        let mut genes = MorphologyGenes::default();
        genes.tail_length = 1.0;
        genes.tail_segments = 0;
        assert!(genes.validate().is_err());
    }

    #[test]
    fn flying_without_wings_rejected() {
        let mut genes = MorphologyGenes::default();
        genes.flying = true;
        genes.has_wings = false;
        assert!(genes.validate().is_err());
    }

    #[test]
    fn walking_legged_non_aquatic_without_can_walk_rejected() {
        let mut genes = MorphologyGenes::default();
        genes.can_walk = false;
        genes.aquatic = false;
        genes.leg_pairs = 2;
        assert!(genes.validate().is_err());
    }
}
