//! C1 — Rig Classifier.
//!
//! A fixed-order cascade of predicates over normalized gene values; first
//! match wins. Pure and deterministic: the same genes always classify to
//! the same category and configuration.

use serde::{Deserialize, Serialize};

use crate::genes::MorphologyGenes;

use super::types::RigCategory;

/// Neck length, in body-units, above which the builder splits cervical
/// bones off the main spine chain.
pub const LONG_NECK_THRESHOLD: f32 = 0.4;

/// Spine-segment cap applied when building the LOD1 skeleton.
pub const LOD1_SPINE_CAP: u8 = 6;
/// Spine-segment cap applied when building the LOD2 skeleton.
pub const LOD2_SPINE_CAP: u8 = 3;
/// Hard cap on tail segments regardless of what the genes request.
pub const MAX_TAIL_SEGMENTS: u8 = 20;

/// Cosmetic head silhouette, used by the builder to scale the head bone
/// and bias its bind-pose rotation; carries no joint-limit implications of
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadStyle {
    /// A generic, roughly spherical head.
    Standard,
    /// An elongated head/snout, for long-necked or serpentine creatures.
    Elongated,
    /// A beaked head, for avian rigs.
    Beaked,
}

/// Per-limb segment counts and LOD caps derived alongside the category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    /// The classified category (duplicated here for convenience so
    /// `RigConfig` is self-contained).
    pub category: RigCategory,
    /// Segments per leg chain (hip/knee/ankle = 3).
    pub leg_segment_count: u8,
    /// Segments per wing chain (shoulder/elbow/wrist/tip = 4).
    pub wing_segment_count: u8,
    /// Tail segment count, clamped to [`MAX_TAIL_SEGMENTS`].
    pub tail_segments: u8,
    /// Whether long-neck cervical splitting applies.
    pub split_cervical: bool,
    /// Head silhouette.
    pub head_style: HeadStyle,
    /// Spine-segment cap for LOD1.
    pub lod1_spine_cap: u8,
    /// Spine-segment cap for LOD2.
    pub lod2_spine_cap: u8,
}

/// Classifies a morphology gene set into a rig category and configuration.
///
/// Pure function: identical genes always produce an identical result.
/// Genes should be validated with [`MorphologyGenes::validate`] before
/// calling this — classification itself never fails, it just produces
/// `Custom` for anything it doesn't recognize.
#[must_use]
pub fn classify(genes: &MorphologyGenes) -> (RigCategory, RigConfig) {
    let category = classify_category(genes);
    let config = build_config(genes, category);
    (category, config)
}

fn classify_category(genes: &MorphologyGenes) -> RigCategory {
    if genes.aquatic && !genes.can_walk && genes.spine_segments >= 8 {
        return RigCategory::Serpentine;
    }
    if genes.aquatic && genes.fin_count >= 2 {
        return RigCategory::Fish;
    }
    if genes.tentacle_count >= 4 {
        return RigCategory::Cephalopod;
    }
    if genes.has_wings && genes.leg_pairs == 1 {
        return RigCategory::Avian;
    }
    if genes.leg_pairs == 1 && genes.upright_posture {
        return RigCategory::Biped;
    }
    if genes.leg_pairs == 2 {
        return RigCategory::Quadruped;
    }
    if genes.leg_pairs == 3 {
        return RigCategory::Hexapod;
    }
    if genes.spine_segments >= 12 && genes.leg_pairs == 0 {
        return RigCategory::Serpentine;
    }
    RigCategory::Custom
}

fn build_config(genes: &MorphologyGenes, category: RigCategory) -> RigConfig {
    let head_style = match category {
        RigCategory::Avian => HeadStyle::Beaked,
        RigCategory::Serpentine | RigCategory::Fish => HeadStyle::Elongated,
        _ if genes.neck_length > LONG_NECK_THRESHOLD => HeadStyle::Elongated,
        _ => HeadStyle::Standard,
    };

    RigConfig {
        category,
        leg_segment_count: 3,
        wing_segment_count: 4,
        tail_segments: genes.tail_segments.min(MAX_TAIL_SEGMENTS),
        split_cervical: genes.neck_length > LONG_NECK_THRESHOLD,
        head_style,
        lod1_spine_cap: LOD1_SPINE_CAP,
        lod2_spine_cap: LOD2_SPINE_CAP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genes(f: impl FnOnce(&mut MorphologyGenes)) -> MorphologyGenes {
        let mut g = MorphologyGenes::default();
        f(&mut g);
        g
    }

    #[test]
    fn eel_is_serpentine() {
        let g = genes(|g| {
            g.aquatic = true;
            g.can_walk = false;
            g.spine_segments = 10;
            g.leg_pairs = 0;
        });
        assert_eq!(classify_category(&g), RigCategory::Serpentine);
    }

    #[test]
    fn finned_aquatic_is_fish() {
        let g = genes(|g| {
            g.aquatic = true;
            g.fin_count = 3;
            g.can_walk = false;
            g.spine_segments = 4;
            g.leg_pairs = 0;
        });
        assert_eq!(classify_category(&g), RigCategory::Fish);
    }

    #[test]
    fn many_tentacles_is_cephalopod() {
        let g = genes(|g| {
            g.tentacle_count = 6;
            g.leg_pairs = 0;
        });
        assert_eq!(classify_category(&g), RigCategory::Cephalopod);
    }

    #[test]
    fn winged_single_leg_pair_is_avian() {
        let g = genes(|g| {
            g.has_wings = true;
            g.leg_pairs = 1;
        });
        assert_eq!(classify_category(&g), RigCategory::Avian);
    }

    #[test]
    fn upright_single_leg_pair_is_biped() {
        let g = genes(|g| {
            g.leg_pairs = 1;
            g.upright_posture = true;
        });
        assert_eq!(classify_category(&g), RigCategory::Biped);
    }

    #[test]
    fn two_leg_pairs_is_quadruped() {
        let g = genes(|g| g.leg_pairs = 2);
        assert_eq!(classify_category(&g), RigCategory::Quadruped);
    }

    #[test]
    fn three_leg_pairs_is_hexapod() {
        let g = genes(|g| g.leg_pairs = 3);
        assert_eq!(classify_category(&g), RigCategory::Hexapod);
    }

    #[test]
    fn long_spine_no_legs_is_serpentine_snake() {
        let g = genes(|g| {
            g.leg_pairs = 0;
            g.spine_segments = 14;
            g.aquatic = false;
        });
        assert_eq!(classify_category(&g), RigCategory::Serpentine);
    }

    #[test]
    fn fallback_is_custom() {
        let g = genes(|g| {
            g.leg_pairs = 0;
            g.spine_segments = 3;
        });
        assert_eq!(classify_category(&g), RigCategory::Custom);
    }

    #[test]
    fn classification_is_deterministic() {
        let g = genes(|g| g.leg_pairs = 2);
        assert_eq!(classify(&g), classify(&g));
    }

    #[test]
    fn tail_segments_clamped_to_cap() {
        let g = genes(|g| {
            g.leg_pairs = 2;
            g.tail_segments = MorphologyGenes::MAX_TAIL_SEGMENTS_HARD_CAP;
        });
        let (_, config) = classify(&g);
        assert_eq!(config.tail_segments, MAX_TAIL_SEGMENTS);
    }

    #[test]
    fn ordering_prefers_earlier_rule() {
        // aquatic + no-walk + long spine + also 2 leg pairs: rule 1 must
        // win over rule 6 because it is checked first.
        let g = genes(|g| {
            g.aquatic = true;
            g.can_walk = false;
            g.spine_segments = 9;
            g.leg_pairs = 2;
        });
        assert_eq!(classify_category(&g), RigCategory::Serpentine);
    }
}
