//! Process-wide, read-only-after-init configuration tables consumed by the
//! Rig Builder and the locomotion sub-mode of the Animation Driver.
//!
//! Both tables ship with a [`Default`] seeded from the representative
//! values in the spec and can be overridden wholesale from TOML for
//! designer tuning, matching the `ActivityConfigTable` convention used for
//! per-activity configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{BoneKind, JointLimits, RigCategory};

/// Per-bone-kind joint limits, shared by every rig built with this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointLimitTable {
    limits: HashMap<BoneKindKey, JointLimits>,
}

/// `BoneKind` isn't `Hash` in a way serde likes to use as a map key
/// directly when round-tripping through TOML (which only supports string
/// keys), so joint limits are (de)serialized through this string-keyed
/// wrapper and converted on load.
type BoneKindKey = String;

fn bone_kind_key(kind: BoneKind) -> BoneKindKey {
    format!("{kind:?}")
}

impl JointLimitTable {
    /// Looks up the joint limits for a bone kind, falling back to
    /// unlimited if this table has no entry (e.g. a custom-rig bone kind
    /// introduced by future morphology genes).
    #[must_use]
    pub fn limits_for(&self, kind: BoneKind) -> JointLimits {
        self.limits
            .get(&bone_kind_key(kind))
            .copied()
            .unwrap_or(JointLimits::UNLIMITED)
    }

    /// Overrides the limits for a single bone kind.
    pub fn set_limits(&mut self, kind: BoneKind, limits: JointLimits) {
        self.limits.insert(bone_kind_key(kind), limits);
    }

    /// Loads a table from a TOML document of `{ "BoneKindDebugName" = {
    /// min_angle = [..], max_angle = [..] } }` entries, layered on top of
    /// the default table (entries not present in the document keep their
    /// default value).
    ///
    /// # Errors
    ///
    /// Returns the `toml` deserialization error on malformed input.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let overrides: HashMap<BoneKindKey, JointLimits> = toml::from_str(source)?;
        let mut table = Self::default();
        table.limits.extend(overrides);
        Ok(table)
    }
}

impl Default for JointLimitTable {
    fn default() -> Self {
        use std::f32::consts::FRAC_PI_2;
        use std::f32::consts::FRAC_PI_4;

        let mut limits = HashMap::new();
        limits.insert(
            bone_kind_key(BoneKind::Spine),
            JointLimits {
                min_angle: [-FRAC_PI_4 * 0.5, -FRAC_PI_4 * 0.5, -FRAC_PI_4 * 0.5],
                max_angle: [FRAC_PI_4 * 0.5, FRAC_PI_4 * 0.5, FRAC_PI_4 * 0.5],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::Neck),
            JointLimits {
                min_angle: [-FRAC_PI_4, -FRAC_PI_2, -FRAC_PI_4],
                max_angle: [FRAC_PI_4, FRAC_PI_2, FRAC_PI_4],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::Hip),
            JointLimits {
                min_angle: [-FRAC_PI_2, -FRAC_PI_4 * 0.5, -FRAC_PI_4],
                max_angle: [FRAC_PI_2, FRAC_PI_4 * 0.5, FRAC_PI_4],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::Knee),
            JointLimits {
                min_angle: [0.0, 0.0, 0.0],
                max_angle: [FRAC_PI_2 * 1.5, 0.0, 0.0],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::Ankle),
            JointLimits {
                min_angle: [-FRAC_PI_4, -FRAC_PI_4 * 0.5, -FRAC_PI_4 * 0.5],
                max_angle: [FRAC_PI_4, FRAC_PI_4 * 0.5, FRAC_PI_4 * 0.5],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::Shoulder),
            JointLimits {
                min_angle: [-FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_4],
                max_angle: [FRAC_PI_2, FRAC_PI_2, FRAC_PI_4],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::TailSegment),
            JointLimits {
                min_angle: [-FRAC_PI_4, -FRAC_PI_4, -FRAC_PI_4],
                max_angle: [FRAC_PI_4, FRAC_PI_4, FRAC_PI_4],
            },
        );
        limits.insert(
            bone_kind_key(BoneKind::Tentacle),
            JointLimits {
                min_angle: [-FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_2],
                max_angle: [FRAC_PI_2, FRAC_PI_2, FRAC_PI_2],
            },
        );
        limits.insert(bone_kind_key(BoneKind::Root), JointLimits::UNLIMITED);

        Self { limits }
    }
}

/// A named locomotion gait with a per-limb phase offset (in `[0, 1)` cycle
/// fraction) and stride/cycle parameters, consumed by the Animation
/// Driver's locomotion sub-mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gait {
    /// Gait name (`"walk"`, `"trot"`, `"gallop"`, `"swim-undulation"`,
    /// `"flap"`).
    pub name: String,
    /// Phase offset per limb index (0..4), cycle fraction in `[0, 1)`.
    pub limb_phase_offsets: Vec<f32>,
    /// Duty factor: fraction of the cycle each foot spends planted.
    pub duty_factor: f32,
    /// Stride length scale relative to body length.
    pub stride_scale: f32,
}

/// Process-wide gait table, keyed by rig category, holding the available
/// gaits for that category ordered from slowest to fastest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaitTable {
    gaits: HashMap<String, Vec<Gait>>,
}

impl GaitTable {
    fn category_key(category: RigCategory) -> String {
        format!("{category:?}")
    }

    /// Returns the gait list for a category, defaulting to a single
    /// generic walk cycle if the category has no dedicated entry.
    #[must_use]
    pub fn gaits_for(&self, category: RigCategory) -> &[Gait] {
        self.gaits
            .get(&Self::category_key(category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Picks the gait whose speed bracket best matches a normalized speed
    /// in `[0, 1]` (0 = standing, 1 = fastest gait for the category).
    #[must_use]
    pub fn select_gait(&self, category: RigCategory, normalized_speed: f32) -> Option<&Gait> {
        let gaits = self.gaits_for(category);
        if gaits.is_empty() {
            return None;
        }
        let idx = ((normalized_speed.clamp(0.0, 1.0)) * (gaits.len() - 1) as f32).round() as usize;
        gaits.get(idx.min(gaits.len() - 1))
    }
}

impl Default for GaitTable {
    fn default() -> Self {
        let mut gaits = HashMap::new();

        gaits.insert(
            Self::category_key(RigCategory::Quadruped),
            vec![
                Gait {
                    name: "walk".to_string(),
                    limb_phase_offsets: vec![0.0, 0.5, 0.25, 0.75],
                    duty_factor: 0.75,
                    stride_scale: 0.6,
                },
                Gait {
                    name: "trot".to_string(),
                    limb_phase_offsets: vec![0.0, 0.5, 0.5, 0.0],
                    duty_factor: 0.5,
                    stride_scale: 0.9,
                },
                Gait {
                    name: "gallop".to_string(),
                    limb_phase_offsets: vec![0.0, 0.1, 0.5, 0.6],
                    duty_factor: 0.3,
                    stride_scale: 1.3,
                },
            ],
        );
        gaits.insert(
            Self::category_key(RigCategory::Hexapod),
            vec![Gait {
                name: "tripod".to_string(),
                limb_phase_offsets: vec![0.0, 0.5, 0.0, 0.5, 0.0, 0.5],
                duty_factor: 0.6,
                stride_scale: 0.5,
            }],
        );
        gaits.insert(
            Self::category_key(RigCategory::Biped),
            vec![
                Gait {
                    name: "walk".to_string(),
                    limb_phase_offsets: vec![0.0, 0.5],
                    duty_factor: 0.65,
                    stride_scale: 0.7,
                },
                Gait {
                    name: "run".to_string(),
                    limb_phase_offsets: vec![0.0, 0.5],
                    duty_factor: 0.35,
                    stride_scale: 1.1,
                },
            ],
        );
        gaits.insert(
            Self::category_key(RigCategory::Serpentine),
            vec![Gait {
                name: "swim-undulation".to_string(),
                limb_phase_offsets: vec![],
                duty_factor: 1.0,
                stride_scale: 1.0,
            }],
        );
        gaits.insert(
            Self::category_key(RigCategory::Fish),
            vec![Gait {
                name: "swim-undulation".to_string(),
                limb_phase_offsets: vec![],
                duty_factor: 1.0,
                stride_scale: 1.0,
            }],
        );
        gaits.insert(
            Self::category_key(RigCategory::Avian),
            vec![Gait {
                name: "flap".to_string(),
                limb_phase_offsets: vec![0.0, 0.0],
                duty_factor: 1.0,
                stride_scale: 1.0,
            }],
        );

        Self { gaits }
    }
}
