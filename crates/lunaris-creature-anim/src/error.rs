//! Error types for the creature animation core.

use thiserror::Error;

use crate::activity::ActivityType;

/// Errors produced by the creature animation core.
///
/// Per the error handling design, only [`AnimError::InvalidMorphology`] and
/// [`AnimError::RigTooLarge`] are fatal: they can only occur at spawn time
/// and leave no partial rig behind. Every other variant is recovered locally
/// by the component that raised it and is surfaced only through
/// [`crate::debug::DebugCounters`] / `debugInfo`, never propagated as an
/// `Err` from `update`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimError {
    /// A gene value was outside its allowed range, or violated an
    /// inter-field constraint (e.g. `tail_segments` negative).
    #[error("invalid morphology: {reason}")]
    InvalidMorphology {
        /// Human-readable description of which constraint failed.
        reason: String,
    },

    /// The rig the builder would produce exceeds [`crate::rig::MAX_BONES`].
    #[error("rig too large: {bone_count} bones exceeds the {max} bone budget")]
    RigTooLarge {
        /// The bone count the builder computed before giving up.
        bone_count: usize,
        /// The configured maximum.
        max: usize,
    },

    /// An IK chain hit a degenerate configuration: NaN input, a zero-length
    /// segment, or a coincident target/anchor. Recovered by reusing the
    /// prior tick's chain pose.
    #[error("IK chain '{chain}' degenerate, reusing prior pose")]
    IkDegenerate {
        /// Name of the limb or chain that degenerated.
        chain: String,
    },

    /// `requestActivity` named a type that this rig category never
    /// registered an [`crate::activity::ActivityConfig`] for.
    #[error("activity {activity:?} is not registered for this rig")]
    UnknownActivity {
        /// The activity that was requested.
        activity: ActivityType,
    },

    /// The activity in progress requires a target (e.g. `foodPosition`) and
    /// the target went missing mid-activity.
    #[error("target missing for activity {activity:?}")]
    TargetMissing {
        /// The activity whose target disappeared.
        activity: ActivityType,
    },

    /// The `TerrainSampler` collaborator returned `Unknown` for a foot
    /// placement query; the cached last-good height was used instead.
    #[error("terrain sampler returned no data, using cached height")]
    StaleTerrain,
}

/// Result alias for creature animation operations.
pub type AnimResult<T> = Result<T, AnimError>;
