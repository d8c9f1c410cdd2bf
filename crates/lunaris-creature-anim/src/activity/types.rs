//! Activity types, per-activity configuration, and the triggers a behavior
//! collaborator feeds in each tick.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The closed set of behaviors the driver knows how to animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    /// No activity selected; the default resting state.
    Idle,
    /// Procedural step cycle driven by `MotionState`.
    Locomotion,
    Eating,
    Drinking,
    Sleeping,
    Grooming,
    ThreatDisplay,
    Mating,
    Excretion,
    Vocalizing,
    Resting,
    Alert,
}

impl ActivityType {
    /// All activity types, in a fixed declaration order used as the final
    /// tie-break key when the evaluator sorts candidates — this must never
    /// change between releases, since it is load-bearing for determinism.
    pub const ALL: [ActivityType; 12] = [
        ActivityType::Idle,
        ActivityType::Locomotion,
        ActivityType::Eating,
        ActivityType::Drinking,
        ActivityType::Sleeping,
        ActivityType::Grooming,
        ActivityType::ThreatDisplay,
        ActivityType::Mating,
        ActivityType::Excretion,
        ActivityType::Vocalizing,
        ActivityType::Resting,
        ActivityType::Alert,
    ];

    /// Stable ordinal used to break ties when priority and need score are
    /// both equal, so sort order is deterministic across runs regardless of
    /// hash-map iteration order.
    #[must_use]
    pub const fn stable_id(self) -> u8 {
        match self {
            ActivityType::Idle => 0,
            ActivityType::Locomotion => 1,
            ActivityType::Eating => 2,
            ActivityType::Drinking => 3,
            ActivityType::Sleeping => 4,
            ActivityType::Grooming => 5,
            ActivityType::ThreatDisplay => 6,
            ActivityType::Mating => 7,
            ActivityType::Excretion => 8,
            ActivityType::Vocalizing => 9,
            ActivityType::Resting => 10,
            ActivityType::Alert => 11,
        }
    }
}

/// Per-activity-type tuning, looked up by [`ActivityConfigTable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Higher wins when arbitrating between candidate activities.
    pub priority: i32,
    /// Minimum `Hold` duration, in seconds. `f32::INFINITY` for activities
    /// with no natural timeout (`Idle`, `Locomotion`).
    pub min_duration: f32,
    /// Maximum `Hold` duration, in seconds.
    pub max_duration: f32,
    /// Seconds to ramp `blendWeight` from 0 to 1 on entry.
    pub blend_in_time: f32,
    /// Seconds to ramp `blendWeight` from 1 to 0 on exit.
    pub blend_out_time: f32,
    /// Whether a higher-priority request can preempt this activity mid-hold.
    pub can_be_interrupted: bool,
    /// Metabolic cost, consulted by the (external) drives model, not by the
    /// core itself; carried through so the config table is a complete
    /// designer-facing record.
    pub energy_cost: f32,
    /// Social proximity range this activity cares about (e.g. `Mating`).
    pub social_range: f32,
    /// How strongly this activity reacts to the `stress` trigger; consulted
    /// by the Trigger Evaluator's scoring for some activity kinds.
    pub stress_response: f32,
    /// Whether this activity needs `ActivityTriggers::target_world_pos` to
    /// proceed; if the target disappears mid-activity the state machine
    /// forces `BlendOut` (see [`crate::error::AnimError::TargetMissing`]).
    pub requires_target: bool,
}

impl ActivityConfig {
    const fn new(
        priority: i32,
        min_duration: f32,
        max_duration: f32,
        blend_in_time: f32,
        blend_out_time: f32,
        can_be_interrupted: bool,
        requires_target: bool,
    ) -> Self {
        Self {
            priority,
            min_duration,
            max_duration,
            blend_in_time,
            blend_out_time,
            can_be_interrupted,
            energy_cost: 0.1,
            social_range: 0.0,
            stress_response: 0.0,
            requires_target,
        }
    }
}

/// Process-wide, read-only-after-init table of [`ActivityConfig`] values,
/// keyed by [`ActivityType`]. Ships with a representative [`Default`] and
/// can be overridden per-type at runtime or loaded wholesale from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfigTable {
    configs: HashMap<ActivityType, ActivityConfig>,
}

impl ActivityConfigTable {
    /// Looks up the config for an activity type, falling back to a neutral,
    /// always-losing, always-interruptible default if the rig never
    /// registered one (this should not happen for a properly seeded table,
    /// but the lookup must never panic — see
    /// [`crate::error::AnimError::UnknownActivity`], which is raised by
    /// `requestActivity`, not by this lookup).
    #[must_use]
    pub fn get(&self, activity: ActivityType) -> &ActivityConfig {
        self.configs.get(&activity).unwrap_or(&FALLBACK_CONFIG)
    }

    /// Overrides the config for a single activity type.
    pub fn set(&mut self, activity: ActivityType, config: ActivityConfig) {
        self.configs.insert(activity, config);
    }

    /// Whether a type has an explicitly registered config (used by
    /// `requestActivity` to reject unknown activities).
    #[must_use]
    pub fn is_registered(&self, activity: ActivityType) -> bool {
        self.configs.contains_key(&activity)
    }

    /// Removes a type's registration entirely. Only meant for building
    /// test fixtures that exercise the unregistered-activity path; a real
    /// process-wide table should never need to un-register a type.
    #[cfg(test)]
    pub(crate) fn unregister(&mut self, activity: ActivityType) {
        self.configs.remove(&activity);
    }

    /// Loads per-activity overrides from a TOML document keyed by the
    /// activity's `Debug` name (e.g. `[ThreatDisplay]`), layered on top of
    /// the default table.
    ///
    /// # Errors
    ///
    /// Returns the `toml` deserialization error on malformed input.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let overrides: HashMap<String, ActivityConfig> = toml::from_str(source)?;
        let mut table = Self::default();
        for (name, config) in overrides {
            if let Some(activity) = ActivityType::ALL.iter().find(|a| format!("{a:?}") == name) {
                table.set(*activity, config);
            }
        }
        Ok(table)
    }
}

static FALLBACK_CONFIG: ActivityConfig = ActivityConfig::new(0, 1.0, 1.0, 0.3, 0.3, true, false);

impl Default for ActivityConfigTable {
    fn default() -> Self {
        let mut configs = HashMap::new();
        configs.insert(
            ActivityType::Idle,
            ActivityConfig::new(0, f32::INFINITY, f32::INFINITY, 0.3, 0.3, true, false),
        );
        configs.insert(
            ActivityType::Locomotion,
            ActivityConfig::new(1, f32::INFINITY, f32::INFINITY, 0.25, 0.25, true, false),
        );
        configs.insert(ActivityType::Resting, ActivityConfig::new(2, 10.0, 60.0, 0.6, 0.6, true, false));
        configs.insert(ActivityType::Sleeping, ActivityConfig::new(3, 30.0, 120.0, 1.0, 1.0, true, false));
        configs.insert(ActivityType::Grooming, ActivityConfig::new(4, 3.0, 10.0, 0.3, 0.3, true, false));
        configs.insert(ActivityType::Vocalizing, ActivityConfig::new(5, 0.5, 2.0, 0.15, 0.15, true, false));
        configs.insert(ActivityType::Excretion, ActivityConfig::new(6, 1.0, 3.0, 0.2, 0.2, false, false));
        let mut eating = ActivityConfig::new(7, 2.0, 8.0, 0.4, 0.4, true, true);
        eating.social_range = 0.0;
        configs.insert(ActivityType::Eating, eating);
        configs.insert(ActivityType::Drinking, ActivityConfig::new(7, 1.5, 5.0, 0.3, 0.3, true, true));
        let mut mating = ActivityConfig::new(8, 4.0, 15.0, 0.5, 0.5, true, true);
        mating.social_range = 1.5;
        configs.insert(ActivityType::Mating, mating);
        configs.insert(ActivityType::Alert, ActivityConfig::new(8, 0.5, 3.0, 0.1, 0.2, true, false));
        configs.insert(
            ActivityType::ThreatDisplay,
            ActivityConfig::new(9, 1.5, 4.0, 0.2, 0.3, false, false),
        );
        Self { configs }
    }
}

/// Normalized per-creature drives and environment hints, refreshed each
/// tick by the (external) behavior collaborator. The core never reads
/// creature goals beyond this struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityTriggers {
    pub hunger: f32,
    pub thirst: f32,
    pub fatigue: f32,
    pub stress: f32,
    pub social: f32,
    pub reproductive: f32,
    pub grooming_need: f32,
    pub excretion_need: f32,
    pub vocalize_urge: f32,
    pub threat_level: f32,
    pub food_nearby: bool,
    pub mate_present: bool,
    pub threat_present: bool,
    pub territory_intrusion: bool,
    /// World-space position relevant to the current or candidate activity
    /// (food, mate, threat source); `None` when no candidate needs one.
    pub target_world_pos: Option<Vec3>,
}

impl Default for ActivityTriggers {
    fn default() -> Self {
        Self {
            hunger: 0.0,
            thirst: 0.0,
            fatigue: 0.0,
            stress: 0.0,
            social: 0.0,
            reproductive: 0.0,
            grooming_need: 0.0,
            excretion_need: 0.0,
            vocalize_urge: 0.0,
            threat_level: 0.0,
            food_nearby: false,
            mate_present: false,
            threat_present: false,
            territory_intrusion: false,
            target_world_pos: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_expected_priority_order() {
        let table = ActivityConfigTable::default();
        assert!(table.get(ActivityType::ThreatDisplay).priority > table.get(ActivityType::Eating).priority);
        assert!(table.get(ActivityType::Eating).priority > table.get(ActivityType::Sleeping).priority);
        assert!(table.get(ActivityType::Sleeping).priority > table.get(ActivityType::Locomotion).priority);
    }

    #[test]
    fn excretion_and_threat_display_cannot_be_interrupted() {
        let table = ActivityConfigTable::default();
        assert!(!table.get(ActivityType::Excretion).can_be_interrupted);
        assert!(!table.get(ActivityType::ThreatDisplay).can_be_interrupted);
    }

    #[test]
    fn unregistered_lookup_falls_back_without_panicking() {
        let mut table = ActivityConfigTable::default();
        table.configs.remove(&ActivityType::Vocalizing);
        assert!(!table.is_registered(ActivityType::Vocalizing));
        let cfg = table.get(ActivityType::Vocalizing);
        assert!(cfg.can_be_interrupted);
    }

    #[test]
    fn stable_ids_are_unique() {
        let mut ids: Vec<u8> = ActivityType::ALL.iter().map(|a| a.stable_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ActivityType::ALL.len());
    }

    #[test]
    fn override_via_set_is_visible() {
        let mut table = ActivityConfigTable::default();
        let mut cfg = *table.get(ActivityType::Eating);
        cfg.priority = 100;
        table.set(ActivityType::Eating, cfg);
        assert_eq!(table.get(ActivityType::Eating).priority, 100);
    }
}
