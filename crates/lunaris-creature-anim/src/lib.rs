//! # Lunaris Creature Animation
//!
//! Procedural creature animation core: turns morphology genes into a bone
//! rig (C1 + C2), arbitrates and drives an activity state machine (C3 + C4),
//! emits a per-tick pose overlay and locomotion base pose (C5), solves IK and
//! composes the final pose (C6 + C7), and integrates secondary motion for
//! passive bones (C8).
//!
//! The core owns no rendering, physics, or AI of its own — it consumes
//! [`external::TerrainSampler`], [`external::BrainOutputs`], and
//! [`external::MotionState`] from collaborators elsewhere in the engine and
//! exposes a small handle-based surface: [`CreatureAnimation::spawn`],
//! [`CreatureAnimation::update`] / [`CreatureAnimation::update_all`], and
//! [`CreatureAnimation::read_pose`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activity;
pub mod debug;
pub mod driver;
pub mod error;
pub mod external;
pub mod genes;
pub mod ik;
pub mod pose;
pub mod rig;
pub mod rng;
pub mod transform;

use std::collections::HashMap;

use rand_pcg::Pcg32;
use rayon::prelude::*;

use activity::{
    evaluate, ActivityConfig, ActivityConfigTable, ActivityEvent, ActivityState, ActivityTriggers,
    ActivityType, TransitionPhase,
};
use debug::{format_debug_info, DebugCounters};
use driver::{build_overlay, locomotion_limb_targets};
use error::{AnimError, AnimResult};
use external::{BrainOutputs, MotionState, TerrainSampler};
use genes::MorphologyGenes;
use lunaris_core::Id;
use pose::{compose, IkTargets, SecondaryMotionState, SkeletonPose};
use rig::{GaitTable, JointLimitTable, RigBuildOptions, RigDefinition};
use transform::Transform;

/// Locomotion speed, in body-units/second, a creature is considered to be
/// moving at full tilt; used to normalize `MotionState::velocity` into the
/// `[0, 1]` gait-selection input.
pub const DEFAULT_MAX_SPEED: f32 = 2.0;

/// Optional sugar that forwards to [`lunaris_core::init`] and logs this
/// crate's version, matching the `init()` convention every other engine
/// subsystem (`lunaris_physics::init`, `lunaris_scripting::init`, ...)
/// follows. Calling it is never required: every other entry point in this
/// crate works correctly without a prior `init()` call, and callers already
/// running `lunaris_core::init()` elsewhere don't need to call this too.
///
/// # Errors
///
/// Returns an error if the logging subsystem fails to initialize.
pub fn init() -> lunaris_core::Result<()> {
    lunaris_core::init()?;
    tracing::info!("lunaris-creature-anim v{} initialized", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Everything the core tracks for a single spawned creature.
struct Creature {
    genes: MorphologyGenes,
    rig: RigDefinition,
    rng: Pcg32,
    activity_state: ActivityState,
    triggers: ActivityTriggers,
    motion: MotionState,
    pose: SkeletonPose,
    secondary_motion: SecondaryMotionState,
    debug: DebugCounters,
    elapsed: f32,
}

/// The procedural creature animation core: a handle-keyed registry of
/// creatures plus the process-wide, read-only-after-init configuration
/// tables shared across all of them.
///
/// Configuration tables (`activity_config`, `joint_limits`, `gait_table`)
/// are shared, matching the concurrency model's "read-only, shared" rule;
/// only [`CreatureAnimation::set_activity_config`] and the analogous table
/// setters mutate them, and never from inside a per-creature tick.
pub struct CreatureAnimation {
    creatures: HashMap<Id, Creature>,
    activity_config: ActivityConfigTable,
    joint_limits: JointLimitTable,
    gait_table: GaitTable,
    rig_options: RigBuildOptions,
    max_speed: f32,
    event_callbacks: Vec<Box<dyn Fn(Id, ActivityEvent) + Send + Sync>>,
}

impl Default for CreatureAnimation {
    fn default() -> Self {
        Self {
            creatures: HashMap::new(),
            activity_config: ActivityConfigTable::default(),
            joint_limits: JointLimitTable::default(),
            gait_table: GaitTable::default(),
            rig_options: RigBuildOptions::NONE,
            max_speed: DEFAULT_MAX_SPEED,
            event_callbacks: Vec::new(),
        }
    }
}

impl CreatureAnimation {
    /// Creates an empty core with the default configuration tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the joint limit table consulted by future rig builds.
    /// Creatures already spawned keep the limits baked in at spawn time.
    pub fn set_joint_limits(&mut self, table: JointLimitTable) {
        self.joint_limits = table;
    }

    /// Replaces the gait table consulted by locomotion driving.
    pub fn set_gait_table(&mut self, table: GaitTable) {
        self.gait_table = table;
    }

    /// Sets which optional rig features (ears, antennae) future spawns
    /// include.
    pub fn set_rig_options(&mut self, options: RigBuildOptions) {
        self.rig_options = options;
    }

    /// Sets the locomotion speed normalization constant used for gait
    /// selection.
    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.max_speed = max_speed;
    }

    /// Overrides the shared per-activity-type configuration. Affects every
    /// creature immediately, since the table is shared rather than copied
    /// per creature.
    pub fn set_activity_config(&mut self, activity: ActivityType, config: ActivityConfig) {
        self.activity_config.set(activity, config);
    }

    /// Classifies and builds a rig from `genes` and registers a new
    /// creature, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns [`AnimError::InvalidMorphology`] if `genes` fails validation,
    /// or [`AnimError::RigTooLarge`] if the built rig would exceed
    /// [`rig::MAX_BONES`]. Neither leaves a partial rig registered.
    pub fn spawn(&mut self, genes: MorphologyGenes) -> AnimResult<Id> {
        genes.validate()?;
        let rig = rig::build(&genes, &self.joint_limits, self.rig_options)?;
        let id = Id::new();
        let secondary_motion = SecondaryMotionState::new(&rig);
        let pose = SkeletonPose::bind_pose(&rig);
        self.creatures.insert(
            id,
            Creature {
                rng: rng::creature_rng(id.raw()),
                genes,
                rig,
                activity_state: ActivityState::default(),
                triggers: ActivityTriggers::default(),
                motion: MotionState::default(),
                pose,
                secondary_motion,
                debug: DebugCounters::default(),
                elapsed: 0.0,
            },
        );
        Ok(id)
    }

    /// Removes a creature, discarding all of its animation state.
    ///
    /// Returns `false` if `id` was never spawned or was already despawned.
    pub fn despawn(&mut self, id: Id) -> bool {
        self.creatures.remove(&id).is_some()
    }

    /// Whether `id` currently refers to a live creature.
    #[must_use]
    pub fn is_alive(&self, id: Id) -> bool {
        self.creatures.contains_key(&id)
    }

    /// Replaces this tick's drive/environment triggers for a creature.
    ///
    /// Returns `false` if `id` is not a live creature.
    pub fn set_triggers(&mut self, id: Id, triggers: ActivityTriggers) -> bool {
        let Some(creature) = self.creatures.get_mut(&id) else {
            return false;
        };
        creature.triggers = triggers;
        true
    }

    /// Replaces this tick's kinematic state (position/velocity/heading) for
    /// a creature, fed by the locomotion/physics collaborator.
    ///
    /// Returns `false` if `id` is not a live creature.
    pub fn set_motion_state(&mut self, id: Id, motion: MotionState) -> bool {
        let Some(creature) = self.creatures.get_mut(&id) else {
            return false;
        };
        creature.motion = motion;
        true
    }

    /// Pulls this tick's triggers for every live creature from a
    /// [`BrainOutputs`] collaborator, in place of individual
    /// [`Self::set_triggers`] calls. Creatures the collaborator has nothing
    /// new for keep their last triggers.
    pub fn refresh_triggers(&mut self, brain: &dyn BrainOutputs) {
        for (id, creature) in &mut self.creatures {
            if let Some(triggers) = brain.triggers_for(id.raw()) {
                creature.triggers = triggers;
            }
        }
    }

    /// Requests an activity directly for a creature, bypassing the Trigger
    /// Evaluator's scoring but still honoring interruption rules unless
    /// `force` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AnimError::UnknownActivity`] if `activity` has no
    /// registered config, or if `id` is not a live creature.
    pub fn request_activity(
        &mut self,
        id: Id,
        activity: ActivityType,
        force: bool,
    ) -> AnimResult<Vec<ActivityEvent>> {
        let events = {
            let creature = self
                .creatures
                .get_mut(&id)
                .ok_or(AnimError::UnknownActivity { activity })?;
            creature
                .activity_state
                .request_activity(activity, force, &self.activity_config, &mut creature.rng)?
        };
        for &event in &events {
            for callback in &self.event_callbacks {
                callback(id, event);
            }
        }
        Ok(events)
    }

    /// Clears a creature's secondary-motion springs (tail, ears, wing
    /// tips, antennae) to rest and forgets its last root velocity.
    ///
    /// Per §3's lifecycle, secondary motion persists across ticks and must
    /// be reset by the caller after a teleport or other large pose
    /// discontinuity — otherwise the next tick's acceleration estimate
    /// spikes from the position jump instead of genuine motion. The core
    /// has no notion of "teleport" itself (that's owned by the
    /// locomotion/physics collaborator via [`MotionState`]), so this is an
    /// explicit call rather than an automatic heuristic.
    ///
    /// Returns `false` if `id` is not a live creature.
    pub fn reset_secondary_motion(&mut self, id: Id) -> bool {
        let Some(creature) = self.creatures.get_mut(&id) else {
            return false;
        };
        creature.secondary_motion.reset();
        true
    }

    /// Forces an immediate blend-out of a creature's current activity,
    /// regardless of `canBeInterrupted`.
    ///
    /// Returns `false` if `id` is not a live creature.
    pub fn cancel_activity(&mut self, id: Id) -> bool {
        let Some(creature) = self.creatures.get_mut(&id) else {
            return false;
        };
        creature.activity_state.cancel_activity();
        true
    }

    /// Registers a callback invoked for every [`ActivityEvent`] raised by
    /// any creature, in per-creature invocation order. Dispatch happens
    /// synchronously within [`Self::update`] / [`Self::update_all`], on a
    /// single thread, after every creature's pose has been composed.
    pub fn register_event_callback<F>(&mut self, callback: F)
    where
        F: Fn(Id, ActivityEvent) + Send + Sync + 'static,
    {
        self.event_callbacks.push(Box::new(callback));
    }

    /// Advances a single creature by `dt`, dispatching its events.
    ///
    /// Returns `false` if `id` is not a live creature.
    pub fn update(&mut self, id: Id, dt: f32, terrain: &dyn TerrainSampler) -> bool {
        let Some(creature) = self.creatures.get_mut(&id) else {
            return false;
        };
        let events = tick_creature(creature, dt, &self.activity_config, &self.gait_table, terrain, self.max_speed);
        for event in events {
            for callback in &self.event_callbacks {
                callback(id, event);
            }
        }
        true
    }

    /// Advances every live creature by `dt`, data-parallel across
    /// creatures (phases 1-4 of the per-tick pipeline), then dispatches
    /// every creature's events serially on the calling thread (phase 5).
    ///
    /// No creature reads another creature's pose or state during its tick;
    /// the configuration tables are read-only for the duration of the call.
    pub fn update_all(&mut self, dt: f32, terrain: &(dyn TerrainSampler + Sync)) {
        let activity_config = &self.activity_config;
        let gait_table = &self.gait_table;
        let max_speed = self.max_speed;

        let dispatch: Vec<(Id, Vec<ActivityEvent>)> = self
            .creatures
            .par_iter_mut()
            .map(|(&id, creature)| {
                let events = tick_creature(creature, dt, activity_config, gait_table, terrain, max_speed);
                (id, events)
            })
            .collect();

        for (id, events) in dispatch {
            for event in events {
                for callback in &self.event_callbacks {
                    callback(id, event);
                }
            }
        }
    }

    /// Returns the current world-space transform of every bone in a
    /// creature's rig, recomputing the cache if this tick's composition
    /// marked it dirty.
    ///
    /// Returns `None` if `id` is not a live creature.
    pub fn read_pose(&mut self, id: Id) -> Option<Vec<Transform>> {
        let creature = self.creatures.get_mut(&id)?;
        Some(creature.pose.global_transforms(&creature.rig).to_vec())
    }

    /// Formats a one-line debug summary for a creature: current activity,
    /// transition phase and blend weight, activity progress, and recovered
    /// runtime error counters.
    ///
    /// Returns `None` if `id` is not a live creature.
    #[must_use]
    pub fn debug_info(&self, id: Id) -> Option<String> {
        let creature = self.creatures.get(&id)?;
        Some(format_debug_info(
            creature.activity_state.current,
            creature.activity_state.phase,
            creature.activity_state.blend_weight,
            creature.activity_state.time_in_activity,
            creature.activity_state.planned_duration,
            &creature.debug,
        ))
    }

    /// Number of live creatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    /// Whether no creatures are currently spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}

/// Runs the full per-creature pipeline for one tick: trigger-driven
/// arbitration, state machine advance, overlay + locomotion base pose
/// computation, IK and composition, and secondary motion integration.
/// Returns the events raised this tick, for the caller to dispatch.
fn tick_creature(
    creature: &mut Creature,
    dt: f32,
    activity_config: &ActivityConfigTable,
    gait_table: &GaitTable,
    terrain: &dyn TerrainSampler,
    max_speed: f32,
) -> Vec<ActivityEvent> {
    let desired = evaluate(&creature.triggers, activity_config, creature.activity_state.current);
    let mut events = creature
        .activity_state
        .update(dt, desired, activity_config, &mut creature.rng);
    creature.elapsed += dt;

    let current_cfg = *activity_config.get(creature.activity_state.current);
    if current_cfg.requires_target {
        match creature.triggers.target_world_pos {
            Some(pos) => creature.activity_state.target = Some(pos),
            None if creature.activity_state.phase != TransitionPhase::Idle => {
                creature.activity_state.cancel_activity();
                creature.debug.record_target_missing();
            }
            None => {}
        }
    }

    creature.debug.tick(dt);

    let mut overlay = build_overlay(
        creature.activity_state.current,
        &creature.activity_state,
        &creature.genes,
        &creature.rig,
        creature.elapsed,
    );
    overlay.limb_targets = locomotion_limb_targets(
        &creature.rig,
        gait_table,
        &creature.motion,
        terrain,
        creature.elapsed,
        creature.genes.body_length,
        max_speed,
        &mut creature.debug,
    );

    let base_pose = driver::base_locomotion_pose(&creature.rig, gait_table, &creature.motion, creature.elapsed, max_speed);
    let ik_targets = IkTargets::default();

    creature.pose = compose(
        &creature.rig,
        &base_pose,
        &overlay,
        &ik_targets,
        &mut creature.secondary_motion,
        creature.motion.velocity,
        dt,
        creature.elapsed,
        &mut creature.debug,
    );

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use external::FlatTerrain;
    use glam::Vec3;

    #[test]
    fn spawn_and_despawn_round_trip() {
        let mut core = CreatureAnimation::new();
        let id = core.spawn(MorphologyGenes::default()).unwrap();
        assert!(core.is_alive(id));
        assert_eq!(core.len(), 1);
        assert!(core.despawn(id));
        assert!(!core.is_alive(id));
    }

    #[test]
    fn invalid_morphology_is_rejected_without_registering_a_creature() {
        let mut core = CreatureAnimation::new();
        let mut genes = MorphologyGenes::default();
        genes.body_length = -1.0;
        assert!(core.spawn(genes).is_err());
        assert_eq!(core.len(), 0);
    }

    #[test]
    fn update_on_unknown_handle_returns_false() {
        let mut core = CreatureAnimation::new();
        let bogus = Id::from_raw(999_999);
        let terrain = FlatTerrain;
        assert!(!core.update(bogus, 1.0 / 60.0, &terrain));
    }

    #[test]
    fn zero_dt_updates_are_idempotent() {
        let mut core = CreatureAnimation::new();
        let id = core.spawn(MorphologyGenes::default()).unwrap();
        let terrain = FlatTerrain;
        core.update(id, 0.0, &terrain);
        let first = core.read_pose(id).unwrap();
        core.update(id, 0.0, &terrain);
        let second = core.read_pose(id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_produces_a_finite_normalized_pose() {
        let mut core = CreatureAnimation::new();
        let id = core.spawn(MorphologyGenes::default()).unwrap();
        let terrain = FlatTerrain;
        core.set_motion_state(id, MotionState { position: Vec3::ZERO, velocity: Vec3::Z * 0.5, heading: Vec3::Z });
        for _ in 0..120 {
            core.update(id, 1.0 / 60.0, &terrain);
        }
        let pose = core.read_pose(id).unwrap();
        assert!(pose.iter().all(|t| t.translation.is_finite() && t.rotation.is_finite()));
    }

    #[test]
    fn update_all_drives_every_creature() {
        let mut core = CreatureAnimation::new();
        let ids: Vec<Id> = (0..8).map(|_| core.spawn(MorphologyGenes::default()).unwrap()).collect();
        let terrain = FlatTerrain;
        for _ in 0..10 {
            core.update_all(1.0 / 60.0, &terrain);
        }
        for id in ids {
            let pose = core.read_pose(id).unwrap();
            assert!(pose.iter().all(|t| t.translation.is_finite()));
        }
    }

    #[test]
    fn event_callbacks_observe_activity_started() {
        use std::sync::{Arc, Mutex};
        let mut core = CreatureAnimation::new();
        let id = core.spawn(MorphologyGenes::default()).unwrap();
        let seen: Arc<Mutex<Vec<ActivityEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        core.register_event_callback(move |_id, event| {
            seen_clone.lock().unwrap().push(event);
        });
        core.request_activity(id, ActivityType::Grooming, true).unwrap();
        let terrain = FlatTerrain;
        core.update(id, 1.0 / 60.0, &terrain);
        let events = seen.lock().unwrap();
        assert!(events.iter().any(|e| matches!(e, ActivityEvent::Started(ActivityType::Grooming))));
    }

    #[test]
    fn excretion_cannot_be_interrupted_by_threat() {
        let mut core = CreatureAnimation::new();
        let id = core.spawn(MorphologyGenes::default()).unwrap();
        core.request_activity(id, ActivityType::Excretion, true).unwrap();
        let terrain = FlatTerrain;
        core.set_triggers(id, ActivityTriggers { threat_level: 1.0, threat_present: true, ..Default::default() });
        for _ in 0..5 {
            core.update(id, 1.0 / 60.0, &terrain);
        }
        assert_eq!(core.debug_info(id).unwrap().contains("Excretion"), true);
    }

    #[test]
    fn reset_secondary_motion_clears_tail_spring_state() {
        let mut core = CreatureAnimation::new();
        let mut genes = MorphologyGenes::default();
        genes.leg_pairs = 2;
        genes.tail_segments = 5;
        genes.tail_length = 0.5;
        let id = core.spawn(genes).unwrap();
        let terrain = FlatTerrain;
        core.set_motion_state(id, MotionState { position: Vec3::ZERO, velocity: Vec3::new(3.0, 0.0, 0.0), heading: Vec3::Z });
        for _ in 0..10 {
            core.update(id, 1.0 / 60.0, &terrain);
        }
        let creature = core.creatures.get(&id).unwrap();
        let tail_idx = creature.rig.tail_chain.as_ref().unwrap()[0];
        let before = creature.secondary_motion.offset_for_bone(tail_idx).unwrap();
        assert!(before.length() > 0.0, "tail spring should have picked up a nonzero offset from the velocity kick");

        assert!(core.reset_secondary_motion(id));
        let creature = core.creatures.get(&id).unwrap();
        let after = creature.secondary_motion.offset_for_bone(tail_idx).unwrap();
        assert_eq!(after, Vec3::ZERO);
    }

    #[test]
    fn reset_secondary_motion_on_unknown_handle_returns_false() {
        let mut core = CreatureAnimation::new();
        let bogus = Id::from_raw(999_997);
        assert!(!core.reset_secondary_motion(bogus));
    }

    #[test]
    fn request_activity_on_unknown_handle_is_rejected() {
        let mut core = CreatureAnimation::new();
        let bogus = Id::from_raw(999_998);
        assert!(core.request_activity(bogus, ActivityType::Grooming, true).is_err());
    }
}
