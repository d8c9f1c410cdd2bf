//! End-to-end scenarios driving the public `CreatureAnimation` surface the
//! way a gameplay/AI collaborator would, rather than exercising individual
//! components in isolation.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use lunaris_creature_anim::activity::{ActivityEvent, ActivityTriggers, ActivityType};
use lunaris_creature_anim::external::{FlatTerrain, MotionState};
use lunaris_creature_anim::genes::MorphologyGenes;
use lunaris_creature_anim::ik::solve_two_bone;
use lunaris_creature_anim::rig::{self, JointLimitTable, RigBuildOptions, RigCategory};
use lunaris_creature_anim::CreatureAnimation;

const DT: f32 = 1.0 / 60.0;

fn quadruped_genes() -> MorphologyGenes {
    let mut genes = MorphologyGenes::default();
    genes.leg_pairs = 2;
    genes.spine_segments = 14;
    genes.tail_segments = 6;
    genes.tail_length = 0.6;
    genes
}

fn serpentine_genes() -> MorphologyGenes {
    let mut genes = MorphologyGenes::default();
    genes.aquatic = true;
    genes.can_walk = false;
    genes.leg_pairs = 0;
    genes.spine_segments = 20;
    genes.tail_length = 0.0;
    genes.tail_segments = 0;
    genes
}

/// Scenario 1: a hungry quadruped with food in view should settle into
/// `Eating` well within the 0.4s blend window the evaluator and state
/// machine are tuned for, and its head should track toward the food.
#[test]
fn hungry_quadruped_with_food_nearby_starts_eating_quickly() {
    let mut core = CreatureAnimation::new();
    let id = core.spawn(quadruped_genes()).unwrap();
    let terrain = FlatTerrain;

    let food_pos = Vec3::new(0.5, 0.2, 1.0);
    core.set_triggers(
        id,
        ActivityTriggers {
            hunger: 0.9,
            food_nearby: true,
            target_world_pos: Some(food_pos),
            ..ActivityTriggers::default()
        },
    );

    let ticks = (0.4 / DT).ceil() as u32;
    for _ in 0..ticks {
        core.update(id, DT, &terrain);
    }

    let info = core.debug_info(id).unwrap();
    assert!(info.contains("activity=Eating"), "expected Eating, got: {info}");

    let pose = core.read_pose(id).unwrap();
    assert!(pose.iter().all(|t| t.translation.is_finite()));
}

/// Scenario 2: a sleeping creature is interrupted by a sudden threat exactly
/// once, and transitions into `ThreatDisplay`.
#[test]
fn threat_interrupts_sleeping_creature_exactly_once() {
    let mut core = CreatureAnimation::new();
    let id = core.spawn(quadruped_genes()).unwrap();
    let terrain = FlatTerrain;

    let seen: Arc<Mutex<Vec<ActivityEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    core.register_event_callback(move |_id, event| {
        seen_clone.lock().unwrap().push(event);
    });

    core.request_activity(id, ActivityType::Sleeping, true).unwrap();
    for _ in 0..10 {
        core.update(id, DT, &terrain);
    }

    core.set_triggers(
        id,
        ActivityTriggers {
            threat_level: 1.0,
            threat_present: true,
            ..ActivityTriggers::default()
        },
    );
    for _ in 0..5 {
        core.update(id, DT, &terrain);
    }

    let events = seen.lock().unwrap();
    let interrupt_count = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ActivityEvent::Interrupted { from, to }
                    if *from == ActivityType::Sleeping && *to == ActivityType::ThreatDisplay
            )
        })
        .count();
    assert_eq!(interrupt_count, 1);
    assert!(core.debug_info(id).unwrap().contains("activity=ThreatDisplay"));
}

/// Scenario 3: excretion can't be interrupted by anything, including a
/// threat. The threat display request is queued and only takes effect once
/// the excretion's `Hold` naturally completes.
#[test]
fn excretion_defers_threat_display_until_hold_completes() {
    let mut core = CreatureAnimation::new();
    let id = core.spawn(quadruped_genes()).unwrap();
    let terrain = FlatTerrain;

    core.request_activity(id, ActivityType::Excretion, true).unwrap();
    // Push well past blend-in into Hold before the threat arrives.
    for _ in 0..20 {
        core.update(id, DT, &terrain);
    }
    assert!(core.debug_info(id).unwrap().contains("activity=Excretion"));

    core.set_triggers(
        id,
        ActivityTriggers {
            threat_level: 1.0,
            threat_present: true,
            ..ActivityTriggers::default()
        },
    );
    // Still well within Excretion's max_duration (3.0s): must stay put.
    for _ in 0..30 {
        core.update(id, DT, &terrain);
    }
    assert!(core.debug_info(id).unwrap().contains("activity=Excretion"));

    // Run out past the max Hold duration; the queued ThreatDisplay should
    // now take over.
    for _ in 0..300 {
        core.update(id, DT, &terrain);
    }
    assert!(core.debug_info(id).unwrap().contains("activity=ThreatDisplay"));
}

/// Scenario 4: a serpentine swimmer classifies correctly, builds a
/// limbless 22-bone rig, and produces a finite pose purely from spine
/// undulation (no leg/wing IK chains to drive).
#[test]
fn serpentine_swimmer_has_no_limbs_and_animates_cleanly() {
    let table = JointLimitTable::default();
    let genes = serpentine_genes();
    let built = rig::build(&genes, &table, RigBuildOptions::NONE).unwrap();
    assert_eq!(built.category, RigCategory::Serpentine);
    assert_eq!(built.bone_count(), 22);
    assert!(built.limbs.is_empty());

    let mut core = CreatureAnimation::new();
    let id = core.spawn(genes).unwrap();
    let terrain = FlatTerrain;
    core.set_motion_state(
        id,
        MotionState {
            position: Vec3::ZERO,
            velocity: Vec3::new(0.0, 0.0, 0.6),
            heading: Vec3::Z,
        },
    );
    for _ in 0..180 {
        core.update(id, DT, &terrain);
    }
    let pose = core.read_pose(id).unwrap();
    assert_eq!(pose.len(), 22);
    assert!(pose.iter().all(|t| t.translation.is_finite() && t.rotation.is_finite()));
}

/// Scenario 5: a foot target placed far beyond the leg's reach stretches
/// the two-bone chain fully toward it instead of erroring or producing
/// non-finite output.
#[test]
fn unreachable_foot_target_stretches_without_panicking() {
    let root = Vec3::ZERO;
    let target = Vec3::new(0.0, -50.0, 0.0);
    let outcome = solve_two_bone(root, 0.4, 0.35, target, Vec3::Z, std::f32::consts::PI).unwrap();
    assert!(outcome.fully_extended);
    assert!(outcome.end.is_finite());
    assert!((outcome.end - root).length() <= 0.4 + 0.35 + 1e-4);
    assert!(outcome.residual > 0.0);

    // The same thing must hold up through a full creature tick: place the
    // creature far from flat ground via an extreme forward velocity and
    // confirm the pose stays finite even under sustained stretch.
    let mut core = CreatureAnimation::new();
    let id = core.spawn(quadruped_genes()).unwrap();
    let terrain = FlatTerrain;
    core.set_motion_state(
        id,
        MotionState {
            position: Vec3::ZERO,
            velocity: Vec3::new(0.0, 0.0, 50.0),
            heading: Vec3::Z,
        },
    );
    for _ in 0..120 {
        core.update(id, DT, &terrain);
    }
    let pose = core.read_pose(id).unwrap();
    assert!(pose.iter().all(|t| t.translation.is_finite() && t.rotation.is_finite()));
}

/// Scenario 6: determinism. Everything in the per-tick pipeline is a pure
/// function of `dt`, triggers, and motion state, except `plannedDuration`
/// sampling, which only ever draws from the per-creature RNG while
/// transitioning into a finite-duration activity. Holding triggers at a
/// constant, fully-idle baseline (so the state machine never leaves `Idle`
/// and the RNG is never touched) isolates the rest of the pipeline: two
/// independently spawned creatures — different ids, therefore different
/// RNG seeds — fed the identical motion/`dt` stream through the serial
/// `update` path and the parallel `update_all` path respectively must land
/// on bit-identical poses, since gait phase and spine undulation depend
/// only on elapsed time, not on randomness or dispatch order.
#[test]
fn serial_and_batched_dispatch_agree_bit_for_bit() {
    let motion_at = |tick: u32| -> MotionState {
        let t = tick as f32 * DT;
        MotionState {
            position: Vec3::new(0.0, 0.0, t * 0.5),
            velocity: Vec3::new(0.0, 0.0, 0.5),
            heading: Vec3::Z,
        }
    };

    let mut core_a = CreatureAnimation::new();
    let id_a = core_a.spawn(quadruped_genes()).unwrap();
    let terrain = FlatTerrain;
    for tick in 0..1000u32 {
        core_a.set_motion_state(id_a, motion_at(tick));
        core_a.update(id_a, DT, &terrain);
    }
    let pose_a = core_a.read_pose(id_a).unwrap();

    let mut core_b = CreatureAnimation::new();
    let id_b = core_b.spawn(quadruped_genes()).unwrap();
    for tick in 0..1000u32 {
        core_b.set_motion_state(id_b, motion_at(tick));
        core_b.update_all(DT, &terrain);
    }
    let pose_b = core_b.read_pose(id_b).unwrap();

    assert!(core_a.debug_info(id_a).unwrap().contains("activity=Idle"));
    assert_eq!(pose_a.len(), pose_b.len());
    for (a, b) in pose_a.iter().zip(pose_b.iter()) {
        assert_eq!(a.translation, b.translation);
        assert_eq!(a.rotation, b.rotation);
        assert_eq!(a.scale, b.scale);
    }
}
