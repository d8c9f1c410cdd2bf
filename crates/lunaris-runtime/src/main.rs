//! Demonstration binary for the procedural creature animation core.
//!
//! Spawns a handful of creatures with distinct morphologies, drives them
//! through a synthetic trigger stream for a few in-game minutes, and prints
//! a `debugInfo`-style summary every few ticks. Not part of the core's
//! public contract — just the workspace's usual way of exercising a
//! subsystem end-to-end outside of its unit tests.

use glam::Vec3;
use lunaris_creature_anim::activity::ActivityTriggers;
use lunaris_creature_anim::external::{FlatTerrain, MotionState};
use lunaris_creature_anim::genes::MorphologyGenes;
use lunaris_creature_anim::CreatureAnimation;

const TICK_DT: f32 = 1.0 / 30.0;
const TOTAL_TICKS: u32 = 900;
const PRINT_EVERY: u32 = 60;

fn quadruped_genes() -> MorphologyGenes {
    let mut genes = MorphologyGenes::default();
    genes.leg_pairs = 2;
    genes.spine_segments = 10;
    genes.tail_segments = 6;
    genes.tail_length = 0.6;
    genes
}

fn avian_genes() -> MorphologyGenes {
    let mut genes = MorphologyGenes::default();
    genes.leg_pairs = 1;
    genes.has_wings = true;
    genes.spine_segments = 6;
    genes.tail_segments = 3;
    genes.tail_length = 0.3;
    genes
}

fn serpentine_genes() -> MorphologyGenes {
    let mut genes = MorphologyGenes::default();
    genes.leg_pairs = 0;
    genes.can_walk = false;
    genes.aquatic = true;
    genes.spine_segments = 16;
    genes.tail_length = 0.0;
    genes.tail_segments = 0;
    genes
}

/// Synthesizes a plausible trigger stream: hunger climbs steadily until food
/// shows up around the halfway mark, then a brief threat spike interrupts
/// whatever was running.
fn triggers_for_tick(tick: u32) -> ActivityTriggers {
    let t = tick as f32 / TOTAL_TICKS as f32;
    let hunger = (t * 1.6).min(1.0);
    let food_nearby = t > 0.4;
    let threat = if (0.55..0.62).contains(&t) { 0.9 } else { 0.0 };

    ActivityTriggers {
        hunger,
        thirst: (t * 0.5).min(0.6),
        threat_level: threat,
        threat_present: threat > 0.0,
        food_nearby,
        target_world_pos: food_nearby.then_some(Vec3::new(3.0, 0.0, 1.0)),
        ..ActivityTriggers::default()
    }
}

fn main() {
    if let Err(err) = lunaris_runtime::init() {
        eprintln!("Failed to initialize Lunaris Runtime: {err}");
        std::process::exit(1);
    }

    let mut core = CreatureAnimation::new();
    let terrain = FlatTerrain;

    let specimens = [
        ("quadruped", quadruped_genes()),
        ("avian", avian_genes()),
        ("serpentine", serpentine_genes()),
    ];

    let mut handles = Vec::new();
    for (name, genes) in specimens {
        match core.spawn(genes) {
            Ok(id) => {
                core.set_motion_state(
                    id,
                    MotionState {
                        position: Vec3::ZERO,
                        velocity: Vec3::new(0.0, 0.0, 0.4),
                        heading: Vec3::Z,
                    },
                );
                handles.push((name, id));
            }
            Err(err) => eprintln!("failed to spawn {name}: {err}"),
        }
    }

    for tick in 0..TOTAL_TICKS {
        let triggers = triggers_for_tick(tick);
        for (_, id) in &handles {
            core.set_triggers(*id, triggers);
        }
        core.update_all(TICK_DT, &terrain);

        if tick % PRINT_EVERY == 0 {
            for (name, id) in &handles {
                if let Some(info) = core.debug_info(*id) {
                    println!("[t={:5.1}s] {name:<10} {info}", tick as f32 * TICK_DT);
                }
            }
        }
    }

    println!("ran {} creatures for {TOTAL_TICKS} ticks", core.len());
}
