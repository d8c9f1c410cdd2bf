//! Animation core benchmarks for Lunaris Engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use lunaris_creature_anim::external::{FlatTerrain, MotionState};
use lunaris_creature_anim::genes::MorphologyGenes;
use lunaris_creature_anim::ik::{solve_fabrik, solve_two_bone};
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

fn two_bone_solve_benchmark(c: &mut Criterion) {
    let root = Vec3::ZERO;
    let target = Vec3::new(0.1, -0.8, 0.2);
    c.bench_function("ik_two_bone_solve", |b| {
        b.iter(|| {
            black_box(solve_two_bone(
                root,
                0.5,
                0.45,
                target,
                Vec3::Z,
                std::f32::consts::FRAC_PI_2,
            ));
        });
    });
}

fn fabrik_solve_benchmark(c: &mut Criterion) {
    let anchor = Vec3::ZERO;
    let initial = vec![
        Vec3::new(0.0, -0.3, 0.0),
        Vec3::new(0.0, -0.6, 0.0),
        Vec3::new(0.0, -0.9, 0.0),
        Vec3::new(0.0, -1.2, 0.0),
    ];
    let lengths = vec![0.3, 0.3, 0.3, 0.3];
    let bend_limits = vec![std::f32::consts::PI; 4];
    let target = Vec3::new(0.4, -0.9, 0.3);
    c.bench_function("ik_fabrik_solve_4_segment", |b| {
        b.iter(|| {
            black_box(solve_fabrik(
                anchor,
                &initial,
                &lengths,
                &bend_limits,
                target,
                1e-3,
                10,
            ));
        });
    });
}

fn single_creature_tick_benchmark(c: &mut Criterion) {
    let mut core = CreatureAnimation::new();
    let id = core.spawn(quadruped_genes()).unwrap();
    core.set_motion_state(
        id,
        MotionState {
            position: Vec3::ZERO,
            velocity: Vec3::new(0.0, 0.0, 0.7),
            heading: Vec3::Z,
        },
    );
    let terrain = FlatTerrain;

    c.bench_function("single_creature_tick", |b| {
        b.iter(|| {
            core.update(id, DT, &terrain);
            black_box(core.read_pose(id));
        });
    });
}

fn thousand_creature_update_all_benchmark(c: &mut Criterion) {
    let mut core = CreatureAnimation::new();
    for _ in 0..1000 {
        let id = core.spawn(quadruped_genes()).unwrap();
        core.set_motion_state(
            id,
            MotionState {
                position: Vec3::ZERO,
                velocity: Vec3::new(0.0, 0.0, 0.7),
                heading: Vec3::Z,
            },
        );
    }
    let terrain = FlatTerrain;

    c.bench_function("thousand_creature_update_all", |b| {
        b.iter(|| {
            core.update_all(DT, &terrain);
        });
    });
}

criterion_group!(
    benches,
    two_bone_solve_benchmark,
    fabrik_solve_benchmark,
    single_creature_tick_benchmark,
    thousand_creature_update_all_benchmark,
);

criterion_main!(benches);
