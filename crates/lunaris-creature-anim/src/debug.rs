//! Per-creature debug counters and the `debugInfo` formatter (§6/§7).
//!
//! Runtime errors (`IkDegenerate`, `StaleTerrain`, `TargetMissing`) are
//! always recovered locally and never propagate as an `Err` from `update`;
//! this module is where they become observable instead, via counters a
//! caller can inspect through [`crate::CreatureAnimation::debug_info`].

use std::collections::HashMap;

use crate::activity::{ActivityType, TransitionPhase};

/// Accumulated, per-creature counts of recovered runtime errors, plus the
/// last IK residual observed per limb — enough to answer "is this creature
/// currently degenerate" without re-running the solve.
#[derive(Debug, Clone, Default)]
pub struct DebugCounters {
    /// Total `IkDegenerate` recoveries since spawn, per chain name.
    pub ik_degenerate_count: HashMap<String, u64>,
    /// Unix-seconds-since-spawn timestamp of the last `IkDegenerate` log for
    /// a chain, used to rate-limit logging to once per second per §7.
    pub(crate) ik_degenerate_last_logged: HashMap<String, f32>,
    /// Total `StaleTerrain` occurrences since spawn.
    pub stale_terrain_count: u64,
    /// Total `TargetMissing`-forced `BlendOut`s since spawn.
    pub target_missing_count: u64,
    /// Last observed end-effector residual per limb index, in body-units.
    pub last_ik_residual: HashMap<usize, f32>,
    /// Running clock used only to rate-limit `IkDegenerate` logging; driven
    /// by the same `dt` stream as the rest of the creature, not wall time.
    pub(crate) clock: f32,
}

impl DebugCounters {
    /// Records an `IkDegenerate` recovery for a named chain, logging at
    /// `warn!` at most once per second for that chain.
    pub fn record_ik_degenerate(&mut self, chain: &str) {
        *self.ik_degenerate_count.entry(chain.to_string()).or_insert(0) += 1;
        let last = self.ik_degenerate_last_logged.get(chain).copied().unwrap_or(f32::NEG_INFINITY);
        if self.clock - last >= 1.0 {
            tracing::warn!(chain, "IK chain degenerate, reusing prior tick's pose");
            self.ik_degenerate_last_logged.insert(chain.to_string(), self.clock);
        }
    }

    /// Records a `StaleTerrain` fallback.
    pub fn record_stale_terrain(&mut self) {
        self.stale_terrain_count += 1;
    }

    /// Records a `TargetMissing`-forced `BlendOut`.
    pub fn record_target_missing(&mut self) {
        self.target_missing_count += 1;
        tracing::debug!("activity target went missing, forcing blend-out");
    }

    /// Records the end-effector residual for a limb after composition.
    pub fn record_ik_residual(&mut self, limb_idx: usize, residual: f32) {
        self.last_ik_residual.insert(limb_idx, residual);
    }

    /// Advances the rate-limiting clock by `dt`.
    pub fn tick(&mut self, dt: f32) {
        self.clock += dt;
    }
}

/// Formats a one-line, human-readable debug summary for a creature, per the
/// `debugInfo(handle) -> string` exposed surface in §6: current activity,
/// progress, transition state, and per-limb IK residual.
#[must_use]
pub fn format_debug_info(
    current: ActivityType,
    phase: TransitionPhase,
    blend_weight: f32,
    time_in_activity: f32,
    planned_duration: f32,
    counters: &DebugCounters,
) -> String {
    let phase_name = match phase {
        TransitionPhase::BlendIn => "BlendIn",
        TransitionPhase::Hold => "Hold",
        TransitionPhase::BlendOut => "BlendOut",
        TransitionPhase::Idle => "Idle",
    };
    let mut residuals: Vec<(usize, f32)> = counters.last_ik_residual.iter().map(|(k, v)| (*k, *v)).collect();
    residuals.sort_by_key(|(idx, _)| *idx);
    let residual_str: Vec<String> = residuals
        .iter()
        .map(|(idx, r)| format!("limb{idx}={r:.4}"))
        .collect();

    format!(
        "activity={current:?} phase={phase_name} blend={blend_weight:.2} progress={time_in_activity:.2}/{planned:.2} ik_degenerate_total={ik_degen} stale_terrain={stale} target_missing={target_missing} residuals=[{residuals}]",
        current = current,
        phase_name = phase_name,
        blend_weight = blend_weight,
        time_in_activity = time_in_activity,
        planned = planned_duration,
        ik_degen = counters.ik_degenerate_count.values().sum::<u64>(),
        stale = counters.stale_terrain_count,
        target_missing = counters.target_missing_count,
        residuals = residual_str.join(","),
    )
}
