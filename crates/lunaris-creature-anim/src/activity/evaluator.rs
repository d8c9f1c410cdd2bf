//! C3 — Trigger Evaluator.
//!
//! Folds per-creature drives and environment hints into a single desired
//! [`ActivityType`] each tick. Priority-first, not pure utility: a
//! higher-priority candidate above threshold always beats a lower-priority
//! one with a bigger need score, so a cornered creature's `ThreatDisplay`
//! can't flicker to `Grooming` just because grooming's need also clears the
//! bar.

use super::types::{ActivityConfigTable, ActivityTriggers, ActivityType};

/// Need scores below this are discarded as candidates entirely.
pub const ACTIVATION_THRESHOLD: f32 = 0.35;

/// Need score floor below which a creature is considered to have no drive
/// to wander, so the fallback resolves to `Idle` rather than `Locomotion`.
const WANDER_THRESHOLD: f32 = 0.15;

/// Computes the raw need score for one activity type from the current
/// triggers. Not gated by [`ACTIVATION_THRESHOLD`] — that's applied by the
/// caller uniformly across all types.
#[must_use]
fn need_score(activity: ActivityType, t: &ActivityTriggers) -> f32 {
    match activity {
        ActivityType::Idle | ActivityType::Locomotion => 0.0,
        ActivityType::Eating => t.hunger * if t.food_nearby { 1.0 } else { 0.3 },
        ActivityType::Drinking => t.thirst * 0.9,
        ActivityType::Sleeping => t.fatigue * if t.threat_present { 0.2 } else { 1.0 },
        ActivityType::Grooming => t.grooming_need * if t.threat_present { 0.3 } else { 1.0 },
        ActivityType::ThreatDisplay => {
            t.threat_level * 1.2 * if t.territory_intrusion { 1.5 } else { 1.0 }
        }
        ActivityType::Mating => t.reproductive * if t.mate_present { 1.0 } else { 0.1 },
        ActivityType::Excretion => t.excretion_need,
        ActivityType::Vocalizing => t.vocalize_urge,
        ActivityType::Resting => t.fatigue * 0.5,
        ActivityType::Alert => t.threat_level * if t.territory_intrusion { 1.0 } else { 0.6 },
    }
}

/// Picks the desired activity for this tick.
///
/// `current` only affects the result through the `Idle`/`Locomotion`
/// fallback — priority arbitration against the *current* activity's
/// `canBeInterrupted`/`priority` happens in the state machine, not here.
#[must_use]
pub fn evaluate(
    triggers: &ActivityTriggers,
    table: &ActivityConfigTable,
    _current: ActivityType,
) -> ActivityType {
    let mut candidates: Vec<(ActivityType, f32)> = ActivityType::ALL
        .iter()
        .copied()
        .filter(|a| !matches!(a, ActivityType::Idle | ActivityType::Locomotion))
        .map(|a| (a, need_score(a, triggers)))
        .filter(|(_, score)| *score >= ACTIVATION_THRESHOLD)
        .collect();

    candidates.sort_by(|(a_type, a_score), (b_type, b_score)| {
        let a_cfg = table.get(*a_type);
        let b_cfg = table.get(*b_type);
        b_cfg
            .priority
            .cmp(&a_cfg.priority)
            .then_with(|| b_score.partial_cmp(a_score).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a_type.stable_id().cmp(&b_type.stable_id()))
    });

    if let Some((top, _)) = candidates.first() {
        return *top;
    }

    let wander_drive = triggers.hunger.max(triggers.thirst).max(triggers.social);
    if wander_drive > WANDER_THRESHOLD {
        ActivityType::Locomotion
    } else {
        ActivityType::Idle
    }
}
