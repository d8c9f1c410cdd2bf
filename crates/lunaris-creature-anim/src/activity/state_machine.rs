//! C4 — Activity State Machine.
//!
//! `Idle → BlendIn → Hold → BlendOut → Idle`, with priority-driven
//! interruption and deferred (`queued`) transitions for activities that
//! can't be interrupted. All randomness (`plannedDuration` sampling) comes
//! from the per-creature RNG in [`crate::rng`], so replays are
//! bit-reproducible given an identical trigger/`dt` stream.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::types::{ActivityConfig, ActivityConfigTable, ActivityType};

/// Which leg of the blend-in/hold/blend-out cycle the current activity is
/// in. Named independently of [`ActivityType::Idle`] even though it has its
/// own `Idle` variant — the two enums are never confused in context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    BlendIn,
    Hold,
    BlendOut,
    /// No activity in progress; waiting for the next non-`Idle` desire.
    Idle,
}

/// Observable events dispatched synchronously out of [`ActivityState::update`],
/// collected by the caller and drained in the single-threaded event-dispatch
/// phase (see the concurrency model).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityEvent {
    Started(ActivityType),
    Completed(ActivityType),
    Interrupted { from: ActivityType, to: ActivityType },
    TransitionStarted,
    TransitionCompleted,
}

/// Per-creature mutable activity state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityState {
    pub current: ActivityType,
    pub previous: ActivityType,
    pub time_in_activity: f32,
    pub time_since_transition: f32,
    pub planned_duration: f32,
    pub phase: TransitionPhase,
    pub blend_weight: f32,
    pub target: Option<Vec3>,
    pub queued: Option<ActivityType>,
}

impl Default for ActivityState {
    fn default() -> Self {
        Self {
            current: ActivityType::Idle,
            previous: ActivityType::Idle,
            time_in_activity: 0.0,
            time_since_transition: 0.0,
            planned_duration: f32::INFINITY,
            phase: TransitionPhase::Idle,
            blend_weight: 0.0,
            target: None,
            queued: None,
        }
    }
}

fn sample_duration(cfg: &ActivityConfig, rng: &mut Pcg32) -> f32 {
    if !cfg.min_duration.is_finite() || !cfg.max_duration.is_finite() {
        return f32::INFINITY;
    }
    if cfg.max_duration <= cfg.min_duration {
        return cfg.min_duration;
    }
    rng.gen_range(cfg.min_duration..=cfg.max_duration)
}

impl ActivityState {
    /// Forces an immediate `BlendOut` of the current activity regardless of
    /// `canBeInterrupted`, used by external safety conditions (e.g. death).
    pub fn cancel_activity(&mut self) {
        if self.phase != TransitionPhase::BlendOut && self.current != ActivityType::Idle {
            self.phase = TransitionPhase::BlendOut;
            self.time_since_transition = 0.0;
        }
        self.queued = None;
    }

    /// Requests an activity directly, bypassing the Trigger Evaluator's
    /// scoring but still honoring interruption rules unless `force`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AnimError::UnknownActivity`] if `activity`
    /// has no registered config in `table`.
    pub fn request_activity(
        &mut self,
        activity: ActivityType,
        force: bool,
        table: &ActivityConfigTable,
        rng: &mut Pcg32,
    ) -> Result<Vec<ActivityEvent>, crate::error::AnimError> {
        if !table.is_registered(activity) {
            return Err(crate::error::AnimError::UnknownActivity { activity });
        }
        let mut events = Vec::new();
        if force {
            let cfg = *table.get(activity);
            let from = self.current;
            self.start_activity(activity, &cfg, rng, &mut events, Some(from));
        } else {
            self.apply_desired(activity, table, rng, &mut events);
        }
        Ok(events)
    }

    fn start_activity(
        &mut self,
        new: ActivityType,
        cfg: &ActivityConfig,
        rng: &mut Pcg32,
        events: &mut Vec<ActivityEvent>,
        interrupted_from: Option<ActivityType>,
    ) {
        if let Some(from) = interrupted_from {
            if from != new {
                events.push(ActivityEvent::Interrupted { from, to: new });
            }
        }
        self.previous = self.current;
        self.current = new;
        self.time_in_activity = 0.0;
        self.time_since_transition = 0.0;
        self.phase = TransitionPhase::BlendIn;
        self.blend_weight = 0.0;
        self.planned_duration = sample_duration(cfg, rng);
        self.queued = None;
        events.push(ActivityEvent::TransitionStarted);
        events.push(ActivityEvent::Started(new));
    }

    fn apply_desired(
        &mut self,
        desired: ActivityType,
        table: &ActivityConfigTable,
        rng: &mut Pcg32,
        events: &mut Vec<ActivityEvent>,
    ) {
        if desired == self.current {
            return;
        }
        let desired_cfg = *table.get(desired);
        let current_cfg = *table.get(self.current);
        if current_cfg.can_be_interrupted && desired_cfg.priority > current_cfg.priority {
            let from = self.current;
            self.start_activity(desired, &desired_cfg, rng, events, Some(from));
        } else if !current_cfg.can_be_interrupted {
            self.queued = Some(desired);
        }
    }

    /// Advances the state machine by `dt`, given this tick's desired
    /// activity from the Trigger Evaluator (or a direct `requestActivity`
    /// upstream). Returns the events raised this tick, in invocation order.
    #[must_use]
    pub fn update(
        &mut self,
        dt: f32,
        desired: ActivityType,
        table: &ActivityConfigTable,
        rng: &mut Pcg32,
    ) -> Vec<ActivityEvent> {
        let mut events = Vec::new();
        self.time_in_activity += dt;
        self.time_since_transition += dt;

        self.apply_desired(desired, table, rng, &mut events);

        match self.phase {
            TransitionPhase::BlendIn => {
                let blend_in = table.get(self.current).blend_in_time.max(f32::EPSILON);
                self.blend_weight = (self.time_since_transition / blend_in).min(1.0);
                if self.blend_weight >= 1.0 {
                    self.blend_weight = 1.0;
                    self.phase = TransitionPhase::Hold;
                    self.time_since_transition = 0.0;
                    events.push(ActivityEvent::TransitionCompleted);
                }
            }
            TransitionPhase::Hold => {
                if self.time_in_activity >= self.planned_duration {
                    events.push(ActivityEvent::Completed(self.current));
                    if let Some(queued) = self.queued.take() {
                        let cfg = *table.get(queued);
                        self.start_activity(queued, &cfg, rng, &mut events, None);
                    } else {
                        self.phase = TransitionPhase::BlendOut;
                        self.time_since_transition = 0.0;
                    }
                }
            }
            TransitionPhase::BlendOut => {
                let blend_out = table.get(self.current).blend_out_time.max(f32::EPSILON);
                self.blend_weight = (1.0 - self.time_since_transition / blend_out).max(0.0);
                if self.blend_weight <= 0.0 {
                    self.blend_weight = 0.0;
                    self.previous = self.current;
                    self.current = ActivityType::Idle;
                    self.phase = TransitionPhase::Idle;
                    self.time_in_activity = 0.0;
                    self.time_since_transition = 0.0;
                    self.target = None;
                }
            }
            TransitionPhase::Idle => {}
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::creature_rng;

    #[test]
    fn blend_weight_ramps_monotonically_during_blend_in() {
        let table = ActivityConfigTable::default();
        let mut rng = creature_rng(1);
        let mut state = ActivityState::default();
        let mut last = -1.0;
        for _ in 0..20 {
            state.update(0.05, ActivityType::Eating, &table, &mut rng);
            assert!(state.blend_weight >= last);
            last = state.blend_weight;
        }
        assert_eq!(state.phase, TransitionPhase::Hold);
    }

    #[test]
    fn interruption_fires_exactly_once() {
        let table = ActivityConfigTable::default();
        let mut rng = creature_rng(2);
        let mut state = ActivityState::default();
        state.update(0.016, ActivityType::Sleeping, &table, &mut rng);
        for _ in 0..10 {
            state.update(0.016, ActivityType::Sleeping, &table, &mut rng);
        }
        let events = state.update(0.016, ActivityType::ThreatDisplay, &table, &mut rng);
        let interrupt_count = events
            .iter()
            .filter(|e| matches!(e, ActivityEvent::Interrupted { from, to }
                if *from == ActivityType::Sleeping && *to == ActivityType::ThreatDisplay))
            .count();
        assert_eq!(interrupt_count, 1);
        assert_eq!(state.current, ActivityType::ThreatDisplay);
        assert_eq!(state.previous, ActivityType::Sleeping);
    }

    #[test]
    fn non_interruptible_activity_queues_the_request() {
        let table = ActivityConfigTable::default();
        let mut rng = creature_rng(3);
        let mut state = ActivityState::default();
        state.update(0.016, ActivityType::Excretion, &table, &mut rng);
        state.time_in_activity = 0.5;
        state.planned_duration = 2.0;
        state.phase = TransitionPhase::Hold;

        state.update(0.1, ActivityType::ThreatDisplay, &table, &mut rng);
        assert_eq!(state.current, ActivityType::Excretion);
        assert_eq!(state.queued, Some(ActivityType::ThreatDisplay));

        // Advance past the planned duration; queued transition should fire.
        for _ in 0..20 {
            state.update(0.1, ActivityType::ThreatDisplay, &table, &mut rng);
        }
        assert_eq!(state.current, ActivityType::ThreatDisplay);
        assert!(state.queued.is_none());
    }

    #[test]
    fn cancel_activity_forces_blend_out() {
        let table = ActivityConfigTable::default();
        let mut rng = creature_rng(4);
        let mut state = ActivityState::default();
        state.update(0.016, ActivityType::Grooming, &table, &mut rng);
        state.cancel_activity();
        assert_eq!(state.phase, TransitionPhase::BlendOut);
    }

    #[test]
    fn blend_weight_stays_in_unit_range() {
        let table = ActivityConfigTable::default();
        let mut rng = creature_rng(5);
        let mut state = ActivityState::default();
        for _ in 0..500 {
            state.update(0.016, ActivityType::Vocalizing, &table, &mut rng);
            assert!(state.blend_weight >= 0.0 && state.blend_weight <= 1.0);
        }
    }

    #[test]
    fn zero_dt_updates_are_idempotent() {
        let table = ActivityConfigTable::default();
        let mut rng_a = creature_rng(42);
        let mut rng_b = creature_rng(42);
        let mut a = ActivityState::default();
        let mut b = ActivityState::default();
        a.update(0.0, ActivityType::Idle, &table, &mut rng_a);
        a.update(0.0, ActivityType::Idle, &table, &mut rng_a);
        b.update(0.0, ActivityType::Idle, &table, &mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_activity_request_is_rejected() {
        let mut table = ActivityConfigTable::default();
        table.unregister(ActivityType::Mating);
        let mut rng = creature_rng(6);
        let mut state = ActivityState::default();
        let result = state.request_activity(ActivityType::Mating, true, &table, &mut rng);
        assert!(result.is_err());
    }
}
