//! Progress channel
//!
//! Typed phase+percent events, monotonic within a run and terminating
//! with exactly one `complete` event carrying the final result
//! (`spec.md` §4.9).

use serde::{Deserialize, Serialize};

use crate::evaluator::DpsMetrics;
use crate::player::Player;

/// Pipeline phase, in the order `optimize` visits them (`spec.md`
/// §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Filtering,
    Weapons,
    Ammunition,
    Slots,
    SetBonuses,
    Budget,
    Complete,
}

/// The best loadout assembled so far, reported on a subset of events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentBest {
    pub equipment: Player,
    pub metrics: DpsMetrics,
}

/// One progress update. `progress` is non-decreasing within a run, and
/// the final event is always `{phase: complete, progress: 100}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub progress: u8,
    pub current_best: Option<CurrentBest>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, progress: u8, current_best: Option<CurrentBest>) -> Self {
        Self { phase, progress, current_best }
    }
}

/// Caller-supplied progress sink. A `Box<dyn FnMut>` rather than a
/// channel sender so the engine stays transport-agnostic (`spec.md`
/// §6's `on_progress?` option); the worker layer wraps this in an
/// actual channel send.
pub type ProgressCallback<'a> = dyn FnMut(ProgressEvent) + 'a;

/// Enforces monotonic `progress` across a run and asserts the terminal
/// event invariant at the call site that emits `complete`
/// (`spec.md` §8 invariant 8). Exists mainly so the orchestrator can't
/// accidentally emit a regression while composing phase percentages.
pub struct ProgressTracker<'a> {
    callback: Option<&'a mut ProgressCallback<'a>>,
    last_progress: u8,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(callback: Option<&'a mut ProgressCallback<'a>>) -> Self {
        Self { callback, last_progress: 0 }
    }

    /// Emit `event`, clamping `progress` up to `last_progress` if a
    /// caller ever computes a phase boundary lower than the previous
    /// one (a bug elsewhere should not violate the wire contract).
    pub fn emit(&mut self, mut event: ProgressEvent) {
        if event.progress < self.last_progress {
            event.progress = self.last_progress;
        }
        self.last_progress = event.progress;
        if let Some(callback) = self.callback.as_mut() {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{AttackStyle, Skills};

    #[test]
    fn tracker_clamps_regressions() {
        let mut seen = Vec::new();
        let mut sink = |event: ProgressEvent| seen.push((event.phase, event.progress));
        let mut tracker = ProgressTracker::new(Some(&mut sink));
        tracker.emit(ProgressEvent::new(Phase::Initializing, 0, None));
        tracker.emit(ProgressEvent::new(Phase::Filtering, 10, None));
        tracker.emit(ProgressEvent::new(Phase::Weapons, 5, None));
        assert_eq!(seen, vec![(Phase::Initializing, 0), (Phase::Filtering, 10), (Phase::Weapons, 10)]);
    }

    #[test]
    fn tracker_without_callback_does_not_panic() {
        let mut tracker = ProgressTracker::new(None);
        tracker.emit(ProgressEvent::new(Phase::Complete, 100, None));
    }

    #[test]
    fn current_best_carries_equipment_and_metrics() {
        let player = Player::new(Skills::maxed(), AttackStyle::Stab);
        let event = ProgressEvent::new(
            Phase::Complete,
            100,
            Some(CurrentBest {
                equipment: player,
                metrics: DpsMetrics { dps: 10.0, hit_chance: 0.5, max_hit: 4 },
            }),
        );
        assert_eq!(event.progress, 100);
    }
}
