//! Timed sub-sequences (windup, followthrough, roll, knockdown).
//!
//! Каждый контроллер владеет одним `SequenceSlot`: запуск новой
//! последовательности отменяет предыдущую. Шаги несут id своей
//! последовательности; шаг с устаревшим id не исполняется.
//!
//! Время здесь реальное (`Time<Real>`), не fixed tick движения.

use std::collections::VecDeque;

use crate::logger;

/// Shortest windup animation that still reads as a windup.
pub const MIN_WINDUP_CUE: f32 = 0.3;

/// When to play the windup cue and for how long: it ends with the windup.
pub fn windup_cue_timing(windup: f32) -> (f32, f32) {
    let windup = windup.max(0.0);
    if windup < MIN_WINDUP_CUE {
        (0.0, windup)
    } else {
        (windup - MIN_WINDUP_CUE, MIN_WINDUP_CUE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceId(u64);

#[derive(Debug, Clone)]
struct ScheduledStep<S> {
    at: f32,
    step: S,
}

/// Steps at absolute offsets from the sequence start.
#[derive(Debug, Clone)]
pub struct TimedSequence<S> {
    label: &'static str,
    steps: Vec<ScheduledStep<S>>,
}

impl<S> TimedSequence<S> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            steps: Vec::new(),
        }
    }

    pub fn then_at(mut self, at: f32, step: S) -> Self {
        self.steps.push(ScheduledStep {
            at: at.max(0.0),
            step,
        });
        self
    }

    pub fn duration(&self) -> f32 {
        self.steps.iter().map(|s| s.at).fold(0.0, f32::max)
    }
}

#[derive(Debug)]
struct RunningSequence<S> {
    id: SequenceId,
    label: &'static str,
    elapsed: f32,
    pending: VecDeque<ScheduledStep<S>>,
}

#[derive(Debug)]
pub struct SequenceSlot<S> {
    running: Option<RunningSequence<S>>,
    current: Option<SequenceId>,
    next_id: u64,
}

impl<S> Default for SequenceSlot<S> {
    fn default() -> Self {
        Self {
            running: None,
            current: None,
            next_id: 0,
        }
    }
}

impl<S> SequenceSlot<S> {
    /// Starts `sequence`, cancelling whatever was running.
    pub fn start(&mut self, sequence: TimedSequence<S>) -> SequenceId {
        if let Some(previous) = self.running.take() {
            logger::log(&format!(
                "⏹️ sequence '{}' cancelled by '{}'",
                previous.label, sequence.label
            ));
        }

        let mut steps = sequence.steps;
        steps.sort_by(|a, b| a.at.total_cmp(&b.at));

        let id = SequenceId(self.next_id);
        self.next_id += 1;
        self.current = Some(id);
        self.running = Some(RunningSequence {
            id,
            label: sequence.label,
            elapsed: 0.0,
            pending: steps.into(),
        });
        id
    }

    /// Drops pending steps. Returns the id of the cancelled sequence, if any.
    pub fn cancel(&mut self) -> Option<SequenceId> {
        self.current = None;
        self.running.take().map(|running| running.id)
    }

    pub fn is_active(&self) -> bool {
        self.running.is_some()
    }

    pub fn is_current(&self, id: SequenceId) -> bool {
        self.current == Some(id)
    }

    pub fn active_label(&self) -> Option<&'static str> {
        self.running.as_ref().map(|running| running.label)
    }

    /// Advances real time and returns the steps that came due, in order.
    pub fn advance(&mut self, real_dt: f32) -> Vec<(SequenceId, S)> {
        let Some(running) = self.running.as_mut() else {
            return Vec::new();
        };

        running.elapsed += real_dt.max(0.0);
        let mut fired = Vec::new();
        while running
            .pending
            .front()
            .is_some_and(|step| step.at <= running.elapsed)
        {
            if let Some(scheduled) = running.pending.pop_front() {
                fired.push((running.id, scheduled.step));
            }
        }

        if running.pending.is_empty() {
            self.running = None;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Step {
        Cue,
        Done,
    }

    #[test]
    fn test_steps_fire_in_order_after_delay() {
        let mut slot = SequenceSlot::default();
        let id = slot.start(
            TimedSequence::new("windup")
                .then_at(0.5, Step::Done)
                .then_at(0.2, Step::Cue),
        );

        assert!(slot.advance(0.1).is_empty());
        assert_eq!(slot.advance(0.15), vec![(id, Step::Cue)]);
        assert!(slot.is_active());
        assert_eq!(slot.advance(0.3), vec![(id, Step::Done)]);
        assert!(!slot.is_active());
        assert!(slot.is_current(id));
    }

    #[test]
    fn test_start_cancels_previous() {
        let mut slot = SequenceSlot::default();
        let first = slot.start(TimedSequence::new("roll").then_at(0.1, Step::Done));
        let second = slot.start(TimedSequence::new("block").then_at(0.3, Step::Cue));

        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
        assert_eq!(slot.active_label(), Some("block"));

        let fired = slot.advance(0.5);
        assert_eq!(fired, vec![(second, Step::Cue)]);
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut slot = SequenceSlot::default();
        let id = slot.start(TimedSequence::new("knockdown").then_at(1.0, Step::Done));

        assert_eq!(slot.cancel(), Some(id));
        assert!(!slot.is_current(id));
        assert!(slot.advance(2.0).is_empty());
        assert_eq!(slot.cancel(), None);
    }

    #[test]
    fn test_windup_cue_timing() {
        assert_eq!(windup_cue_timing(0.2), (0.0, 0.2));
        let (delay, duration) = windup_cue_timing(1.0);
        assert!((delay - 0.7).abs() < 1e-6);
        assert_eq!(duration, MIN_WINDUP_CUE);

        let sequence = TimedSequence::new("x").then_at(0.4, ()).then_at(0.9, ());
        assert_eq!(sequence.duration(), 0.9);
    }
}
