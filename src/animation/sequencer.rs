use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::foundation::core::Bitmap;

/// One change produced by [`TransitionState::advance`].
#[derive(Clone, Debug)]
pub enum TransitionStep {
    /// The previous cross-fade finished and this queued one started.
    Started(Bitmap),
    /// The last cross-fade finished; nothing is queued.
    Settled,
}

/// Per-surface cross-fade queue. At most one fade plays; later ones wait in order.
#[derive(Debug)]
pub struct TransitionState {
    duration: Duration,
    started: Option<Instant>,
    queue: VecDeque<Bitmap>,
}

impl TransitionState {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
            queue: VecDeque::new(),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.started.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns `Some(to)` when the fade starts right away and must be presented now.
    pub fn play(&mut self, to: Bitmap, now: Instant) -> Option<Bitmap> {
        if self.started.is_some() {
            self.queue.push_back(to);
            return None;
        }
        self.started = Some(now);
        Some(to)
    }

    /// Complete every fade whose duration has elapsed by `now`, chaining queued fades back to
    /// back. Each chained fade starts at the instant the previous one ended.
    pub fn advance(&mut self, now: Instant) -> Vec<TransitionStep> {
        let mut steps = Vec::new();
        while let Some(started) = self.started {
            let ends = started + self.duration;
            if now < ends {
                break;
            }
            match self.queue.pop_front() {
                Some(next) => {
                    self.started = Some(ends);
                    steps.push(TransitionStep::Started(next));
                }
                None => {
                    self.started = None;
                    steps.push(TransitionStep::Settled);
                }
            }
        }
        steps
    }

    /// Drop the current fade and everything queued. Returns whether a fade was playing.
    pub fn reset(&mut self) -> bool {
        self.queue.clear();
        self.started.take().is_some()
    }

    /// Fraction of the current fade elapsed at `now`, in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> Option<f32> {
        let started = self.started?;
        if self.duration.is_zero() {
            return Some(1.0);
        }
        let elapsed = now.saturating_duration_since(started);
        Some((elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/sequencer.rs"]
mod tests;
