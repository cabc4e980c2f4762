//! A single start→end interpolation run.
//!
//! `AnimationTask` is a pure state machine: feed it frame timestamps with
//! [`AnimationTask::tick`] and it reports the value to render. Scheduling and
//! callbacks live in [`super::scheduler`].
//!
//! ```ignore
//! let mut task = AnimationTask::new(0.0, 100.0, 2000.0, ValueMode::Discrete);
//! task.tick(16.0);   // fixes the origin, emits 0
//! task.tick(1016.0); // emits 50
//! task.tick(2016.0); // emits exactly 100 and completes
//! ```

use serde::{Deserialize, Serialize};

use super::interpolate::{present, progress, Interpolate};
use super::types::{AnimationId, TaskStatus, ValueMode};

/// What a tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Value to hand to the consumer.
    pub value: f64,
    /// Normalized progress after this tick.
    pub progress: f64,
    /// This tick moved the task from `Idle` to `Running`.
    pub started: bool,
    /// This tick reached progress 1; no further ticks will emit.
    pub completed: bool,
}

/// Runtime state of one interpolation run.
#[derive(Debug, Clone)]
pub struct AnimationTask {
    pub id: AnimationId,
    pub start_value: f64,
    pub end_value: f64,
    pub duration_ms: f64,
    pub mode: ValueMode,
    /// Timestamp of the first tick.
    origin_ms: Option<f64>,
    progress: f64,
    current: f64,
    status: TaskStatus,
}

impl AnimationTask {
    pub fn new(start_value: f64, end_value: f64, duration_ms: f64, mode: ValueMode) -> Self {
        Self {
            id: AnimationId::new(),
            start_value,
            end_value,
            duration_ms,
            mode,
            origin_ms: None,
            progress: 0.0,
            current: start_value,
            status: TaskStatus::Idle,
        }
    }

    /// Tasks that finish on their first tick.
    pub fn is_degenerate(&self) -> bool {
        !self.duration_ms.is_finite() || self.duration_ms <= 0.0 || self.start_value == self.end_value
    }

    /// Advance to `now_ms`.
    ///
    /// Returns `None` once the task is complete. The first call fixes the
    /// origin; progress never decreases even if timestamps go backwards.
    pub fn tick(&mut self, now_ms: f64) -> Option<TickOutput> {
        let started = match self.status {
            TaskStatus::Complete => return None,
            TaskStatus::Idle => {
                self.origin_ms = Some(now_ms);
                self.status = TaskStatus::Running;
                true
            }
            TaskStatus::Running => false,
        };

        let raw = if self.is_degenerate() {
            1.0
        } else {
            progress(self.origin_ms.unwrap_or(now_ms), now_ms, self.duration_ms)
        };
        self.progress = self.progress.max(raw);

        let completed = self.progress >= 1.0;
        if completed {
            // The last value is the end value itself, not the formula's approximation.
            self.current = self.end_value;
            self.status = TaskStatus::Complete;
        } else {
            let value = self.start_value.interpolate(&self.end_value, self.progress);
            self.current = present(value, self.start_value, self.end_value, self.mode);
        }

        Some(TickOutput {
            value: self.current,
            progress: self.progress,
            started,
            completed,
        })
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn current_value(&self) -> f64 {
        self.current
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn origin_ms(&self) -> Option<f64> {
        self.origin_ms
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }
}
