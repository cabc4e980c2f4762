//! Lifecycle events for animation tasks.
//!
//! The scheduler records an event whenever a task starts ticking, completes
//! or is torn down. Hosts can drain them after each frame, e.g. to stop
//! requesting frames once the last counter settles.
//!
//! # Usage
//!
//! ```ignore
//! scheduler.tick(now);
//! for event in scheduler.drain_events() {
//!     if let AnimationEvent::Completed { task_id, value } = event {
//!         println!("task {:?} settled at {}", task_id, value);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::types::AnimationId;

/// Event emitted when a task changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// First tick fixed the task's origin.
    Started {
        task_id: AnimationId,
        /// Timestamp of the first tick.
        origin_ms: f64,
    },
    /// Progress reached 1 and the end value was emitted.
    Completed {
        task_id: AnimationId,
        /// The exact end value.
        value: f64,
    },
    /// The task was torn down before completing.
    Cancelled { task_id: AnimationId },
}

impl AnimationEvent {
    /// Get the task ID for this event.
    pub fn task_id(&self) -> AnimationId {
        match self {
            Self::Started { task_id, .. }
            | Self::Completed { task_id, .. }
            | Self::Cancelled { task_id } => *task_id,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Events kept before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Bounded queue for collecting animation events during update cycles.
///
/// When full, pushing drops the oldest event.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<AnimationEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventQueue {
    /// Create a new empty event queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: AnimationEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drain all events from the queue, returning an iterator.
    pub fn drain(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.events.drain(..)
    }
}
