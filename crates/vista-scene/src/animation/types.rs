//! Core animation types.
//!
//! - `AnimationId`: Unique identifier for an interpolation task
//! - `TaskStatus`: Lifecycle state of a task
//! - `ValueMode`: Whether emitted values are truncated to whole numbers

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an animation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl AnimationId {
    /// Generate a new unique animation ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for AnimationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of an interpolation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, waiting for the first tick to fix its origin.
    #[default]
    Idle,
    /// Emitting a value on every tick.
    Running,
    /// Progress reached 1 and the end value was emitted.
    Complete,
}

/// How interpolated values are presented to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Whole numbers, truncated toward the start value (counter readouts).
    #[default]
    Discrete,
    /// Raw linear interpolation (percentages, style values).
    Continuous,
}

impl ValueMode {
    pub fn from_discrete(discrete: bool) -> Self {
        if discrete {
            Self::Discrete
        } else {
            Self::Continuous
        }
    }
}
