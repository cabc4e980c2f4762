//! Frame-driven value animation.
//!
//! This module provides:
//! - **Tasks**: start→end interpolation driven by frame timestamps
//! - **Scheduler**: the shared tick source that owns live tasks
//! - **Counter groups**: N counters started by one trigger
//! - **Bar fills**: declarative percentage bars animated by the renderer
//!
//! # Architecture
//!
//! ```text
//! AnimationScheduler
//!   └── AnimationTask (one per start() call)
//!         ├── on_update(value)  every tick
//!         └── on_complete()     once, after the end value
//!
//! AnimatedCounterSet
//!   └── one task per CounterItem, all writing into a CounterSnapshot
//! ```

pub mod bar_fill;
pub mod counter_set;
pub mod events;
pub mod interpolate;
pub mod scheduler;
pub mod task;
pub mod types;

pub use bar_fill::{BarTransition, SkillBar, SkillBars, TimingFunction};
pub use counter_set::{
    AnimatedCounterSet, CounterItem, CounterSnapshot, DEFAULT_COUNTER_DURATION_MS,
};
pub use events::{AnimationEvent, EventQueue, DEFAULT_EVENT_CAPACITY};
pub use interpolate::Interpolate;
pub use scheduler::{AnimationScheduler, TaskHandle};
pub use task::{AnimationTask, TickOutput};
pub use types::{AnimationId, TaskStatus, ValueMode};
