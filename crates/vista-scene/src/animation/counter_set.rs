//! A group of counters that count up together once triggered.
//!
//! `AnimatedCounterSet` owns one scheduler task per item. All tasks share a
//! trigger and a duration but keep their own origin and progress; task *i*
//! only ever writes slot *i* of the published [`CounterSnapshot`].
//!
//! # Invariants
//!
//! 1. The set starts at most once; later triggers are ignored.
//! 2. The snapshot always has one entry per item, in item order.
//! 3. Once every task completes the snapshot equals the items' end values.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::scheduler::{AnimationScheduler, TaskHandle};
use super::types::ValueMode;
use crate::subscription::lock;

/// Default shared duration for counter groups.
pub const DEFAULT_COUNTER_DURATION_MS: f64 = 2000.0;

/// One tracked quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterItem {
    pub id: String,
    pub end_value: f64,
}

impl CounterItem {
    pub fn new(id: impl Into<String>, end_value: f64) -> Self {
        Self {
            id: id.into(),
            end_value,
        }
    }
}

/// Live, index-aligned view of a counter group's current values.
#[derive(Debug, Clone)]
pub struct CounterSnapshot {
    ids: Arc<[String]>,
    values: Arc<Mutex<Vec<f64>>>,
}

impl CounterSnapshot {
    fn zeroed(items: &[CounterItem]) -> Self {
        Self {
            ids: items.iter().map(|item| item.id.clone()).collect(),
            values: Arc::new(Mutex::new(vec![0.0; items.len()])),
        }
    }

    /// Stable copy of every value, in item order.
    pub fn values(&self) -> Vec<f64> {
        lock(&self.values).clone()
    }

    /// Values as whole numbers for display.
    pub fn display_values(&self) -> Vec<i64> {
        lock(&self.values).iter().map(|v| *v as i64).collect()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        lock(&self.values).get(index).copied()
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        let index = self.ids.iter().position(|i| i == id)?;
        self.value_at(index)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn write(&self, index: usize, value: f64) {
        if let Some(slot) = lock(&self.values).get_mut(index) {
            *slot = value;
        }
    }
}

#[derive(Debug, Default)]
struct CounterSetState {
    started: bool,
    torn_down: bool,
    handles: Vec<TaskHandle>,
}

/// Orchestrates N counters sharing one trigger and one duration.
///
/// Clones share state, so the set can be handed to a visibility callback and
/// still be read and torn down by its owner.
#[derive(Debug, Clone)]
pub struct AnimatedCounterSet {
    items: Arc<[CounterItem]>,
    duration_ms: f64,
    mode: ValueMode,
    snapshot: CounterSnapshot,
    remaining: Arc<AtomicUsize>,
    state: Arc<Mutex<CounterSetState>>,
}

impl AnimatedCounterSet {
    /// Create an idle set; every value reads 0 until [`Self::trigger`].
    pub fn new(items: Vec<CounterItem>, duration_ms: f64) -> Self {
        let snapshot = CounterSnapshot::zeroed(&items);
        Self {
            remaining: Arc::new(AtomicUsize::new(items.len())),
            items: items.into(),
            duration_ms,
            mode: ValueMode::Discrete,
            snapshot,
            state: Arc::new(Mutex::new(CounterSetState::default())),
        }
    }

    pub fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    /// Create a set and start it right away.
    pub fn start_group(
        scheduler: &AnimationScheduler,
        items: Vec<CounterItem>,
        duration_ms: f64,
    ) -> Self {
        let set = Self::new(items, duration_ms);
        set.trigger(scheduler);
        set
    }

    /// Start one task per item, counting from 0.
    ///
    /// Returns `false` if the set already started or was torn down.
    pub fn trigger(&self, scheduler: &AnimationScheduler) -> bool {
        let mut state = lock(&self.state);
        if state.started || state.torn_down {
            return false;
        }
        state.started = true;

        debug!(
            counters = self.items.len(),
            duration_ms = self.duration_ms,
            "starting counter group"
        );

        for (index, item) in self.items.iter().enumerate() {
            let snapshot = self.snapshot.clone();
            let remaining = self.remaining.clone();
            let handle = scheduler.start(
                0.0,
                item.end_value,
                self.duration_ms,
                self.mode,
                move |value| snapshot.write(index, value),
                move || {
                    remaining.fetch_sub(1, Ordering::AcqRel);
                },
            );
            state.handles.push(handle);
        }
        true
    }

    pub fn snapshot(&self) -> &CounterSnapshot {
        &self.snapshot
    }

    /// Stable copy of the current values.
    pub fn values(&self) -> Vec<f64> {
        self.snapshot.values()
    }

    pub fn items(&self) -> &[CounterItem] {
        &self.items
    }

    pub fn end_values(&self) -> Vec<f64> {
        self.items.iter().map(|item| item.end_value).collect()
    }

    pub fn is_started(&self) -> bool {
        lock(&self.state).started
    }

    /// Every member task has reported completion.
    pub fn is_complete(&self) -> bool {
        self.is_started() && self.remaining.load(Ordering::Acquire) == 0
    }

    pub fn is_torn_down(&self) -> bool {
        lock(&self.state).torn_down
    }

    /// Cancel every member task and refuse future triggers. Idempotent.
    pub fn teardown(&self) {
        let mut state = lock(&self.state);
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        for handle in &state.handles {
            handle.cancel();
        }
        debug!(counters = self.items.len(), "counter group torn down");
    }
}

static_assertions::assert_impl_all!(AnimatedCounterSet: Send, Sync);
