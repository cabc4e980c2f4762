//! Frame-driven scheduler for interpolation tasks.
//!
//! The `AnimationScheduler` is the tick source for every task in the scene.
//! The host calls [`AnimationScheduler::tick`] from its display-frame callback
//! with the frame timestamp; tests call it with hand-picked timestamps.
//!
//! - Each live task emits `on_update(value)` once per tick
//! - `on_complete()` runs once, right after the tick that emitted the end value
//! - Cancelled tasks are pruned on the next tick and never called again
//!
//! # Usage
//!
//! ```ignore
//! let scheduler = AnimationScheduler::new();
//! let handle = scheduler.start(0.0, 100.0, 2000.0, ValueMode::Discrete,
//!     |value| println!("{value}"),
//!     || println!("done"));
//!
//! // Each frame
//! scheduler.tick(timestamp_ms);
//!
//! // On teardown
//! handle.cancel();
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::events::{AnimationEvent, EventQueue};
use super::task::{AnimationTask, TickOutput};
use super::types::{AnimationId, TaskStatus, ValueMode};
use crate::subscription::{lock, Subscription};

type UpdateFn = Box<dyn FnMut(f64) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

struct ScheduledTask {
    task: AnimationTask,
    subscription: Subscription,
    /// Taken out while the callback runs so the lock is not held.
    on_update: Option<UpdateFn>,
    on_complete: Option<CompleteFn>,
}

#[derive(Default)]
struct SchedulerInner {
    tasks: BTreeMap<AnimationId, ScheduledTask>,
    events: EventQueue,
    last_tick_ms: Option<f64>,
}

impl SchedulerInner {
    fn prune_cancelled(&mut self) {
        let cancelled: Vec<AnimationId> = self
            .tasks
            .iter()
            .filter(|(_, t)| !t.subscription.is_active())
            .map(|(id, _)| *id)
            .collect();

        for id in cancelled {
            self.tasks.remove(&id);
            self.events.push(AnimationEvent::Cancelled { task_id: id });
            trace!(task = id.0, "pruned cancelled task");
        }
    }
}

/// Cancelable handle to a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: AnimationId,
    subscription: Subscription,
}

impl TaskHandle {
    pub fn id(&self) -> AnimationId {
        self.id
    }

    /// `true` until the task completes or is cancelled.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop scheduling further ticks. Idempotent and safe after completion.
    pub fn cancel(&self) {
        if self.subscription.cancel() {
            debug!(task = self.id.0, "task cancelled");
        }
    }
}

/// Shared tick source for interpolation tasks.
///
/// Clones drive the same set of tasks, so a visibility callback can hold a
/// clone and start tasks from inside another callback.
#[derive(Clone, Default)]
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl std::fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("AnimationScheduler")
            .field("tasks", &inner.tasks.len())
            .field("pending_events", &inner.events.len())
            .field("last_tick_ms", &inner.last_tick_ms)
            .finish()
    }
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a `start → end` run over `duration_ms`.
    ///
    /// The task begins on the next tick, which also fixes its origin.
    /// Non-positive durations and `start == end` complete on that first tick
    /// with a single `on_update(end)` followed by `on_complete()`.
    pub fn start<U, C>(
        &self,
        start_value: f64,
        end_value: f64,
        duration_ms: f64,
        mode: ValueMode,
        on_update: U,
        on_complete: C,
    ) -> TaskHandle
    where
        U: FnMut(f64) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let task = AnimationTask::new(start_value, end_value, duration_ms, mode);
        let id = task.id;
        let subscription = Subscription::new();

        lock(&self.inner).tasks.insert(
            id,
            ScheduledTask {
                task,
                subscription: subscription.clone(),
                on_update: Some(Box::new(on_update)),
                on_complete: Some(Box::new(on_complete)),
            },
        );
        trace!(task = id.0, start_value, end_value, duration_ms, ?mode, "task scheduled");

        TaskHandle { id, subscription }
    }

    /// Cancel a task and drop it immediately.
    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
        let mut inner = lock(&self.inner);
        if inner.tasks.remove(&handle.id).is_some() {
            inner.events.push(AnimationEvent::Cancelled { task_id: handle.id });
        }
    }

    /// Advance every live task to `now_ms`.
    ///
    /// Tasks started from inside a callback during this tick wait for the
    /// next one. Returns the number of tasks that emitted a value.
    pub fn tick(&self, now_ms: f64) -> usize {
        let ids: Vec<AnimationId> = {
            let mut inner = lock(&self.inner);
            inner.last_tick_ms = Some(now_ms);
            inner.prune_cancelled();
            inner.tasks.keys().copied().collect()
        };

        let mut emitted = 0;
        for id in ids {
            let Some((output, mut on_update, subscription)) = self.advance(id, now_ms) else {
                continue;
            };

            if let Some(callback) = on_update.as_mut() {
                if subscription.is_active() {
                    callback(output.value);
                    emitted += 1;
                }
            }

            if output.completed {
                self.finish(id, output.value, subscription);
            } else if let Some(entry) = lock(&self.inner).tasks.get_mut(&id) {
                entry.on_update = on_update;
            }
        }
        emitted
    }

    /// Step one task under the lock and hand its update callback out.
    fn advance(
        &self,
        id: AnimationId,
        now_ms: f64,
    ) -> Option<(TickOutput, Option<UpdateFn>, Subscription)> {
        let mut inner = lock(&self.inner);
        let entry = inner.tasks.get_mut(&id)?;
        if !entry.subscription.is_active() {
            inner.tasks.remove(&id);
            inner.events.push(AnimationEvent::Cancelled { task_id: id });
            return None;
        }

        let output = entry.task.tick(now_ms)?;
        let on_update = entry.on_update.take();
        let subscription = entry.subscription.clone();

        if output.started {
            inner.events.push(AnimationEvent::Started {
                task_id: id,
                origin_ms: now_ms,
            });
        }
        Some((output, on_update, subscription))
    }

    fn finish(&self, id: AnimationId, value: f64, subscription: Subscription) {
        let on_complete = {
            let mut inner = lock(&self.inner);
            let entry = inner.tasks.remove(&id);
            if subscription.is_active() {
                inner.events.push(AnimationEvent::Completed { task_id: id, value });
            } else {
                inner.events.push(AnimationEvent::Cancelled { task_id: id });
            }
            entry.and_then(|e| e.on_complete)
        };

        // Claiming the flag both retires the handle and guards the delivery.
        if subscription.cancel() {
            debug!(task = id.0, value, "task complete");
            if let Some(callback) = on_complete {
                callback();
            }
        }
    }

    /// Status of a scheduled task, or `None` once it has been dropped.
    pub fn status(&self, id: AnimationId) -> Option<TaskStatus> {
        lock(&self.inner).tasks.get(&id).map(|t| t.task.status())
    }

    /// Number of tasks that are still live.
    pub fn active_count(&self) -> usize {
        lock(&self.inner)
            .tasks
            .values()
            .filter(|t| t.subscription.is_active())
            .count()
    }

    /// Whether the host should keep requesting frames.
    pub fn has_active_tasks(&self) -> bool {
        self.active_count() > 0
    }

    pub fn last_tick_ms(&self) -> Option<f64> {
        lock(&self.inner).last_tick_ms
    }

    /// Drain all pending lifecycle events.
    pub fn drain_events(&self) -> Vec<AnimationEvent> {
        lock(&self.inner).events.drain().collect()
    }

    pub fn pending_event_count(&self) -> usize {
        lock(&self.inner).events.len()
    }

    /// Events discarded because nobody drained them in time.
    pub fn dropped_event_count(&self) -> u64 {
        lock(&self.inner).events.dropped()
    }

    /// Cancel every task.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        for task in inner.tasks.values() {
            task.subscription.cancel();
        }
        inner.prune_cancelled();
    }
}

// Ensure the scheduler can be handed to callbacks on any thread
static_assertions::assert_impl_all!(AnimationScheduler: Send, Sync);
static_assertions::assert_impl_all!(TaskHandle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::events::DEFAULT_EVENT_CAPACITY;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<f64>>>, impl FnMut(f64) + Send + 'static) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        (values, move |v| sink.lock().unwrap().push(v))
    }

    fn completion_counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let done = Arc::new(AtomicUsize::new(0));
        let d = done.clone();
        (done, move || {
            d.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_start_and_complete() {
        let scheduler = AnimationScheduler::new();
        let (values, on_update) = recorder();
        let (done, on_complete) = completion_counter();

        let handle = scheduler.start(0.0, 100.0, 100.0, ValueMode::Discrete, on_update, on_complete);
        assert!(handle.is_active());
        assert_eq!(scheduler.status(handle.id()), Some(TaskStatus::Idle));

        scheduler.tick(1000.0);
        assert_eq!(scheduler.status(handle.id()), Some(TaskStatus::Running));
        scheduler.tick(1050.0);
        scheduler.tick(1100.0);
        scheduler.tick(1150.0);

        assert_eq!(*values.lock().unwrap(), vec![0.0, 50.0, 100.0]);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(!handle.is_active());
        assert!(!scheduler.has_active_tasks());
        assert!(scheduler.status(handle.id()).is_none());
    }

    #[test]
    fn test_events_recorded() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.start(0.0, 1.0, 10.0, ValueMode::Continuous, |_| {}, || {});

        scheduler.tick(0.0);
        scheduler.tick(10.0);

        let events = scheduler.drain_events();
        assert_eq!(
            events,
            vec![
                AnimationEvent::Started {
                    task_id: handle.id(),
                    origin_ms: 0.0
                },
                AnimationEvent::Completed {
                    task_id: handle.id(),
                    value: 1.0
                },
            ]
        );
        assert_eq!(scheduler.pending_event_count(), 0);
    }

    #[test]
    fn test_undrained_events_stay_bounded() {
        let scheduler = AnimationScheduler::new();
        for _ in 0..1000 {
            scheduler.start(0.0, 1.0, 0.0, ValueMode::Discrete, |_| {}, || {});
        }
        scheduler.tick(0.0);
        scheduler.tick(16.0);

        assert!(!scheduler.has_active_tasks());
        assert_eq!(scheduler.pending_event_count(), DEFAULT_EVENT_CAPACITY);
        assert_eq!(scheduler.dropped_event_count(), 2000 - DEFAULT_EVENT_CAPACITY as u64);

        let events = scheduler.drain_events();
        assert!(events.last().is_some_and(AnimationEvent::is_completed));
        assert_eq!(scheduler.pending_event_count(), 0);
    }

    #[test]
    fn test_cancel_mid_flight() {
        let scheduler = AnimationScheduler::new();
        let (values, on_update) = recorder();
        let (done, on_complete) = completion_counter();

        let handle = scheduler.start(0.0, 100.0, 1000.0, ValueMode::Discrete, on_update, on_complete);
        scheduler.tick(0.0);
        scheduler.tick(500.0);
        handle.cancel();
        handle.cancel();
        scheduler.tick(1000.0);
        scheduler.tick(1500.0);

        assert_eq!(*values.lock().unwrap(), vec![0.0, 50.0]);
        assert_eq!(done.load(Ordering::SeqCst), 0);
        assert!(scheduler.drain_events().iter().any(AnimationEvent::is_cancelled));
    }

    #[test]
    fn test_cancel_from_update_callback_suppresses_completion() {
        let scheduler = AnimationScheduler::new();
        let (done, on_complete) = completion_counter();
        let slot: Arc<Mutex<Option<TaskHandle>>> = Arc::new(Mutex::new(None));
        let slot_cb = slot.clone();

        let handle = scheduler.start(
            0.0,
            10.0,
            0.0,
            ValueMode::Discrete,
            move |_| {
                if let Some(h) = slot_cb.lock().unwrap().as_ref() {
                    h.cancel();
                }
            },
            on_complete,
        );
        *slot.lock().unwrap() = Some(handle);

        scheduler.tick(0.0);
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_from_callback_runs_next_tick() {
        let scheduler = AnimationScheduler::new();
        let (values, on_update) = recorder();
        let nested = scheduler.clone();
        let on_update = Arc::new(Mutex::new(Some(on_update)));

        scheduler.start(0.0, 1.0, 0.0, ValueMode::Continuous, |_| {}, move || {
            if let Some(cb) = on_update.lock().unwrap().take() {
                nested.start(0.0, 5.0, 0.0, ValueMode::Discrete, cb, || {});
            }
        });

        scheduler.tick(0.0);
        assert!(values.lock().unwrap().is_empty());
        assert_eq!(scheduler.active_count(), 1);

        scheduler.tick(16.0);
        assert_eq!(*values.lock().unwrap(), vec![5.0]);
    }

    #[test]
    fn test_scheduler_cancel_and_clear() {
        let scheduler = AnimationScheduler::new();
        let a = scheduler.start(0.0, 1.0, 100.0, ValueMode::Continuous, |_| {}, || {});
        let b = scheduler.start(0.0, 1.0, 100.0, ValueMode::Continuous, |_| {}, || {});
        assert_eq!(scheduler.active_count(), 2);

        scheduler.cancel(&a);
        scheduler.cancel(&a);
        assert_eq!(scheduler.active_count(), 1);

        scheduler.clear();
        assert!(!b.is_active());
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(scheduler.tick(50.0), 0);
    }
}
