//! Wall-clock delayed callbacks.
//!
//! Reveal delays and the typewriter run on timers rather than on frames. The
//! host wakes the queue with [`TimerQueue::run_due`] whenever it has a
//! timestamp, typically from the same frame callback that drives the
//! scheduler, or from a dedicated timeout when nothing is animating.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::subscription::{lock, Subscription};

type TimerFn = Box<dyn FnOnce() + Send>;

/// Ordering key: due time first, then insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TimerKey {
    due_ms: f64,
    seq: u64,
}

impl Eq for TimerKey {}

impl PartialOrd for TimerKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due_ms
            .total_cmp(&other.due_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

struct Timer {
    subscription: Subscription,
    callback: TimerFn,
}

#[derive(Default)]
struct TimerInner {
    timers: BTreeMap<TimerKey, Timer>,
    next_seq: u64,
    now_ms: f64,
}

/// Cancelable handle to a scheduled timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    subscription: Subscription,
}

impl TimerHandle {
    /// `true` until the timer fires or is cancelled.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Idempotent; a no-op once the timer has fired.
    pub fn cancel(&self) {
        self.subscription.cancel();
    }
}

/// Ordered queue of one-shot timers.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct TimerQueue {
    inner: Arc<Mutex<TimerInner>>,
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("TimerQueue")
            .field("pending", &inner.timers.len())
            .field("now_ms", &inner.now_ms)
            .finish()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest timestamp the queue has seen.
    pub fn now_ms(&self) -> f64 {
        lock(&self.inner).now_ms
    }

    /// Record the host's current time without firing anything.
    pub fn set_now(&self, now_ms: f64) {
        if now_ms.is_finite() {
            lock(&self.inner).now_ms = now_ms;
        }
    }

    /// Run `callback` once `delay_ms` has elapsed after `now_ms`.
    ///
    /// Non-positive and non-finite delays are due on the next `run_due`.
    pub fn schedule<F>(&self, now_ms: f64, delay_ms: f64, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        self.schedule_at(now_ms + delay, callback)
    }

    /// Like [`Self::schedule`], measured from the queue's own clock.
    pub fn schedule_after<F>(&self, delay_ms: f64, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let now = self.now_ms();
        self.schedule(now, delay_ms, callback)
    }

    /// Run `callback` at the absolute time `due_ms`.
    pub fn schedule_at<F>(&self, due_ms: f64, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let subscription = Subscription::new();
        let mut inner = lock(&self.inner);
        let due_ms = if due_ms.is_finite() { due_ms } else { inner.now_ms };
        let key = TimerKey {
            due_ms,
            seq: inner.next_seq,
        };
        inner.next_seq += 1;
        inner.timers.insert(
            key,
            Timer {
                subscription: subscription.clone(),
                callback: Box::new(callback),
            },
        );
        trace!(due_ms, seq = key.seq, "timer scheduled");
        TimerHandle { subscription }
    }

    /// Fire every timer due at `now_ms`, in due order.
    ///
    /// Timers scheduled from inside a callback wait for the next call, even
    /// if already due. Returns the number of callbacks run.
    pub fn run_due(&self, now_ms: f64) -> usize {
        let due: Vec<Timer> = {
            let mut inner = lock(&self.inner);
            if now_ms.is_finite() {
                inner.now_ms = now_ms;
            }
            let now = inner.now_ms;
            let keys: Vec<TimerKey> = inner
                .timers
                .keys()
                .take_while(|key| key.due_ms <= now)
                .copied()
                .collect();
            keys.into_iter()
                .filter_map(|key| inner.timers.remove(&key))
                .collect()
        };

        let mut fired = 0;
        for timer in due {
            // A sibling callback may have cancelled this one.
            if timer.subscription.cancel() {
                (timer.callback)();
                fired += 1;
            }
        }
        if fired > 0 {
            trace!(fired, now_ms, "timers fired");
        }
        fired
    }

    /// Due time of the earliest live timer.
    pub fn next_due(&self) -> Option<f64> {
        lock(&self.inner)
            .timers
            .iter()
            .find(|(_, timer)| timer.subscription.is_active())
            .map(|(key, _)| key.due_ms)
    }

    /// Number of live timers still waiting.
    pub fn pending_count(&self) -> usize {
        lock(&self.inner)
            .timers
            .values()
            .filter(|timer| timer.subscription.is_active())
            .count()
    }

    /// Cancel and drop every timer.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        for timer in inner.timers.values() {
            timer.subscription.cancel();
        }
        inner.timers.clear();
    }
}

static_assertions::assert_impl_all!(TimerQueue: Send, Sync);
static_assertions::assert_impl_all!(TimerHandle: Send, Sync);
