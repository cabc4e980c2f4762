//! Reveal-on-scroll wrappers.
//!
//! A reveal starts hidden, waits for its region's one-shot visibility signal,
//! then after an optional wall-clock delay switches to its entrance animation
//! class. The switch happens at most once and is never undone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::subscription::{lock, Subscription};
use crate::timer::{TimerHandle, TimerQueue};
use crate::visibility::{RegionId, ViewportVisibilityDetector, VisibilitySubscription};

/// Class applied while a region is still hidden.
pub const HIDDEN_CLASS: &str = "opacity-0";

/// Transition applied to every reveal wrapper.
pub const REVEAL_TRANSITION: &str = "all 0.6s ease-out";

/// Animation class used when none is configured.
pub const DEFAULT_ANIMATION: &str = "animate-fade-in";

#[derive(Debug)]
struct RevealState {
    kind: String,
    revealed: AtomicBool,
    subscription: Subscription,
    pending: Mutex<Option<TimerHandle>>,
}

impl RevealState {
    fn reveal(&self) {
        if !self.subscription.is_active() {
            return;
        }
        if !self.revealed.swap(true, Ordering::AcqRel) {
            debug!(animation = %self.kind, "region revealed");
        }
    }
}

/// Handle returned by [`RevealController::attach`].
#[derive(Debug, Clone)]
pub struct RevealSubscription {
    state: Arc<RevealState>,
    visibility: VisibilitySubscription,
}

impl RevealSubscription {
    pub fn is_revealed(&self) -> bool {
        self.state.revealed.load(Ordering::Acquire)
    }

    /// `true` until torn down.
    pub fn is_active(&self) -> bool {
        self.state.subscription.is_active()
    }

    /// The region saw its signal and the delay is still running.
    pub fn is_pending(&self) -> bool {
        lock(&self.state.pending)
            .as_ref()
            .is_some_and(TimerHandle::is_active)
    }

    /// Requested animation class.
    pub fn animation(&self) -> &str {
        &self.state.kind
    }

    /// Class the wrapper should carry right now.
    pub fn class_name(&self) -> &str {
        if self.is_revealed() {
            &self.state.kind
        } else {
            HIDDEN_CLASS
        }
    }

    pub fn transition(&self) -> &'static str {
        REVEAL_TRANSITION
    }

    pub fn visibility(&self) -> &VisibilitySubscription {
        &self.visibility
    }

    /// Stop observing and drop any pending delayed reveal. Idempotent.
    ///
    /// A region that was already revealed stays revealed.
    pub fn teardown(&self) {
        if !self.state.subscription.cancel() {
            return;
        }
        self.visibility.unobserve();
        if let Some(timer) = lock(&self.state.pending).take() {
            timer.cancel();
        }
        debug!(animation = %self.state.kind, "reveal torn down");
    }
}

/// Binds reveal wrappers to the detector and the timer queue.
#[derive(Debug, Clone)]
pub struct RevealController {
    detector: ViewportVisibilityDetector,
    timers: TimerQueue,
}

impl RevealController {
    pub fn new(detector: ViewportVisibilityDetector, timers: TimerQueue) -> Self {
        Self { detector, timers }
    }

    /// Reveal `region` with `animation` once it crosses `threshold`.
    ///
    /// The class flips `delay_ms` after the pass that delivered the signal,
    /// on the first [`TimerQueue::run_due`] at or past that time. A zero
    /// delay flips on the next run.
    pub fn attach(
        &self,
        region: Option<RegionId>,
        animation: impl Into<String>,
        threshold: f32,
        delay_ms: f64,
    ) -> RevealSubscription {
        let state = Arc::new(RevealState {
            kind: animation.into(),
            revealed: AtomicBool::new(false),
            subscription: if region.is_some() {
                Subscription::new()
            } else {
                Subscription::inert()
            },
            pending: Mutex::new(None),
        });

        let timers = self.timers.clone();
        let on_visible = Arc::clone(&state);
        let visibility = self.detector.observe(region, threshold, move |signal| {
            if !on_visible.subscription.is_active() {
                return;
            }
            let target = Arc::clone(&on_visible);
            let timer = timers.schedule(signal.observed_at_ms, delay_ms, move || target.reveal());
            *lock(&on_visible.pending) = Some(timer);
        });

        RevealSubscription { state, visibility }
    }
}

static_assertions::assert_impl_all!(RevealSubscription: Send, Sync);
static_assertions::assert_impl_all!(RevealController: Send, Sync);
