//! One-shot viewport visibility detection.
//!
//! The detector keeps one observer per subscription. Each observation pass
//! measures every observed region against the layout's viewport; the first
//! time a region's intersection ratio reaches its threshold the observer is
//! removed and its callback runs once.
//!
//! # Usage
//!
//! ```ignore
//! let detector = ViewportVisibilityDetector::new();
//! let sub = detector.observe(Some(section), 0.1, |signal| {
//!     println!("{:?} became visible", signal.region);
//! });
//!
//! // From the host's frame or scroll callback:
//! detector.observe_pass(&layout, now_ms);
//!
//! // On unmount:
//! sub.unobserve();
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::region::{
    normalize_threshold, ObservedRegion, RegionId, RegionLayout, VisibilityState,
    DEFAULT_THRESHOLD,
};
use crate::subscription::{lock, Subscription, SubscriptionId};

/// Payload delivered to a visibility callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilitySignal {
    pub region: RegionId,
    /// Intersection ratio measured on the triggering pass.
    pub ratio: f32,
    pub visible: bool,
    /// Host timestamp of the triggering pass.
    pub observed_at_ms: f64,
}

type VisibleCallback = Box<dyn FnOnce(VisibilitySignal) + Send>;

struct Observer {
    region: ObservedRegion,
    subscription: Subscription,
    triggered: Arc<AtomicBool>,
    callback: Option<VisibleCallback>,
}

#[derive(Default)]
struct DetectorInner {
    observers: BTreeMap<SubscriptionId, Observer>,
}

/// Handle returned by [`ViewportVisibilityDetector::observe`].
#[derive(Debug, Clone)]
pub struct VisibilitySubscription {
    subscription: Subscription,
    region: Option<RegionId>,
    triggered: Arc<AtomicBool>,
}

impl VisibilitySubscription {
    fn inert() -> Self {
        Self {
            subscription: Subscription::inert(),
            region: None,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    /// `true` while the detector is still watching the region.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn state(&self) -> VisibilityState {
        if self.triggered.load(Ordering::Acquire) {
            VisibilityState::Triggered
        } else {
            VisibilityState::Pending
        }
    }

    /// Stop observing. Safe to call any number of times, including after the
    /// signal fired; once this returns the callback will not run.
    pub fn unobserve(&self) {
        if self.subscription.cancel() {
            trace!(subscription = self.id().0, "visibility subscription cancelled");
        }
    }
}

/// Observes regions against the viewport and fires one-shot signals.
///
/// Clones share the same set of observers.
#[derive(Clone)]
pub struct ViewportVisibilityDetector {
    inner: Arc<Mutex<DetectorInner>>,
    default_threshold: f32,
}

impl Default for ViewportVisibilityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ViewportVisibilityDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportVisibilityDetector")
            .field("observers", &lock(&self.inner).observers.len())
            .field("default_threshold", &self.default_threshold)
            .finish()
    }
}

impl ViewportVisibilityDetector {
    pub fn new() -> Self {
        Self::with_default_threshold(DEFAULT_THRESHOLD)
    }

    /// Threshold used when a caller passes a non-finite one.
    pub fn with_default_threshold(threshold: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DetectorInner::default())),
            default_threshold: normalize_threshold(threshold, DEFAULT_THRESHOLD),
        }
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }

    /// Start observing `region`.
    ///
    /// A missing region yields an inert subscription whose callback never
    /// runs. A region that already intersects fires on the next pass.
    pub fn observe<F>(
        &self,
        region: Option<RegionId>,
        threshold: f32,
        on_visible: F,
    ) -> VisibilitySubscription
    where
        F: FnOnce(VisibilitySignal) + Send + 'static,
    {
        let Some(region) = region else {
            debug!("observe called without a region; registration ignored");
            return VisibilitySubscription::inert();
        };

        let threshold = normalize_threshold(threshold, self.default_threshold);
        let subscription = Subscription::new();
        let triggered = Arc::new(AtomicBool::new(false));

        lock(&self.inner).observers.insert(
            subscription.id(),
            Observer {
                region: ObservedRegion::new(region, threshold),
                subscription: subscription.clone(),
                triggered: triggered.clone(),
                callback: Some(Box::new(on_visible)),
            },
        );
        trace!(
            region = region.0,
            subscription = subscription.id().0,
            threshold,
            "observing region"
        );

        VisibilitySubscription {
            subscription,
            region: Some(region),
            triggered,
        }
    }

    /// Cancel a subscription and drop its observer right away.
    pub fn unobserve(&self, subscription: &VisibilitySubscription) {
        subscription.unobserve();
        lock(&self.inner).observers.remove(&subscription.id());
    }

    /// Tear down every observer bound to `region` without firing them.
    ///
    /// Returns the number of observers released.
    pub fn release_region(&self, region: RegionId) -> usize {
        let mut inner = lock(&self.inner);
        let before = inner.observers.len();
        inner.observers.retain(|_, obs| {
            if obs.region.region == region {
                obs.subscription.cancel();
                false
            } else {
                true
            }
        });
        let released = before - inner.observers.len();
        if released > 0 {
            debug!(region = region.0, released, "released region observers");
        }
        released
    }

    /// Measure every observed region and fire the ones that became visible.
    ///
    /// Callbacks run after the internal lock is released, so they may
    /// register or cancel other observers. `now_ms` is handed to every
    /// signal so delayed work measures from the pass that fired it.
    /// Returns the number delivered.
    pub fn observe_pass(&self, layout: &dyn RegionLayout, now_ms: f64) -> usize {
        let viewport = layout.viewport();

        let due: Vec<(Subscription, Arc<AtomicBool>, VisibleCallback, VisibilitySignal)> = {
            let mut inner = lock(&self.inner);
            let mut finished = Vec::new();
            let mut due = Vec::new();

            for (id, obs) in inner.observers.iter_mut() {
                if !obs.subscription.is_active() {
                    finished.push(*id);
                    continue;
                }
                let Some(rect) = layout.region_rect(obs.region.region) else {
                    // Detached before it was ever seen.
                    obs.subscription.cancel();
                    finished.push(*id);
                    debug!(region = obs.region.region.0, "region detached; observer released");
                    continue;
                };
                let ratio = rect.intersection_ratio(&viewport);
                if obs.region.qualifies(ratio) && obs.region.trigger() {
                    finished.push(*id);
                    if let Some(callback) = obs.callback.take() {
                        due.push((
                            obs.subscription.clone(),
                            obs.triggered.clone(),
                            callback,
                            VisibilitySignal {
                                region: obs.region.region,
                                ratio,
                                visible: true,
                                observed_at_ms: now_ms,
                            },
                        ));
                    }
                }
            }

            for id in finished {
                inner.observers.remove(&id);
            }
            due
        };

        let mut delivered = 0;
        for (subscription, triggered, callback, signal) in due {
            // An earlier callback in this pass may have torn this one down.
            if subscription.cancel() {
                triggered.store(true, Ordering::Release);
                debug!(region = signal.region.0, ratio = signal.ratio, "region became visible");
                callback(signal);
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.inner)
            .observers
            .values()
            .filter(|obs| obs.subscription.is_active())
            .count()
    }

    /// Whether any live observer is bound to `region`.
    pub fn is_observing(&self, region: RegionId) -> bool {
        lock(&self.inner)
            .observers
            .values()
            .any(|obs| obs.region.region == region && obs.subscription.is_active())
    }

    /// Drop every observer without firing.
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        for obs in inner.observers.values() {
            obs.subscription.cancel();
        }
        inner.observers.clear();
    }
}

static_assertions::assert_impl_all!(ViewportVisibilityDetector: Send, Sync);
static_assertions::assert_impl_all!(VisibilitySubscription: Send, Sync);
