//! The host-facing entry point.
//!
//! A [`Stage`] owns one visibility detector, one animation scheduler and one
//! timer queue, and wires them together for the common scroll-triggered
//! patterns: counters that start when their section appears, reveal
//! wrappers, bar fills and the typewriter headline.
//!
//! # Frame order
//!
//! ```text
//! Stage::frame(now, layout)
//!   1. observation pass   visibility callbacks may start tasks or timers
//!   2. due timers         delayed reveals, typewriter characters
//!   3. scheduler tick     tasks started in 1. tick here with origin = now
//!   4. event drain        lifecycle events are counted into the report
//! ```
//!
//! Components bound to a region are registered under it, so
//! [`Stage::unmount`] stops their delayed and running work as well as any
//! observer still waiting on the region.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};
use vista_config::VistaConfig;

use crate::animation::{
    AnimatedCounterSet, AnimationEvent, AnimationScheduler, BarTransition, CounterItem, SkillBar,
    SkillBars, TaskHandle, TimingFunction, ValueMode, DEFAULT_COUNTER_DURATION_MS,
};
use crate::reveal::{RevealController, RevealSubscription, DEFAULT_ANIMATION};
use crate::subscription::lock;
use crate::timer::TimerQueue;
use crate::typewriter::{Typewriter, DEFAULT_TYPEWRITER_INTERVAL_MS};
use crate::visibility::{
    RegionId, RegionLayout, ViewportVisibilityDetector, VisibilitySignal,
    VisibilitySubscription, DEFAULT_THRESHOLD,
};

/// Defaults applied when a caller does not pass its own values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefaults {
    pub threshold: f32,
    pub counter_duration_ms: f64,
    pub counter_mode: ValueMode,
    pub reveal_delay_ms: f64,
    pub reveal_animation: String,
    pub bar_transition: BarTransition,
    pub typewriter_interval_ms: f64,
}

impl Default for StageDefaults {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            counter_duration_ms: DEFAULT_COUNTER_DURATION_MS,
            counter_mode: ValueMode::Discrete,
            reveal_delay_ms: 0.0,
            reveal_animation: DEFAULT_ANIMATION.to_string(),
            bar_transition: BarTransition::default(),
            typewriter_interval_ms: DEFAULT_TYPEWRITER_INTERVAL_MS,
        }
    }
}

impl From<&VistaConfig> for StageDefaults {
    fn from(config: &VistaConfig) -> Self {
        Self {
            threshold: config.visibility.threshold,
            counter_duration_ms: config.counters.duration_ms,
            counter_mode: ValueMode::from_discrete(config.counters.discrete),
            reveal_delay_ms: config.reveal.delay_ms,
            reveal_animation: config.reveal.animation.clone(),
            bar_transition: BarTransition {
                duration_ms: config.bars.transition_ms,
                timing: TimingFunction::from_config(&config.bars.timing),
            },
            typewriter_interval_ms: config.typewriter.interval_ms,
        }
    }
}

/// Components that hold in-flight work and can be stopped.
pub trait Teardown {
    fn teardown(&self);
}

impl Teardown for AnimatedCounterSet {
    fn teardown(&self) {
        AnimatedCounterSet::teardown(self);
    }
}

impl Teardown for SkillBars {
    // Nothing in flight; the renderer owns the width transition.
    fn teardown(&self) {}
}

impl Teardown for Typewriter {
    fn teardown(&self) {
        Typewriter::teardown(self);
    }
}

impl Teardown for RevealSubscription {
    fn teardown(&self) {
        RevealSubscription::teardown(self);
    }
}

/// A component bound to its region's one-shot signal.
#[derive(Debug, Clone)]
pub struct Bound<T> {
    pub component: T,
    pub visibility: VisibilitySubscription,
}

impl<T: Teardown> Bound<T> {
    /// Stop observing and stop the component. Idempotent.
    pub fn teardown(&self) {
        self.visibility.unobserve();
        self.component.teardown();
    }
}

impl<T: Teardown> Teardown for Bound<T> {
    fn teardown(&self) {
        Bound::teardown(self);
    }
}

impl<T> std::ops::Deref for Bound<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.component
    }
}

/// What one [`Stage::frame`] did.
///
/// Lifecycle counts come from the events drained after the tick. A burst
/// larger than the scheduler's event capacity only counts the newest events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Visibility callbacks delivered.
    pub fired: usize,
    /// Timer callbacks run.
    pub timers_fired: usize,
    /// Task updates emitted.
    pub tasks_ticked: usize,
    /// Tasks that took their first tick.
    pub started: usize,
    /// Tasks that reached their end value.
    pub completed: usize,
    /// Tasks torn down before completing.
    pub cancelled: usize,
}

type RegionComponent = Box<dyn Teardown + Send + Sync>;

/// Components registered per region, torn down on unmount.
#[derive(Clone, Default)]
struct RegionComponents {
    inner: Arc<Mutex<HashMap<RegionId, Vec<RegionComponent>>>>,
}

impl RegionComponents {
    fn register(&self, region: Option<RegionId>, component: RegionComponent) {
        if let Some(region) = region {
            lock(&self.inner).entry(region).or_default().push(component);
        }
    }

    fn take(&self, region: RegionId) -> Vec<RegionComponent> {
        lock(&self.inner).remove(&region).unwrap_or_default()
    }

    fn len(&self) -> usize {
        lock(&self.inner).values().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for RegionComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("RegionComponents")
            .field("regions", &inner.len())
            .field("components", &inner.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

/// Detector, scheduler and timers driven from one host frame callback.
#[derive(Debug, Clone)]
pub struct Stage {
    detector: ViewportVisibilityDetector,
    scheduler: AnimationScheduler,
    timers: TimerQueue,
    reveals: RevealController,
    components: RegionComponents,
    defaults: StageDefaults,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::with_defaults(StageDefaults::default())
    }

    pub fn from_config(config: &VistaConfig) -> Self {
        Self::with_defaults(StageDefaults::from(config))
    }

    pub fn with_defaults(defaults: StageDefaults) -> Self {
        let detector = ViewportVisibilityDetector::with_default_threshold(defaults.threshold);
        let timers = TimerQueue::new();
        let reveals = RevealController::new(detector.clone(), timers.clone());
        Self {
            detector,
            scheduler: AnimationScheduler::new(),
            timers,
            reveals,
            components: RegionComponents::default(),
            defaults,
        }
    }

    pub fn defaults(&self) -> &StageDefaults {
        &self.defaults
    }

    pub fn detector(&self) -> &ViewportVisibilityDetector {
        &self.detector
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// One-shot visibility signal for `region`.
    pub fn observe_visibility<F>(
        &self,
        region: Option<RegionId>,
        threshold: f32,
        on_visible: F,
    ) -> VisibilitySubscription
    where
        F: FnOnce(VisibilitySignal) + Send + 'static,
    {
        self.detector.observe(region, threshold, on_visible)
    }

    /// Frame-driven `start → end` run.
    pub fn animate_value<U, C>(
        &self,
        start_value: f64,
        end_value: f64,
        duration_ms: f64,
        mode: ValueMode,
        on_tick: U,
        on_done: C,
    ) -> TaskHandle
    where
        U: FnMut(f64) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.scheduler
            .start(start_value, end_value, duration_ms, mode, on_tick, on_done)
    }

    /// Start a counter group right away.
    pub fn animate_group(&self, items: Vec<CounterItem>, duration_ms: f64) -> AnimatedCounterSet {
        let set = AnimatedCounterSet::new(items, duration_ms).with_mode(self.defaults.counter_mode);
        set.trigger(&self.scheduler);
        set
    }

    /// Start a counter group on `region`'s one-shot signal.
    pub fn animate_group_once_visible(
        &self,
        region: Option<RegionId>,
        items: Vec<CounterItem>,
        threshold: f32,
        duration_ms: f64,
    ) -> Bound<AnimatedCounterSet> {
        let set = AnimatedCounterSet::new(items, duration_ms).with_mode(self.defaults.counter_mode);
        let trigger = set.clone();
        let scheduler = self.scheduler.clone();
        let visibility = self.detector.observe(region, threshold, move |signal| {
            trace!(region = signal.region.0, "counter group triggered");
            trigger.trigger(&scheduler);
        });
        let bound = Bound {
            component: set,
            visibility,
        };
        self.components.register(region, Box::new(bound.clone()));
        bound
    }

    /// Reveal wrapper for `region`.
    pub fn reveal_once_visible(
        &self,
        region: Option<RegionId>,
        animation: impl Into<String>,
        threshold: f32,
        delay_ms: f64,
    ) -> RevealSubscription {
        let reveal = self.reveals.attach(region, animation, threshold, delay_ms);
        self.components.register(region, Box::new(reveal.clone()));
        reveal
    }

    /// Reveal wrapper using the configured animation and delay.
    pub fn reveal_with_defaults(&self, region: Option<RegionId>) -> RevealSubscription {
        self.reveal_once_visible(
            region,
            self.defaults.reveal_animation.clone(),
            self.defaults.threshold,
            self.defaults.reveal_delay_ms,
        )
    }

    /// Fill `bars` on `region`'s one-shot signal.
    pub fn bars_once_visible(
        &self,
        region: Option<RegionId>,
        bars: Vec<SkillBar>,
        threshold: f32,
    ) -> Bound<SkillBars> {
        let bars = SkillBars::new(bars, self.defaults.bar_transition);
        let fill = bars.clone();
        let visibility = self.detector.observe(region, threshold, move |_| {
            fill.fill();
        });
        let bound = Bound {
            component: bars,
            visibility,
        };
        self.components.register(region, Box::new(bound.clone()));
        bound
    }

    /// Type `text` at the configured interval, starting from the timer clock.
    pub fn typewriter(&self, text: &str) -> Typewriter {
        Typewriter::start(&self.timers, text, self.defaults.typewriter_interval_ms)
    }

    /// Forget an unmounted region.
    ///
    /// Components created for it stop: pending reveals never flip and
    /// running counters freeze at their current values. Returns the number
    /// of observers that were still waiting on the region.
    pub fn unmount(&self, region: RegionId) -> usize {
        let released = self.detector.release_region(region);
        let components = self.components.take(region);
        for component in &components {
            component.teardown();
        }
        debug!(region = region.0, released, components = components.len(), "region unmounted");
        released
    }

    /// Components still registered against a mounted region.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Run one display frame at `now_ms`.
    pub fn frame(&self, now_ms: f64, layout: &dyn RegionLayout) -> FrameReport {
        self.timers.set_now(now_ms);
        let fired = self.detector.observe_pass(layout, now_ms);
        let timers_fired = self.timers.run_due(now_ms);
        let tasks_ticked = self.scheduler.tick(now_ms);

        let mut report = FrameReport {
            fired,
            timers_fired,
            tasks_ticked,
            ..FrameReport::default()
        };
        for event in self.scheduler.drain_events() {
            match event {
                AnimationEvent::Started { .. } => report.started += 1,
                AnimationEvent::Completed { .. } => report.completed += 1,
                AnimationEvent::Cancelled { .. } => report.cancelled += 1,
            }
        }
        if fired > 0 || timers_fired > 0 || report.completed > 0 {
            debug!(now_ms, ?report, "frame");
        }
        report
    }

    /// Wake the timer queue without running a frame.
    pub fn advance_timers(&self, now_ms: f64) -> usize {
        self.timers.run_due(now_ms)
    }

    /// Whether anything is still waiting on a frame or a timer.
    pub fn needs_frame(&self) -> bool {
        self.scheduler.has_active_tasks()
            || self.timers.pending_count() > 0
            || self.detector.observer_count() > 0
    }

    /// Earliest timer wakeup, for hosts that sleep between frames.
    pub fn next_timer_due(&self) -> Option<f64> {
        self.timers.next_due()
    }
}

static_assertions::assert_impl_all!(Stage: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::DEFAULT_EVENT_CAPACITY;
    use crate::geometry::Rect;
    use crate::visibility::ScrollLayout;

    #[test]
    fn test_defaults_from_config() {
        let mut config = VistaConfig::default();
        config.counters.discrete = false;
        config.bars.timing = "linear".to_string();
        config.visibility.threshold = 0.3;

        let defaults = StageDefaults::from(&config);
        assert_eq!(defaults.counter_mode, ValueMode::Continuous);
        assert_eq!(defaults.bar_transition.timing, TimingFunction::Linear);
        assert_eq!(defaults.threshold, 0.3);

        let stage = Stage::from_config(&config);
        assert_eq!(stage.detector().default_threshold(), 0.3);
    }

    #[test]
    fn test_counter_group_starts_on_visibility() {
        let stage = Stage::new();
        let mut layout = ScrollLayout::new(800.0, 600.0);
        let section = layout.mount(Rect::new(0.0, 1200.0, 800.0, 400.0));
        let counters = stage.animate_group_once_visible(
            Some(section),
            vec![CounterItem::new("a", 100.0), CounterItem::new("b", 5.0)],
            0.1,
            2000.0,
        );

        stage.frame(0.0, &layout);
        assert!(!counters.is_started());

        layout.scroll_to(1000.0);
        let report = stage.frame(16.0, &layout);
        assert_eq!(report.fired, 1);
        assert_eq!(report.tasks_ticked, 2);
        assert_eq!(report.started, 2);
        assert!(counters.is_started());

        stage.frame(1016.0, &layout);
        assert_eq!(counters.values(), vec![50.0, 2.0]);

        let report = stage.frame(2016.0, &layout);
        assert_eq!(report.completed, 2);
        assert!(counters.is_complete());
        assert_eq!(counters.values(), vec![100.0, 5.0]);
        assert!(!stage.needs_frame());
    }

    #[test]
    fn test_reveal_with_zero_delay_flips_in_same_frame() {
        let stage = Stage::new();
        let mut layout = ScrollLayout::new(800.0, 600.0);
        let region = layout.mount(Rect::new(0.0, 100.0, 800.0, 200.0));
        let reveal = stage.reveal_with_defaults(Some(region));

        let report = stage.frame(0.0, &layout);
        assert_eq!(report.fired, 1);
        assert_eq!(report.timers_fired, 1);
        assert!(reveal.is_revealed());
        assert_eq!(reveal.class_name(), "animate-fade-in");
    }

    #[test]
    fn test_bound_teardown_before_signal() {
        let stage = Stage::new();
        let mut layout = ScrollLayout::new(800.0, 600.0);
        let region = layout.mount(Rect::new(0.0, 0.0, 800.0, 600.0));
        let bars = stage.bars_once_visible(Some(region), vec![SkillBar::new("Compliance", 85.0)], 0.1);

        bars.teardown();
        stage.frame(0.0, &layout);
        assert!(!bars.is_filled());
        assert_eq!(bars.css_width(0).as_deref(), Some("0%"));
    }

    #[test]
    fn test_unmount_releases_observers() {
        let stage = Stage::new();
        let mut layout = ScrollLayout::new(800.0, 600.0);
        let region = layout.mount(Rect::new(0.0, 2000.0, 800.0, 100.0));
        let sub = stage.observe_visibility(Some(region), 0.1, |_| panic!("must not fire"));

        assert_eq!(stage.unmount(region), 1);
        assert!(!sub.is_active());
        layout.scroll_to(2000.0);
        assert_eq!(stage.frame(0.0, &layout).fired, 0);
    }

    #[test]
    fn test_unmount_stops_fired_components() {
        let stage = Stage::new();
        let mut layout = ScrollLayout::new(800.0, 600.0);
        let card = layout.mount(Rect::new(0.0, 0.0, 800.0, 300.0));
        let stats = layout.mount(Rect::new(0.0, 300.0, 800.0, 300.0));
        let reveal = stage.reveal_once_visible(Some(card), "animate-slide-up", 0.1, 300.0);
        let counters = stage.animate_group_once_visible(
            Some(stats),
            vec![CounterItem::new("a", 100.0)],
            0.1,
            2000.0,
        );
        assert_eq!(stage.component_count(), 2);

        stage.frame(0.0, &layout);
        stage.frame(1000.0, &layout);
        assert!(reveal.is_revealed());
        assert_eq!(counters.values(), vec![50.0]);

        // Both regions already fired, so no observers remain
        assert_eq!(stage.unmount(stats), 0);
        assert_eq!(stage.component_count(), 1);
        stage.frame(2000.0, &layout);
        assert_eq!(counters.values(), vec![50.0]);
        assert!(!counters.is_complete());
        assert!(!stage.scheduler().has_active_tasks());
    }

    #[test]
    fn test_unmount_during_reveal_delay() {
        let stage = Stage::new();
        let mut layout = ScrollLayout::new(800.0, 600.0);
        let card = layout.mount(Rect::new(0.0, 0.0, 800.0, 300.0));
        let reveal = stage.reveal_once_visible(Some(card), "animate-slide-up", 0.1, 300.0);

        stage.frame(0.0, &layout);
        assert!(reveal.is_pending());

        assert_eq!(stage.unmount(card), 0);
        layout.unmount(card);
        let report = stage.frame(1000.0, &layout);
        assert_eq!(report.timers_fired, 0);
        assert!(!reveal.is_revealed());
        assert!(!reveal.is_active());
        assert!(!stage.needs_frame());
    }

    #[test]
    fn test_frame_drains_lifecycle_events() {
        let stage = Stage::new();
        let layout = ScrollLayout::new(800.0, 600.0);
        let mut now = 0.0;
        for _ in 0..1000 {
            stage.animate_value(0.0, 1.0, 0.0, ValueMode::Discrete, |_| {}, || {});
            let report = stage.frame(now, &layout);
            assert_eq!((report.started, report.completed), (1, 1));
            assert_eq!(stage.scheduler().pending_event_count(), 0);
            now += 16.0;
        }
        assert_eq!(stage.scheduler().dropped_event_count(), 0);

        // One tick emits 2000 events; only the newest fit in the queue.
        for _ in 0..1000 {
            stage.animate_value(0.0, 1.0, 0.0, ValueMode::Discrete, |_| {}, || {});
        }
        let report = stage.frame(now, &layout);
        assert_eq!(report.started + report.completed, DEFAULT_EVENT_CAPACITY);
        assert_eq!(
            stage.scheduler().dropped_event_count(),
            (2000 - DEFAULT_EVENT_CAPACITY) as u64
        );
        assert_eq!(stage.scheduler().pending_event_count(), 0);
        assert!(!stage.needs_frame());
    }

    #[test]
    fn test_advance_timers_without_frame() {
        let stage = Stage::new();
        stage.timers().set_now(0.0);
        let tw = stage.typewriter("Hi");
        assert_eq!(stage.next_timer_due(), Some(100.0));

        assert_eq!(stage.advance_timers(100.0), 1);
        assert_eq!(stage.advance_timers(200.0), 1);
        assert_eq!(tw.displayed(), "Hi");
        assert!(tw.is_complete());
    }
}
