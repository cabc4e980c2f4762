//! vista-scene: scroll-triggered visibility and frame-driven value animation.

pub mod animation;
pub mod geometry;
pub mod reveal;
pub mod stage;
pub mod subscription;
pub mod timer;
pub mod typewriter;
pub mod visibility;

pub use animation::{
    AnimatedCounterSet, AnimationEvent, AnimationScheduler, BarTransition, CounterItem,
    CounterSnapshot, SkillBar, SkillBars, TaskHandle, TaskStatus, TimingFunction, ValueMode,
};
pub use geometry::Rect;
pub use reveal::{RevealController, RevealSubscription, HIDDEN_CLASS, REVEAL_TRANSITION};
pub use stage::{Bound, FrameReport, Stage, StageDefaults, Teardown};
pub use subscription::{Subscription, SubscriptionId};
pub use timer::{TimerHandle, TimerQueue};
pub use typewriter::Typewriter;
pub use visibility::{
    RegionId, RegionLayout, ScrollLayout, ViewportVisibilityDetector, VisibilitySignal,
    VisibilityState, VisibilitySubscription,
};
