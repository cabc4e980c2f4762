//! Viewport visibility: regions, layouts and the one-shot detector.

pub mod detector;
pub mod region;

pub use detector::{ViewportVisibilityDetector, VisibilitySignal, VisibilitySubscription};
pub use region::{
    normalize_threshold, ObservedRegion, RegionId, RegionLayout, ScrollLayout, VisibilityState,
    DEFAULT_THRESHOLD,
};
