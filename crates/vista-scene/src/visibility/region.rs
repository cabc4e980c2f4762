//! Observed regions and the layout they are measured against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use crate::geometry::Rect;

/// Default intersection threshold for scroll-triggered content.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Opaque handle for a renderable region.
///
/// Every mount receives a fresh handle, so a remounted section never
/// inherits the subscriptions of its previous incarnation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u64);

impl RegionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Visibility state of an observed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityState {
    /// Waiting for the first qualifying intersection.
    #[default]
    Pending,
    /// The one-shot signal has fired.
    Triggered,
}

/// A region plus its observation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedRegion {
    pub region: RegionId,
    pub threshold: f32,
    pub state: VisibilityState,
}

impl ObservedRegion {
    pub fn new(region: RegionId, threshold: f32) -> Self {
        Self {
            region,
            threshold,
            state: VisibilityState::Pending,
        }
    }

    /// Whether `ratio` counts as visible for this region.
    pub fn qualifies(&self, ratio: f32) -> bool {
        ratio > 0.0 && ratio >= self.threshold
    }

    /// Move to `Triggered`. Returns `false` if the region already fired.
    pub fn trigger(&mut self) -> bool {
        if self.state == VisibilityState::Triggered {
            return false;
        }
        self.state = VisibilityState::Triggered;
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.state == VisibilityState::Triggered
    }
}

/// Clamp a caller-supplied threshold into `[0, 1]`.
///
/// Non-finite values fall back to `fallback`.
pub fn normalize_threshold(threshold: f32, fallback: f32) -> f32 {
    if !threshold.is_finite() {
        warn!(threshold, fallback, "non-finite visibility threshold");
        return fallback.clamp(0.0, 1.0);
    }
    threshold.clamp(0.0, 1.0)
}

/// Source of region geometry for an observation pass.
pub trait RegionLayout {
    /// The visible part of the page.
    fn viewport(&self) -> Rect;

    /// Current bounds of a region, or `None` if it is no longer rendered.
    fn region_rect(&self, region: RegionId) -> Option<Rect>;
}

/// A scrolling page: regions laid out in document space and a viewport
/// window that moves vertically over them.
#[derive(Debug, Clone, Default)]
pub struct ScrollLayout {
    width: f32,
    height: f32,
    scroll_y: f32,
    regions: HashMap<RegionId, Rect>,
}

impl ScrollLayout {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
            regions: HashMap::new(),
        }
    }

    /// Mount a region at `rect` (document coordinates).
    pub fn mount(&mut self, rect: Rect) -> RegionId {
        let id = RegionId::new();
        self.regions.insert(id, rect);
        id
    }

    /// Remove a region from the page. Returns `false` if it was not mounted.
    pub fn unmount(&mut self, region: RegionId) -> bool {
        self.regions.remove(&region).is_some()
    }

    pub fn is_mounted(&self, region: RegionId) -> bool {
        self.regions.contains_key(&region)
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn viewport_width(&self) -> f32 {
        self.width
    }

    pub fn viewport_height(&self) -> f32 {
        self.height
    }

    /// Total height covered by mounted regions.
    pub fn content_height(&self) -> f32 {
        self.regions
            .values()
            .map(|r| r.bottom())
            .fold(0.0, f32::max)
    }

    pub fn scroll_to(&mut self, y: f32) {
        let max_scroll = (self.content_height() - self.height).max(0.0);
        self.scroll_y = y.clamp(0.0, max_scroll);
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll_to(self.scroll_y + dy);
    }
}

impl RegionLayout for ScrollLayout {
    fn viewport(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.width, self.height)
    }

    fn region_rect(&self, region: RegionId) -> Option<Rect> {
        self.regions.get(&region).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_one_shot() {
        let mut region = ObservedRegion::new(RegionId::new(), 0.1);
        assert_eq!(region.state, VisibilityState::Pending);
        assert!(region.trigger());
        assert!(!region.trigger());
        assert!(region.is_triggered());
    }

    #[test]
    fn test_qualifies() {
        let region = ObservedRegion::new(RegionId::new(), 0.25);
        assert!(!region.qualifies(0.0));
        assert!(!region.qualifies(0.2));
        assert!(region.qualifies(0.25));
        assert!(region.qualifies(1.0));

        // A zero threshold still requires some overlap
        let any = ObservedRegion::new(RegionId::new(), 0.0);
        assert!(!any.qualifies(0.0));
        assert!(any.qualifies(0.01));
    }

    #[test]
    fn test_normalize_threshold() {
        assert_eq!(normalize_threshold(0.5, 0.1), 0.5);
        assert_eq!(normalize_threshold(-1.0, 0.1), 0.0);
        assert_eq!(normalize_threshold(3.0, 0.1), 1.0);
        assert_eq!(normalize_threshold(f32::NAN, 0.1), 0.1);
    }

    #[test]
    fn test_scroll_layout_viewport() {
        let mut layout = ScrollLayout::new(100.0, 200.0);
        let section = layout.mount(Rect::new(0.0, 0.0, 100.0, 1000.0));

        layout.scroll_by(300.0);
        assert_eq!(layout.viewport(), Rect::new(0.0, 300.0, 100.0, 200.0));

        // Scrolling is clamped to the content
        layout.scroll_to(5000.0);
        assert_eq!(layout.scroll_y(), 800.0);
        layout.scroll_to(-10.0);
        assert_eq!(layout.scroll_y(), 0.0);

        assert!(layout.unmount(section));
        assert!(layout.region_rect(section).is_none());
        assert!(!layout.unmount(section));
    }
}
