//! Declarative percentage bars.
//!
//! When only the final width of a bar matters, no per-frame task is run:
//! the visibility signal flips the bars to their target percentages and the
//! renderer's own width transition animates the change.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

/// Timing function name handed to the renderer's transition.
///
/// These are descriptive only; no curve is evaluated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimingFunction {
    Linear,
    Ease,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
}

impl TimingFunction {
    pub fn css_name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Ease => "ease",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }

    pub fn from_css_name(name: &str) -> Option<Self> {
        match name.trim() {
            "linear" => Some(Self::Linear),
            "ease" => Some(Self::Ease),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }

    /// Parse a configured name, falling back to `ease-out`.
    pub fn from_config(name: &str) -> Self {
        Self::from_css_name(name).unwrap_or_else(|| {
            warn!(timing = name, "unknown timing function; using ease-out");
            Self::default()
        })
    }
}

/// Width transition the renderer applies to every bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarTransition {
    pub duration_ms: f64,
    pub timing: TimingFunction,
}

impl Default for BarTransition {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            timing: TimingFunction::EaseOut,
        }
    }
}

impl BarTransition {
    /// CSS shorthand, e.g. `width 1000ms ease-out`.
    pub fn css(&self) -> String {
        format!(
            "width {}ms {}",
            self.duration_ms.max(0.0).round(),
            self.timing.css_name()
        )
    }
}

/// A named percentage bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillBar {
    pub name: String,
    pub percentage: f64,
}

impl SkillBar {
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }

    /// Target width, clamped to `[0, 100]`.
    pub fn target(&self) -> f64 {
        if self.percentage.is_nan() {
            0.0
        } else {
            self.percentage.clamp(0.0, 100.0)
        }
    }
}

/// A list of bars sharing one one-shot fill trigger.
///
/// Clones share the fill flag.
#[derive(Debug, Clone)]
pub struct SkillBars {
    bars: Arc<[SkillBar]>,
    transition: BarTransition,
    filled: Arc<AtomicBool>,
}

impl SkillBars {
    pub fn new(bars: Vec<SkillBar>, transition: BarTransition) -> Self {
        Self {
            bars: bars.into(),
            transition,
            filled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set every bar to its target. Returns `false` if already filled.
    pub fn fill(&self) -> bool {
        let first = !self.filled.swap(true, Ordering::AcqRel);
        if first {
            debug!(bars = self.bars.len(), "bars filled");
        }
        first
    }

    pub fn is_filled(&self) -> bool {
        self.filled.load(Ordering::Acquire)
    }

    /// Width to render for bar `index`: 0 until filled, then its target.
    pub fn width_percent(&self, index: usize) -> Option<f64> {
        let bar = self.bars.get(index)?;
        Some(if self.is_filled() { bar.target() } else { 0.0 })
    }

    pub fn widths(&self) -> Vec<f64> {
        let filled = self.is_filled();
        self.bars
            .iter()
            .map(|bar| if filled { bar.target() } else { 0.0 })
            .collect()
    }

    /// Inline width style for bar `index`, e.g. `95%`.
    pub fn css_width(&self, index: usize) -> Option<String> {
        self.width_percent(index).map(|w| format!("{w}%"))
    }

    pub fn transition(&self) -> BarTransition {
        self.transition
    }

    pub fn bars(&self) -> &[SkillBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
