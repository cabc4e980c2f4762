//! Linear interpolation and progress helpers.
//!
//! Progress is always derived from absolute timestamps, never from summed
//! frame deltas, so uneven frame pacing cannot skew the final value.

use super::types::ValueMode;

/// Trait for types that can be interpolated between two values.
pub trait Interpolate: Sized {
    /// Interpolate between self and another value.
    ///
    /// When t = 0.0, returns self.
    /// When t = 1.0, returns to.
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    #[inline]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for f32 {
    #[inline]
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t as f32
    }
}

/// Normalized elapsed fraction, clamped to `[0, 1]`.
///
/// Non-positive or non-finite durations count as already finished.
pub fn progress(origin_ms: f64, now_ms: f64, duration_ms: f64) -> f64 {
    if !duration_ms.is_finite() || duration_ms <= 0.0 {
        return 1.0;
    }
    let t = (now_ms - origin_ms) / duration_ms;
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Apply a [`ValueMode`] to a raw interpolated value.
///
/// Discrete values are truncated toward `start` (floor for ascending runs,
/// ceil for descending ones) and then kept inside the `[start, end]` span.
pub fn present(raw: f64, start: f64, end: f64, mode: ValueMode) -> f64 {
    let shaped = match mode {
        ValueMode::Continuous => raw,
        ValueMode::Discrete if end >= start => raw.floor(),
        ValueMode::Discrete => raw.ceil(),
    };
    if start.is_nan() || end.is_nan() {
        return shaped;
    }
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    shaped.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate() {
        assert_eq!(0.0_f64.interpolate(&100.0, 0.0), 0.0);
        assert_eq!(0.0_f64.interpolate(&100.0, 0.25), 25.0);
        assert_eq!(0.0_f64.interpolate(&100.0, 1.0), 100.0);
        assert_eq!(10.0_f32.interpolate(&0.0, 0.5), 5.0);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(100.0, 100.0, 2000.0), 0.0);
        assert_eq!(progress(100.0, 1100.0, 2000.0), 0.5);
        assert_eq!(progress(100.0, 9000.0, 2000.0), 1.0);
        // Clock jitter before the origin clamps to zero
        assert_eq!(progress(100.0, 50.0, 2000.0), 0.0);
    }

    #[test]
    fn test_degenerate_duration() {
        assert_eq!(progress(0.0, 0.0, 0.0), 1.0);
        assert_eq!(progress(0.0, 0.0, -5.0), 1.0);
        assert_eq!(progress(0.0, 0.0, f64::NAN), 1.0);
        assert_eq!(progress(0.0, 0.0, f64::INFINITY), 1.0);
    }

    #[test]
    fn test_present_discrete() {
        assert_eq!(present(49.9, 0.0, 100.0, ValueMode::Discrete), 49.0);
        assert_eq!(present(4.99, 10.0, 0.0, ValueMode::Discrete), 5.0);
        assert_eq!(present(49.9, 0.0, 100.0, ValueMode::Continuous), 49.9);
    }

    #[test]
    fn test_present_never_overshoots() {
        // Truncating toward the start keeps fractional ends in range
        assert_eq!(present(0.7, 10.0, 0.5, ValueMode::Discrete), 1.0);
        assert_eq!(present(0.2, 0.5, 10.0, ValueMode::Discrete), 0.5);
    }
}
