//! Timer-driven typewriter text.

use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::subscription::{lock, Subscription};
use crate::timer::{TimerHandle, TimerQueue};

/// Default delay between characters.
pub const DEFAULT_TYPEWRITER_INTERVAL_MS: f64 = 100.0;

#[derive(Debug)]
struct TypewriterState {
    chars: Vec<char>,
    shown: usize,
    timer: Option<TimerHandle>,
}

/// Reveals a string one `char` per interval.
///
/// Each character is its own timer; the next one is scheduled when the
/// previous fires. Clones share progress.
#[derive(Debug, Clone)]
pub struct Typewriter {
    state: Arc<Mutex<TypewriterState>>,
    subscription: Subscription,
    interval_ms: f64,
}

impl Typewriter {
    /// Begin typing `text`; the first character appears after one interval.
    pub fn start(timers: &TimerQueue, text: &str, interval_ms: f64) -> Self {
        let interval_ms = if interval_ms.is_finite() {
            interval_ms.max(0.0)
        } else {
            DEFAULT_TYPEWRITER_INTERVAL_MS
        };
        let typewriter = Self {
            state: Arc::new(Mutex::new(TypewriterState {
                chars: text.chars().collect(),
                shown: 0,
                timer: None,
            })),
            subscription: Subscription::new(),
            interval_ms,
        };
        typewriter.schedule_next(timers);
        typewriter
    }

    fn schedule_next(&self, timers: &TimerQueue) {
        let mut state = lock(&self.state);
        if state.shown >= state.chars.len() {
            state.timer = None;
            self.subscription.cancel();
            debug!(chars = state.chars.len(), "typewriter finished");
            return;
        }

        let next = self.clone();
        let queue = timers.clone();
        state.timer = Some(timers.schedule_after(self.interval_ms, move || next.advance(&queue)));
    }

    fn advance(&self, timers: &TimerQueue) {
        if !self.subscription.is_active() {
            return;
        }
        {
            let mut state = lock(&self.state);
            state.shown = (state.shown + 1).min(state.chars.len());
            trace!(shown = state.shown, "typewriter advanced");
        }
        self.schedule_next(timers);
    }

    /// Prefix typed so far.
    pub fn displayed(&self) -> String {
        let state = lock(&self.state);
        state.chars[..state.shown].iter().collect()
    }

    pub fn full_text(&self) -> String {
        lock(&self.state).chars.iter().collect()
    }

    pub fn is_complete(&self) -> bool {
        let state = lock(&self.state);
        state.shown == state.chars.len()
    }

    /// Stop typing; the prefix shown so far stays. Idempotent.
    pub fn teardown(&self) {
        if self.subscription.cancel() {
            if let Some(timer) = lock(&self.state).timer.take() {
                timer.cancel();
            }
            debug!("typewriter torn down");
        }
    }
}

static_assertions::assert_impl_all!(Typewriter: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_one_char_per_interval() {
        let timers = TimerQueue::new();
        timers.set_now(0.0);
        let tw = Typewriter::start(&timers, "HR", 100.0);

        assert_eq!(tw.displayed(), "");
        timers.run_due(50.0);
        assert_eq!(tw.displayed(), "");
        timers.run_due(100.0);
        assert_eq!(tw.displayed(), "H");
        timers.run_due(200.0);
        assert_eq!(tw.displayed(), "HR");
        assert!(tw.is_complete());
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_late_wakeup_types_one_char() {
        let timers = TimerQueue::new();
        timers.set_now(0.0);
        let tw = Typewriter::start(&timers, "abc", 100.0);

        timers.run_due(1000.0);
        assert_eq!(tw.displayed(), "a");
        assert_eq!(timers.next_due(), Some(1100.0));
    }

    #[test]
    fn test_teardown_freezes_prefix() {
        let timers = TimerQueue::new();
        timers.set_now(0.0);
        let tw = Typewriter::start(&timers, "Talent", 100.0);

        timers.run_due(100.0);
        tw.teardown();
        tw.teardown();
        timers.run_due(200.0);
        timers.run_due(300.0);

        assert_eq!(tw.displayed(), "T");
        assert!(!tw.is_complete());
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_empty_text_is_complete() {
        let timers = TimerQueue::new();
        let tw = Typewriter::start(&timers, "", 100.0);
        assert!(tw.is_complete());
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_multibyte_chars() {
        let timers = TimerQueue::new();
        timers.set_now(0.0);
        let tw = Typewriter::start(&timers, "é|", 10.0);
        timers.run_due(10.0);
        assert_eq!(tw.displayed(), "é");
        assert_eq!(tw.full_text(), "é|");
    }
}
