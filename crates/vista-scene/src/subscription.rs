//! One-shot subscriptions backed by a shared liveness flag.
//!
//! Every handle the runtime gives out (visibility observers, animation tasks,
//! timers, reveals) wraps a [`Subscription`]. The owner of the callback checks
//! the flag immediately before each delivery, so a callback that is already
//! queued when `cancel()` runs is dropped instead of delivered.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A cancelable, one-shot subscription.
///
/// Clones share the same liveness flag.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    alive: Arc<AtomicBool>,
}

impl Subscription {
    /// Create a live subscription with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: SubscriptionId::new(),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a subscription that is already torn down.
    ///
    /// Returned for registrations that have nothing to observe.
    pub fn inert() -> Self {
        Self {
            id: SubscriptionId::new(),
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns `true` until the subscription is cancelled or has delivered
    /// its final callback.
    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Tear the subscription down.
    ///
    /// Returns `true` only for the call that actually flipped the flag, so
    /// callers can use it as a "claim the single delivery" primitive.
    pub fn cancel(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a mutex, recovering the data if a callback panicked while it was held.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

static_assertions::assert_impl_all!(Subscription: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let sub = Subscription::new();
        assert!(sub.is_active());
        assert!(sub.cancel());
        assert!(!sub.is_active());
        assert!(!sub.cancel());
        assert!(!sub.cancel());
    }

    #[test]
    fn test_clones_share_liveness() {
        let sub = Subscription::new();
        let other = sub.clone();
        assert_eq!(sub.id(), other.id());

        other.cancel();
        assert!(!sub.is_active());
    }

    #[test]
    fn test_inert_subscription() {
        let sub = Subscription::inert();
        assert!(!sub.is_active());
        assert!(!sub.cancel());
    }

    #[test]
    fn test_fresh_identities() {
        let a = Subscription::new();
        let b = Subscription::new();
        assert_ne!(a.id(), b.id());
    }
}
